//! 内置示例拓扑

use serde::{Deserialize, Serialize};

use super::Topology;
use crate::net::SwitchId;
use crate::sim::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    /// 0-1-2 链
    Single,
    /// 两个区域经桥连接，10 个节点
    Bridge,
    FiveStars,
    SimpleBitree,
    SimpleClos,
}

impl Builtin {
    pub fn adjacency(self) -> Vec<Vec<usize>> {
        let rows: &[&[usize]] = match self {
            Builtin::Single => &[&[1], &[0, 2], &[1]],
            Builtin::Bridge => &[
                &[1, 2, 3],
                &[0, 2, 4, 5],
                &[0, 1, 3, 4],
                &[0, 2, 4],
                &[1, 2, 3, 8],
                &[1, 6, 7, 8],
                &[5, 7, 9],
                &[5, 6, 8, 9],
                &[4, 5, 7, 9],
                &[6, 7, 8],
            ],
            Builtin::FiveStars => &[
                &[1, 2, 3, 4, 5],
                &[0, 2, 5],
                &[0, 1, 3],
                &[0, 2, 4],
                &[0, 3, 5],
                &[0, 4, 1],
            ],
            Builtin::SimpleBitree => &[&[1, 2], &[0, 3, 4], &[0, 5, 6], &[1], &[1], &[2], &[2]],
            Builtin::SimpleClos => &[
                &[1, 2],
                &[0, 3, 4, 5, 6],
                &[0, 3, 4, 5, 6],
                &[1, 2],
                &[1, 2],
                &[1, 2],
                &[1, 2],
            ],
        };
        rows.iter().map(|r| r.to_vec()).collect()
    }

    /// 默认的软件交换机集合
    pub fn software_switches(self) -> Vec<SwitchId> {
        let labels: &[usize] = match self {
            Builtin::Bridge => &[2, 7],
            Builtin::Single
            | Builtin::FiveStars
            | Builtin::SimpleBitree
            | Builtin::SimpleClos => &[],
        };
        labels.iter().copied().map(SwitchId).collect()
    }

    pub fn build(self) -> Result<Topology, ConfigError> {
        Topology::from_adjacency(self.adjacency())
    }
}
