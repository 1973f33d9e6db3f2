//! 拓扑
//!
//! 不可变的邻接表，交换机编号 `0..N`；附带若干内置示例拓扑。

mod builtin;

pub use builtin::Builtin;

use crate::net::SwitchId;
use crate::sim::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    adj: Vec<Vec<SwitchId>>,
}

impl Topology {
    /// 由邻接表构造；任何越界邻居都会被拒绝。
    pub fn from_adjacency(adj: Vec<Vec<usize>>) -> Result<Self, ConfigError> {
        let n = adj.len();
        if n == 0 {
            return Err(ConfigError::InvalidTopology("topology has no switches".into()));
        }
        let adj = adj
            .into_iter()
            .enumerate()
            .map(|(from, nbrs)| {
                nbrs.into_iter()
                    .map(|to| {
                        if to < n {
                            Ok(SwitchId(to))
                        } else {
                            Err(ConfigError::InvalidTopology(format!(
                                "switch {from} lists neighbor {to}, but only {n} switches exist"
                            )))
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { adj })
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    pub fn neighbors(&self, id: SwitchId) -> &[SwitchId] {
        self.adj.get(id.0).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn switches(&self) -> impl Iterator<Item = SwitchId> + use<> {
        (0..self.adj.len()).map(SwitchId)
    }
}
