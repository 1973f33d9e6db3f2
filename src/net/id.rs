//! 标识符类型
//!
//! 定义交换机标识符以及转发目标（含 CONTROLLER / LOCAL 两个哨兵）。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 交换机标识符，取值范围 `0..N`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SwitchId(pub usize);

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// 转发目标：某台交换机，或两个哨兵之一。哨兵永远不会被当作流表下标。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hop {
    Switch(SwitchId),
    /// 上送控制器（packet-in）
    Controller,
    /// 本地交付
    Local,
}

impl Hop {
    pub fn switch(self) -> Option<SwitchId> {
        match self {
            Hop::Switch(id) => Some(id),
            Hop::Controller | Hop::Local => None,
        }
    }
}

impl From<SwitchId> for Hop {
    fn from(id: SwitchId) -> Self {
        Hop::Switch(id)
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hop::Switch(id) => write!(f, "{id}"),
            Hop::Controller => f.write_str("CTRL"),
            Hop::Local => f.write_str("LOCAL"),
        }
    }
}
