//! 仿真时间类型
//!
//! 定义仿真时间及其单位转换。仿真时间是显式传递的单调计数器，与墙钟无关。

use serde::{Deserialize, Serialize};

/// 仿真时间（纳秒）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    /// 永不到期的超时（例如 HYBRID 模式下的依赖规则）。
    pub const INFINITE: SimTime = SimTime(u64::MAX);

    pub fn from_micros(us: u64) -> SimTime {
        SimTime(us.saturating_mul(1_000))
    }
    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms.saturating_mul(1_000_000))
    }
    pub fn from_secs(s: u64) -> SimTime {
        SimTime(s.saturating_mul(1_000_000_000))
    }

    pub fn as_micros_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    pub fn is_infinite(self) -> bool {
        self == Self::INFINITE
    }

    pub fn saturating_add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(rhs.0))
    }

    /// 向下取整到 `unit` 的整数倍。
    pub fn floor_to(self, unit: SimTime) -> SimTime {
        if unit.0 == 0 {
            return self;
        }
        SimTime(self.0 - self.0 % unit.0)
    }

    /// 四舍五入到整秒（.5 向上）。
    pub fn round_to_secs(self) -> SimTime {
        let sec = 1_000_000_000u64;
        SimTime::from_secs(self.0.saturating_add(sec / 2) / sec)
    }
}
