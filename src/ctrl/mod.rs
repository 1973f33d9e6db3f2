//! 控制器模块
//!
//! 控制器在 table miss 时按策略生成安装指令，在表项移除时通知预测器并做依赖清理。

mod controller;
mod error;
mod mode;
mod ruleset;

pub use controller::Controller;
pub use error::ControllerError;
pub use mode::PacketInMode;
pub use ruleset::{Rule, RuleDependency, Ruleset, RulesetSpec};
