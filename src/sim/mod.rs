//! 仿真核心模块
//!
//! 此模块包含逐包推进的仿真循环、仿真时间、指标输出与场景配置。

// 子模块声明
mod error;
mod metrics;
mod scenario;
mod simulator;
mod time;

// 重新导出公共接口
pub use error::{ConfigError, SimError};
pub use metrics::{Checkpoint, MetricsSink, NullSink, Recorder, Stats};
pub use scenario::{
    FlowSpec, Overrides, Run, SCHEMA_VERSION, ScenarioDefaults, ScenarioMeta, ScenarioSpec,
    TopologySpec,
};
pub use simulator::{PacketOutcome, SimConfig, Simulator};
pub use time::SimTime;
