//! 超时预测器
//!
//! 预测器把 (规则, 时间, 交换机) 映射为超时，并从表项生命周期通知中学习。
//! 控制器与事件循环只通过 [`Predictor`] 与之交互；
//! 各自喂给它哪些通知由 [`PredictorKind`] 决定。

mod fixed;
mod heuristic;

pub use fixed::FixedPredictor;
pub use heuristic::{HeuristicParams, HeuristicPredictor};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ctrl::Rule;
use crate::net::{Entry, SwitchId};
use crate::sim::{ConfigError, SimTime};

/// 预测器消费哪些反馈
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictorKind {
    /// 固定超时，不接收反馈
    Fixed,
    /// 每次预测前收到 packet-in；另收超时移除与周期性的流表大小采样
    Heuristic,
    /// 预测前不通知；接收所有移除（超时与溢出），并周期性训练
    ValueFunction,
}

/// 生命周期通知
#[derive(Debug, Clone, Copy)]
pub enum PredictorEvent<'a> {
    PacketIn {
        switch: SwitchId,
        at: SimTime,
        rule: Rule,
    },
    FlowRemoved {
        switch: SwitchId,
        at: SimTime,
        entry: &'a Entry,
    },
    TableSizeSample {
        switch: SwitchId,
        at: SimTime,
        size: usize,
    },
}

pub trait Predictor: Send {
    fn kind(&self) -> PredictorKind;

    fn notify(&mut self, event: PredictorEvent<'_>);

    fn predict(&mut self, rule: &Rule, now: SimTime, switch: SwitchId) -> SimTime;

    /// 周期性重算内部上限（启发式）
    fn refresh(&mut self) {}

    /// 一次周期训练（价值函数类）
    fn train_step(&mut self) {}
}

/// 配置中的预测器选择。JSON 与命令行共用 `FromStr` 的名字解析。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PredictorChoice {
    /// 总是默认超时
    Fixed,
    /// 按流表占用调整的启发式
    Simple,
}

impl PredictorChoice {
    pub fn build(self, default_timeout: SimTime, params: HeuristicParams) -> Box<dyn Predictor> {
        match self {
            PredictorChoice::Fixed => Box::new(FixedPredictor::new(default_timeout)),
            PredictorChoice::Simple => Box::new(HeuristicPredictor::new(params)),
        }
    }
}

impl fmt::Display for PredictorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictorChoice::Fixed => f.write_str("fixed"),
            PredictorChoice::Simple => f.write_str("simple"),
        }
    }
}

impl FromStr for PredictorChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "default" | "no" => Ok(PredictorChoice::Fixed),
            "simple" | "itm" => Ok(PredictorChoice::Simple),
            // 学习型预测器只能通过 `Predictor` 接入
            "q" | "dqn" => Err(ConfigError::UnsupportedPredictor(s.to_string())),
            _ => Err(ConfigError::UnknownPredictor(s.to_string())),
        }
    }
}

impl TryFrom<String> for PredictorChoice {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PredictorChoice> for String {
    fn from(choice: PredictorChoice) -> Self {
        choice.to_string()
    }
}
