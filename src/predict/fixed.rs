use super::{Predictor, PredictorEvent, PredictorKind};
use crate::ctrl::Rule;
use crate::net::SwitchId;
use crate::sim::SimTime;

/// 对所有规则返回同一超时，忽略所有通知
#[derive(Debug, Clone)]
pub struct FixedPredictor {
    timeout: SimTime,
}

impl FixedPredictor {
    pub fn new(timeout: SimTime) -> Self {
        Self { timeout }
    }
}

impl Predictor for FixedPredictor {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Fixed
    }

    fn notify(&mut self, _event: PredictorEvent<'_>) {}

    fn predict(&mut self, _rule: &Rule, _now: SimTime, _switch: SwitchId) -> SimTime {
        self.timeout
    }
}
