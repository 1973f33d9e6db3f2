//! 基于流表占用的超时启发式
//!
//! 每台交换机维护一个超时上限：取最近 `window` 个占用采样的均值与高水位比较，
//! 高于水位时上限向 1 收缩，低于水位时回升，并限制在 `[1s, ceiling_max]` 内。
//! 曾被移除过的规则得到 `最近一次 packet-in 与上次移除的间隔 + margin`，
//! 不超过上限；从未移除过的规则直接取上限。结果四舍五入到整秒。

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Predictor, PredictorEvent, PredictorKind};
use crate::ctrl::Rule;
use crate::net::SwitchId;
use crate::sim::SimTime;

const CEILING_MIN_US: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicParams {
    pub ceiling_max: SimTime,
    /// 上限开始收缩的占用
    pub watermark: f64,
    /// 上限降到下限时的占用
    pub peak: f64,
    pub window: usize,
    pub margin: SimTime,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            ceiling_max: SimTime::from_secs(10),
            watermark: 900.0,
            peak: 1300.0,
            window: 10,
            margin: SimTime::from_secs(2),
        }
    }
}

#[derive(Debug)]
struct SwitchHistory {
    samples: VecDeque<usize>,
    ceiling: SimTime,
    last_retrigger: HashMap<Rule, SimTime>,
    last_removal: HashMap<Rule, SimTime>,
}

impl SwitchHistory {
    fn new(ceiling: SimTime) -> Self {
        Self {
            samples: VecDeque::new(),
            ceiling,
            last_retrigger: HashMap::new(),
            last_removal: HashMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct HeuristicPredictor {
    params: HeuristicParams,
    switches: BTreeMap<SwitchId, SwitchHistory>,
}

impl HeuristicPredictor {
    pub fn new(params: HeuristicParams) -> Self {
        Self {
            params,
            switches: BTreeMap::new(),
        }
    }

    fn history(&mut self, switch: SwitchId) -> &mut SwitchHistory {
        let ceiling = self.params.ceiling_max;
        self.switches
            .entry(switch)
            .or_insert_with(|| SwitchHistory::new(ceiling))
    }

    /// `switch` 当前的超时上限
    pub fn ceiling(&self, switch: SwitchId) -> SimTime {
        self.switches
            .get(&switch)
            .map_or(self.params.ceiling_max, |h| h.ceiling)
    }

    /// 按占用窗口重算每台已采样交换机的上限
    pub fn update_ceiling(&mut self) {
        let p = self.params;
        let max_us = p.ceiling_max.0 as f64 / 1_000.0;
        for (switch, h) in self.switches.iter_mut() {
            if h.samples.is_empty() {
                continue;
            }
            // 窗口未满时仍以窗口长度作除数
            let avg = h.samples.iter().sum::<usize>() as f64 / p.window.max(1) as f64;
            let old = h.ceiling.as_micros_f64();
            let next = if avg >= p.watermark {
                let k = (avg - p.watermark) / (p.peak - p.watermark);
                (old * (1.0 - k) + k).trunc()
            } else {
                let k = (avg - p.watermark) / p.watermark;
                (old * (1.0 - k) + 1.0).trunc()
            };
            let next = next.max(CEILING_MIN_US).min(max_us);
            h.ceiling = SimTime::from_micros(next as u64);
            debug!(%switch, avg, ceiling = ?h.ceiling, "更新超时上限");
        }
    }
}

impl Predictor for HeuristicPredictor {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Heuristic
    }

    fn notify(&mut self, event: PredictorEvent<'_>) {
        let window = self.params.window.max(1);
        match event {
            PredictorEvent::PacketIn { switch, at, rule } => {
                self.history(switch).last_retrigger.insert(rule, at);
            }
            PredictorEvent::FlowRemoved { switch, at, entry } => {
                if let Some(rule) = entry.rule() {
                    self.history(switch).last_removal.insert(rule, at);
                }
            }
            PredictorEvent::TableSizeSample { switch, size, .. } => {
                let h = self.history(switch);
                h.samples.push_back(size);
                while h.samples.len() > window {
                    h.samples.pop_front();
                }
            }
        }
    }

    fn predict(&mut self, rule: &Rule, now: SimTime, switch: SwitchId) -> SimTime {
        let margin = self.params.margin;
        let h = self.history(switch);
        let ceiling = h.ceiling;
        let timeout = match h.last_removal.get(rule) {
            Some(&removed) => {
                let retrigger = h.last_retrigger.get(rule).copied().unwrap_or(now);
                retrigger.saturating_sub(removed).saturating_add(margin).min(ceiling)
            }
            None => ceiling,
        };
        timeout.round_to_secs()
    }

    fn refresh(&mut self) {
        self.update_ceiling();
    }
}
