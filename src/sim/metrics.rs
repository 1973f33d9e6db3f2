//! 指标输出
//!
//! 核心只负责产出检查点元组与每包时延，聚合与导出由外部的 sink 完成。

use std::collections::BTreeMap;

use serde::Serialize;

use crate::net::FiveTuple;
use crate::sim::SimTime;

/// 检查点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    /// 截至当前包已出现的流数
    pub flows: u64,
    /// 累计仿真时间
    pub elapsed: SimTime,
    pub total_entries: usize,
    pub total_overflow: u64,
    pub total_packet_ins: u64,
    pub total_installs: u64,
    pub total_packets: u64,
}

/// 仿真统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub packets: u64,
    pub delivered_bytes: u64,
    pub flows: u64,
    pub packet_ins: u64,
    pub overflowed: u64,
}

pub trait MetricsSink {
    fn on_checkpoint(&mut self, cp: &Checkpoint);

    /// 一个包到达目的地，`delay` 计入其所属流的完成时间
    fn on_packet_done(&mut self, _flow: FiveTuple, _delay: SimTime) {}
}

/// 不记录任何东西
#[derive(Debug, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn on_checkpoint(&mut self, _cp: &Checkpoint) {}
}

/// 内存记录器
#[derive(Debug, Default)]
pub struct Recorder {
    pub checkpoints: Vec<Checkpoint>,
    pub flow_completion: BTreeMap<FiveTuple, SimTime>,
}

impl MetricsSink for Recorder {
    fn on_checkpoint(&mut self, cp: &Checkpoint) {
        self.checkpoints.push(*cp);
    }

    fn on_packet_done(&mut self, flow: FiveTuple, delay: SimTime) {
        let fct = self.flow_completion.entry(flow).or_default();
        *fct = fct.saturating_add(delay);
    }
}
