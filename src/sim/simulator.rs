//! 仿真器
//!
//! 逐包推进的离散事件循环。一个包完整走完所有跳之后才处理下一个包；
//! 仿真时间只在包到达目的地后，按其实际路径的时延推进。
//!
//! 每一跳的顺序固定为：表老化/淘汰 → flow-removed 通知及其指令 →
//! 匹配转发 → （未命中时）packet-in 及其指令。

use std::collections::HashSet;

use tracing::{debug, info, trace};

use super::error::SimError;
use super::metrics::{Checkpoint, MetricsSink, Stats};
use super::time::SimTime;
use crate::net::{FiveTuple, Hop, Network, NetworkError, Packet, Query, SwitchId};
use crate::predict::{PredictorEvent, PredictorKind};

/// 仿真参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// 每出现多少条新流记录一次检查点
    pub check_interval: u64,
    /// 预测器周期维护的间隔
    pub update_interval: SimTime,
    /// 启发式预测器每隔多少个维护间隔重算一次上限
    pub refresh_every: u64,
    /// 单包跳数上限 = 系数 × 交换机数
    pub hop_guard_factor: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            check_interval: 1,
            update_interval: SimTime::from_secs(1),
            refresh_every: 10,
            hop_guard_factor: 10,
        }
    }
}

/// 周期动作的去重：时间单调，记住上一次触发的时间桶即可。
#[derive(Debug, Default, Clone, Copy)]
struct Bucket(Option<SimTime>);

impl Bucket {
    fn fire(&mut self, bucket: SimTime, period: SimTime) -> bool {
        if period.0 == 0 || bucket.0 % period.0 != 0 || self.0 == Some(bucket) {
            return false;
        }
        self.0 = Some(bucket);
        true
    }
}

/// 单包处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketOutcome {
    pub path: Vec<Hop>,
    pub delay: SimTime,
    pub packet_ins: u64,
    pub overflowed: u64,
}

#[derive(Debug)]
pub struct Simulator {
    cfg: SimConfig,
    now: SimTime,
    flows_seen: HashSet<FiveTuple>,
    checkpoints_seen: HashSet<u64>,
    sample_bucket: Bucket,
    refresh_bucket: Bucket,
    train_bucket: Bucket,
    stats: Stats,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Simulator {
    pub fn new(cfg: SimConfig) -> Self {
        Self {
            cfg,
            now: SimTime::ZERO,
            flows_seen: HashSet::new(),
            checkpoints_seen: HashSet::new(),
            sample_bucket: Bucket::default(),
            refresh_bucket: Bucket::default(),
            train_bucket: Bucket::default(),
            stats: Stats::default(),
        }
    }

    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }

    /// 按顺序处理所有包
    #[tracing::instrument(skip_all)]
    pub fn run<I>(
        &mut self,
        net: &mut Network,
        packets: I,
        sink: &mut dyn MetricsSink,
    ) -> Result<Stats, SimError>
    where
        I: IntoIterator<Item = Packet>,
    {
        info!("▶️  开始运行仿真");
        for pkt in packets {
            self.step(net, pkt, sink)?;
        }
        info!(
            packets = self.stats.packets,
            flows = self.stats.flows,
            packet_ins = self.stats.packet_ins,
            overflowed = self.stats.overflowed,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
        Ok(self.stats)
    }

    /// 处理一个包：走完全程、做周期维护、推进时间、必要时记录检查点。
    #[tracing::instrument(skip(self, net, pkt, sink), fields(pkt_id = pkt.id, src = %pkt.src, dst = %pkt.dst))]
    pub fn step(
        &mut self,
        net: &mut Network,
        mut pkt: Packet,
        sink: &mut dyn MetricsSink,
    ) -> Result<PacketOutcome, SimError> {
        let (packet_ins, overflowed) = self.traverse(net, &mut pkt)?;
        self.periodic(net)?;

        self.flows_seen.insert(pkt.flow_key());
        let flows = self.flows_seen.len() as u64;
        self.stats.packets += 1;
        self.stats.delivered_bytes += pkt.size_bytes as u64;
        self.stats.flows = flows;
        self.stats.packet_ins += packet_ins;
        self.stats.overflowed += overflowed;

        let delay = net.controller().delay(&pkt.path, pkt.size_bytes);
        self.now = self.now.saturating_add(delay);
        sink.on_packet_done(pkt.flow_key(), delay);
        debug!(path = ?pkt.path, ?delay, now = ?self.now, "📬 数据包送达目的地");

        if self.cfg.check_interval > 0
            && flows % self.cfg.check_interval == 0
            && self.checkpoints_seen.insert(flows)
        {
            let total_entries = net.query_count(Query::TotalSize)?;
            let cp = Checkpoint {
                flows,
                elapsed: self.now,
                total_entries,
                total_overflow: self.stats.overflowed,
                total_packet_ins: self.stats.packet_ins,
                total_installs: net.controller().total_installs(),
                total_packets: self.stats.packets,
            };
            trace!(?cp, "记录检查点");
            sink.on_checkpoint(&cp);
        }

        Ok(PacketOutcome {
            path: pkt.path,
            delay,
            packet_ins,
            overflowed,
        })
    }

    /// 逐跳转发直到目的地；返回 (packet-in 次数, 溢出淘汰条数)。
    fn traverse(&mut self, net: &mut Network, pkt: &mut Packet) -> Result<(u64, u64), SimError> {
        let now = self.now;
        let limit = self.cfg.hop_guard_factor.saturating_mul(net.len());
        let mut at: SwitchId = pkt.src;
        let mut hops = 0usize;
        let mut packet_ins = 0u64;
        let mut overflowed = 0u64;

        loop {
            if at == pkt.dst {
                pkt.path.push(Hop::Switch(at));
                break;
            }

            let removed = net.switch_mut(at)?.update(Some(now));
            overflowed += removed.overflowed.len() as u64;
            let insts = net.controller_mut().flow_removed(at, &removed, now)?;
            net.apply(insts)?;

            match net.switch_mut(at)?.recv(pkt, now)? {
                Hop::Controller => {
                    packet_ins += 1;
                    let insts = net.controller_mut().packet_in(at, pkt, now)?;
                    net.apply(insts)?;
                }
                Hop::Switch(next) => {
                    trace!(from = %at, to = %next, "转发");
                    at = next;
                }
                Hop::Local => {
                    trace!(%at, "本地交付");
                    break;
                }
            }

            hops += 1;
            if hops >= limit {
                return Err(SimError::ForwardingLoop {
                    pkt_id: pkt.id,
                    at,
                    hops,
                    limit,
                });
            }
        }

        Ok((packet_ins, overflowed))
    }

    /// 预测器周期维护：按整秒时间桶触发，每个桶每种动作至多一次。
    fn periodic(&mut self, net: &mut Network) -> Result<(), SimError> {
        let bucket = self.now.floor_to(SimTime::from_secs(1));
        let interval = self.cfg.update_interval;
        match net.controller().predictor().kind() {
            PredictorKind::Fixed => {}
            PredictorKind::Heuristic => {
                if self.sample_bucket.fire(bucket, interval) {
                    let sizes = net
                        .switches()
                        .iter()
                        .map(|sw| Ok((sw.id(), net.query_count(Query::TableSize(sw.id()))?)))
                        .collect::<Result<Vec<_>, NetworkError>>()?;
                    let predictor = net.controller_mut().predictor_mut();
                    for (switch, size) in sizes {
                        predictor.notify(PredictorEvent::TableSizeSample {
                            switch,
                            at: bucket,
                            size,
                        });
                    }
                    trace!(?bucket, "采样流表大小");
                }
                let refresh_period = SimTime(interval.0.saturating_mul(self.cfg.refresh_every));
                if self.refresh_bucket.fire(bucket, refresh_period) {
                    net.controller_mut().predictor_mut().refresh();
                    debug!(?bucket, "刷新预测器");
                }
            }
            PredictorKind::ValueFunction => {
                if self.train_bucket.fire(bucket, interval) {
                    net.controller_mut().predictor_mut().train_step();
                    trace!(?bucket, "训练一步");
                }
            }
        }
        Ok(())
    }
}
