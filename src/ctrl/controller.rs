//! 控制器
//!
//! 持有最短路径索引、预测器，以及（HARD/HYBRID 需要的）规则依赖提供者。
//! table miss 时生成策略相关的安装指令；表项移除时通知预测器，HYBRID 下还会清理依赖规则。

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::error::ControllerError;
use super::mode::PacketInMode;
use super::ruleset::{Rule, RuleDependency};
use crate::net::{
    Action, DelayModel, Entry, Hop, Instruction, Packet, Path, PathIndex, SwitchId, TickOutcome,
    TimeoutKind, DST_IP_PRIORITY,
};
use crate::predict::{Predictor, PredictorEvent, PredictorKind};
use crate::sim::SimTime;
use crate::topo::Topology;

pub struct Controller {
    topo: Topology,
    delay: DelayModel,
    paths: PathIndex,
    mode: PacketInMode,
    predictor: Box<dyn Predictor>,
    rules: Option<Box<dyn RuleDependency>>,
    default_timeout: SimTime,
    install_counts: BTreeMap<Rule, u64>,
}

impl Controller {
    pub fn new(
        topo: Topology,
        delay: DelayModel,
        mode: PacketInMode,
        predictor: Box<dyn Predictor>,
        default_timeout: SimTime,
    ) -> Self {
        let paths = PathIndex::compute(&topo, &delay, &[]);
        Self {
            topo,
            delay,
            paths,
            mode,
            predictor,
            rules: None,
            default_timeout,
            install_counts: BTreeMap::new(),
        }
    }

    pub fn with_rules(mut self, rules: Box<dyn RuleDependency>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn mode(&self) -> PacketInMode {
        self.mode
    }

    pub fn paths(&self) -> &PathIndex {
        &self.paths
    }

    pub fn delay_model(&self) -> &DelayModel {
        &self.delay
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn predictor_mut(&mut self) -> &mut dyn Predictor {
        self.predictor.as_mut()
    }

    /// 排除若干节点后重新计算路径索引
    pub fn exclude_switches(&mut self, excluded: &[SwitchId]) {
        self.paths = PathIndex::compute(&self.topo, &self.delay, excluded);
    }

    /// 实际经过路径的传输时延
    pub fn delay(&self, path: &[Hop], size_bytes: u32) -> SimTime {
        self.delay.delay(path, size_bytes)
    }

    /// 每条规则的安装次数（仅用于诊断）
    pub fn install_counts(&self) -> &BTreeMap<Rule, u64> {
        &self.install_counts
    }

    pub fn total_installs(&self) -> u64 {
        self.install_counts.values().sum()
    }

    fn record_install(&mut self, rule: Rule) {
        *self.install_counts.entry(rule).or_insert(0) += 1;
    }

    fn path_to(&self, from: SwitchId, to: SwitchId) -> Result<Path, ControllerError> {
        match self.paths.best(from, to) {
            Some(path) if path.len() >= 2 => Ok(path.clone()),
            _ => Err(ControllerError::NoPath { from, to }),
        }
    }

    fn ruleset(&self) -> Result<&dyn RuleDependency, ControllerError> {
        self.rules
            .as_deref()
            .ok_or(ControllerError::RulesetRequired(self.mode))
    }

    fn dependencies(&self, rule: &Rule) -> Result<Vec<Rule>, ControllerError> {
        self.ruleset()?
            .dependencies_of(rule)
            .map(|d| d.to_vec())
            .ok_or(ControllerError::MissingDependencies(*rule))
    }

    /// 启发式预测器先收到 packet-in，再给出超时；价值函数类直接查询。
    fn timeout_for(&mut self, rule: Rule, at: SwitchId, now: SimTime) -> SimTime {
        if self.predictor.kind() == PredictorKind::Heuristic {
            self.predictor.notify(PredictorEvent::PacketIn {
                switch: at,
                at: now,
                rule,
            });
        }
        self.predictor.predict(&rule, now, at)
    }

    /// table miss 处理：返回需要执行的指令序列
    #[tracing::instrument(skip(self, pkt), fields(mode = %self.mode, pkt_id = pkt.id, dst = %pkt.dst))]
    pub fn packet_in(
        &mut self,
        at: SwitchId,
        pkt: &Packet,
        now: SimTime,
    ) -> Result<Vec<Instruction>, ControllerError> {
        let path = self.path_to(at, pkt.dst)?;
        trace!(?path, "选用最短路径");

        let insts = match self.mode {
            PacketInMode::Default => {
                let entry = Entry::five_tuple(pkt.tuple, forward_to(path[1]))
                    .notify_on_remove()
                    .with_timer(now, self.default_timeout, TimeoutKind::Idle);
                vec![Instruction::Add { switch: at, entry }]
            }
            PacketInMode::Spath => hops(&path)
                .map(|(switch, next)| Instruction::Add {
                    switch,
                    entry: Entry::five_tuple(pkt.tuple, forward_to(next))
                        .notify_on_remove()
                        .with_timer(now, self.default_timeout, TimeoutKind::Idle),
                })
                .collect(),
            PacketInMode::Idle => {
                let rule = Rule::host(pkt.dst_ip());
                let timeout = self.timeout_for(rule, at, now);
                self.install_along(&path, rule, true, now, timeout, TimeoutKind::Idle)
            }
            PacketInMode::Hard => {
                let (rule, deps) = self.lookup_rule(pkt)?;
                let timeout = self.timeout_for(rule, at, now);
                let mut insts =
                    self.install_along(&path, rule, true, now, timeout, TimeoutKind::Hard);
                for dep in deps {
                    insts.extend(self.install_along(&path, dep, false, now, timeout, TimeoutKind::Hard));
                }
                insts
            }
            PacketInMode::Hybrid => {
                let (rule, deps) = self.lookup_rule(pkt)?;
                let timeout = self.timeout_for(rule, at, now);
                let mut insts =
                    self.install_along(&path, rule, true, now, timeout, TimeoutKind::Idle);
                for dep in deps {
                    insts.extend(self.install_along(
                        &path,
                        dep,
                        false,
                        now,
                        SimTime::INFINITE,
                        TimeoutKind::Hard,
                    ));
                }
                insts
            }
        };

        debug!(instructions = insts.len(), "📥 packet-in 处理完成");
        Ok(insts)
    }

    fn lookup_rule(&self, pkt: &Packet) -> Result<(Rule, Vec<Rule>), ControllerError> {
        let rule = self
            .ruleset()?
            .rule_for(pkt.dst_ip())
            .ok_or(ControllerError::MissingRule(pkt.dst_ip()))?;
        let deps = self.dependencies(&rule)?;
        Ok((rule, deps))
    }

    fn install_along(
        &mut self,
        path: &[SwitchId],
        rule: Rule,
        notify: bool,
        now: SimTime,
        timeout: SimTime,
        kind: TimeoutKind,
    ) -> Vec<Instruction> {
        let mut insts = Vec::with_capacity(path.len().saturating_sub(1));
        for (switch, next) in hops(path) {
            let mut entry = Entry::for_rule(rule, forward_to(next)).with_timer(now, timeout, kind);
            if notify {
                entry = entry.notify_on_remove();
            }
            insts.push(Instruction::Add { switch, entry });
            self.record_install(rule);
        }
        insts
    }

    /// 表项移除处理：通知预测器；HYBRID 下为到期的 IDLE 主规则删除其依赖规则。
    #[tracing::instrument(skip(self, removed), fields(mode = %self.mode, expired = removed.expired.len(), overflowed = removed.overflowed.len()))]
    pub fn flow_removed(
        &mut self,
        at: SwitchId,
        removed: &TickOutcome,
        now: SimTime,
    ) -> Result<Vec<Instruction>, ControllerError> {
        let notified: Vec<&Entry> = match self.predictor.kind() {
            PredictorKind::Fixed => Vec::new(),
            PredictorKind::Heuristic => removed.expired.iter().collect(),
            PredictorKind::ValueFunction => removed
                .expired
                .iter()
                .chain(removed.overflowed.iter())
                .collect(),
        };
        for entry in notified {
            self.predictor.notify(PredictorEvent::FlowRemoved {
                switch: at,
                at: now,
                entry,
            });
        }

        match self.mode {
            PacketInMode::Default
            | PacketInMode::Spath
            | PacketInMode::Hard
            | PacketInMode::Idle => Ok(Vec::new()),
            PacketInMode::Hybrid => {
                let mut insts = Vec::new();
                for entry in &removed.expired {
                    if entry.timeout_kind() != Some(TimeoutKind::Idle)
                        || entry.priority >= DST_IP_PRIORITY
                    {
                        continue;
                    }
                    let Some(rule) = entry.rule() else {
                        continue;
                    };
                    for dep in self.dependencies(&rule)? {
                        insts.push(Instruction::Delete {
                            switch: at,
                            entry: Entry::for_rule(dep, Vec::new()),
                        });
                    }
                }
                if !insts.is_empty() {
                    debug!(deletes = insts.len(), "🧹 清理依赖规则");
                }
                Ok(insts)
            }
        }
    }
}

fn forward_to(next: SwitchId) -> Vec<Action> {
    vec![Action::Forward(Hop::Switch(next))]
}

/// 路径上每一跳及其下一跳
fn hops(path: &[SwitchId]) -> impl Iterator<Item = (SwitchId, SwitchId)> + '_ {
    path.windows(2).map(|w| (w[0], w[1]))
}
