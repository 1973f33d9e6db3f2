//! 交换机
//!
//! 交换机独占一张流表，对外提供收包（匹配 + 执行动作）与表维护（老化/淘汰）。

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::entry::{Action, Entry};
use super::error::TableError;
use super::flow_table::{AddOutcome, FlowTable, TickOutcome};
use super::id::{Hop, SwitchId};
use super::packet::Packet;
use crate::sim::SimTime;

/// 交换机类型，决定流表容量与转发时延
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchKind {
    Hardware,
    Software,
}

/// 各类型交换机的流表容量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCapacity {
    pub hardware: usize,
    pub software: usize,
}

impl Default for TableCapacity {
    fn default() -> Self {
        Self {
            hardware: 3000,
            software: 1_000_000_000,
        }
    }
}

impl TableCapacity {
    pub fn for_kind(&self, kind: SwitchKind) -> usize {
        match kind {
            SwitchKind::Hardware => self.hardware,
            SwitchKind::Software => self.software,
        }
    }
}

/// 交换机节点
#[derive(Debug)]
pub struct Switch {
    id: SwitchId,
    kind: SwitchKind,
    table: FlowTable,
    default_actions: Vec<Action>,
}

impl Switch {
    pub fn new(id: SwitchId, kind: SwitchKind, capacity: &TableCapacity) -> Self {
        Self {
            id,
            kind,
            table: FlowTable::new(capacity.for_kind(kind)),
            default_actions: vec![Action::Forward(Hop::Controller)],
        }
    }

    pub fn id(&self) -> SwitchId {
        self.id
    }

    pub fn kind(&self) -> SwitchKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: SwitchKind, capacity: &TableCapacity) {
        self.kind = kind;
        self.table.set_capacity(capacity.for_kind(kind));
    }

    pub fn set_default_actions(&mut self, actions: Vec<Action>) {
        self.default_actions = actions;
    }

    pub fn table(&self) -> &FlowTable {
        &self.table
    }

    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    pub fn entries(&self) -> Vec<&Entry> {
        self.table.entries()
    }

    pub fn add_entry(&mut self, entry: Entry) -> AddOutcome {
        let outcome = self.table.add(entry);
        trace!(switch = %self.id, ?outcome, table_size = self.table.len(), "添加表项");
        outcome
    }

    pub fn delete_entry(&mut self, entry: &Entry) -> Result<Entry, TableError> {
        self.table
            .remove(entry)
            .ok_or_else(|| TableError::EntryNotFound {
                switch: self.id,
                key: entry.key(),
                priority: entry.priority,
            })
    }

    /// 表维护：老化 + 容量淘汰
    pub fn update(&mut self, now: Option<SimTime>) -> TickOutcome {
        let out = self.table.tick(now);
        if !out.is_empty() {
            debug!(
                switch = %self.id,
                expired = out.expired.len(),
                overflowed = out.overflowed.len(),
                table_size = self.table.len(),
                "⏳ 表项移除"
            );
        }
        out
    }

    /// 收包：匹配流表（未命中时用默认动作），依序执行动作，返回下一跳。
    ///
    /// 本交换机总会追加到 `pkt.path`；若上送控制器，还会追加控制器哨兵。
    #[tracing::instrument(skip(self, pkt), fields(switch = %self.id, pkt_id = pkt.id))]
    pub fn recv(&mut self, pkt: &mut Packet, now: SimTime) -> Result<Hop, TableError> {
        let actions = match self.table.lookup(pkt, Some(now)) {
            Some(entry) => {
                trace!(priority = entry.priority, hits = entry.hits, "命中表项");
                entry.actions.clone()
            }
            None => {
                trace!("未命中，执行默认动作");
                self.default_actions.clone()
            }
        };

        let mut next_hop = None;
        for action in actions {
            match action {
                Action::Tag(tag) => pkt.tag = Some(tag),
                Action::Forward(hop) => next_hop = Some(hop),
            }
        }
        let Some(next_hop) = next_hop else {
            warn!("动作列表中没有转发动作");
            return Err(TableError::NoForwardAction { switch: self.id });
        };

        pkt.path.push(Hop::Switch(self.id));
        if next_hop == Hop::Controller {
            pkt.path.push(Hop::Controller);
        }
        Ok(next_hop)
    }
}
