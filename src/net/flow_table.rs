//! 流表
//!
//! 每台交换机独占一张流表。主键为 (field, value)，每个主键至多一条表项；
//! 表项按插入顺序编号，全表扫描与淘汰排序都以此为稳定次序。

use std::collections::HashMap;

use tracing::{debug, trace};

use super::entry::{Entry, EntryKey, FieldKind, MatchValue, TimeoutKind, prefix_of};
use super::packet::Packet;
use crate::sim::SimTime;

/// `add` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    /// 同一主键上优先级不低于旧表项，原位替换
    Replaced,
    /// 同一主键上优先级更低，忽略
    Ignored,
}

/// 一次 `tick` 移除的表项：超时（仅带 remove-notify 的）与溢出淘汰分开上报。
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub expired: Vec<Entry>,
    pub overflowed: Vec<Entry>,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.overflowed.is_empty()
    }
}

#[derive(Debug)]
struct Slot {
    seq: u64,
    entry: Entry,
}

#[derive(Debug)]
pub struct FlowTable {
    slots: HashMap<EntryKey, Slot>,
    next_seq: u64,
    capacity: usize,
}

impl FlowTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            next_seq: 0,
            capacity,
        }
    }

    /// 当前表项数（`table_size`）
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn get(&self, key: &EntryKey) -> Option<&Entry> {
        self.slots.get(key).map(|s| &s.entry)
    }

    /// 按插入顺序列出全部表项
    pub fn entries(&self) -> Vec<&Entry> {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by_key(|s| s.seq);
        slots.into_iter().map(|s| &s.entry).collect()
    }

    /// 插入表项。同主键已存在时，仅当 `new.priority >= old.priority` 才替换。
    pub fn add(&mut self, entry: Entry) -> AddOutcome {
        let key = entry.key();
        if let Some(slot) = self.slots.get_mut(&key) {
            if entry.priority >= slot.entry.priority {
                trace!(?key, "原位替换表项");
                slot.entry = entry;
                return AddOutcome::Replaced;
            }
            trace!(?key, "忽略低优先级重复表项");
            return AddOutcome::Ignored;
        }
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.slots.insert(key, Slot { seq, entry });
        AddOutcome::Inserted
    }

    /// 按身份 (field, priority, value) 删除；不存在时返回 `None`。
    pub fn remove(&mut self, entry: &Entry) -> Option<Entry> {
        let key = entry.key();
        match self.slots.get(&key) {
            Some(slot) if slot.entry == *entry => self.slots.remove(&key).map(|s| s.entry),
            _ => None,
        }
    }

    /// 查找匹配表项并记一次命中；IDLE 表项在 `now` 已知时刷新安装时间。
    pub fn lookup(&mut self, pkt: &Packet, now: Option<SimTime>) -> Option<&Entry> {
        let key = self.resolve(pkt)?;
        let slot = self.slots.get_mut(&key)?;
        let entry = &mut slot.entry;
        entry.hits = entry.hits.saturating_add(1);
        if let (Some(now), Some(timer)) = (now, entry.timer.as_mut()) {
            if timer.kind == TimeoutKind::Idle {
                timer.installed_at = now;
            }
        }
        Some(&slot.entry)
    }

    /// 先精确匹配（五元组，再目的 IP；高优先级胜出，平局保留先解析到的），
    /// 再从掩码 31 到 0 扫描前缀字段，取第一个命中。
    fn resolve(&self, pkt: &Packet) -> Option<EntryKey> {
        let dst = pkt.dst_ip();
        let exact = [
            EntryKey {
                field: FieldKind::FiveTuple,
                value: MatchValue::Tuple(pkt.tuple),
            },
            EntryKey {
                field: FieldKind::DstIp,
                value: MatchValue::Ip(dst),
            },
        ];

        let mut best: Option<(EntryKey, u8)> = None;
        for key in exact {
            if let Some(slot) = self.slots.get(&key) {
                let prio = slot.entry.priority;
                match best {
                    Some((_, best_prio)) if prio <= best_prio => {}
                    _ => best = Some((key, prio)),
                }
            }
        }
        if let Some((key, _)) = best {
            return Some(key);
        }

        (0..32u8).rev().find_map(|len| {
            let key = EntryKey {
                field: FieldKind::DstPrefix(len),
                value: MatchValue::Ip(prefix_of(dst, len)),
            };
            self.slots.contains_key(&key).then_some(key)
        })
    }

    /// 老化与容量淘汰。
    ///
    /// `now` 为 `None` 时只做容量检查，且按命中次数升序（近似 LRU）淘汰；
    /// 否则先移除到期表项，再按安装时间升序（近似 FIFO）淘汰。
    pub fn tick(&mut self, now: Option<SimTime>) -> TickOutcome {
        let mut out = TickOutcome::default();

        if let Some(now) = now {
            let mut due: Vec<(u64, EntryKey)> = self
                .slots
                .iter()
                .filter(|(_, s)| s.entry.is_expired(now))
                .map(|(k, s)| (s.seq, *k))
                .collect();
            due.sort_by_key(|(seq, _)| *seq);
            for (_, key) in due {
                if let Some(slot) = self.slots.remove(&key) {
                    if slot.entry.remove_notify {
                        out.expired.push(slot.entry);
                    }
                }
            }
        }

        if self.slots.len() > self.capacity {
            let surplus = self.slots.len() - self.capacity;
            let mut order: Vec<(u64, EntryKey, SimTime, u64)> = self
                .slots
                .iter()
                .map(|(k, s)| (s.seq, *k, s.entry.installed_at(), s.entry.hits))
                .collect();
            order.sort_by_key(|(seq, ..)| *seq);
            match now {
                Some(_) => order.sort_by_key(|(_, _, installed_at, _)| *installed_at),
                None => order.sort_by_key(|(_, _, _, hits)| *hits),
            }
            for (_, key, ..) in order.into_iter().take(surplus) {
                if let Some(slot) = self.slots.remove(&key) {
                    out.overflowed.push(slot.entry);
                }
            }
            debug!(surplus, capacity = self.capacity, "流表溢出淘汰");
        }

        out
    }
}
