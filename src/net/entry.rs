//! 流表项
//!
//! 一条转发规则：匹配字段种类、优先级、匹配值、动作列表，以及可选的超时计时器。
//! 相等性只由 (field, priority, value) 决定，动作/标志/计时器不参与。

use std::fmt;
use std::net::Ipv4Addr;

use super::id::Hop;
use super::packet::FiveTuple;
use crate::ctrl::Rule;
use crate::sim::SimTime;

/// 精确五元组规则的优先级（高于 0..=32 的目的前缀区间）
pub const FIVE_TUPLE_PRIORITY: u8 = 40;
/// 精确目的 IP 规则的优先级
pub const DST_IP_PRIORITY: u8 = 32;

/// 规则匹配的报文字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    /// 精确五元组
    FiveTuple,
    /// 精确目的 IP
    DstIp,
    /// 目的前缀，掩码长度 0..=31
    DstPrefix(u8),
}

impl FieldKind {
    /// 前缀长度为 32 时落到精确目的 IP 字段。
    pub fn for_prefix_len(len: u8) -> Self {
        if len >= 32 {
            FieldKind::DstIp
        } else {
            FieldKind::DstPrefix(len)
        }
    }
}

/// 匹配值
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchValue {
    Tuple(FiveTuple),
    /// 目的 IP 或前缀网络地址
    Ip(Ipv4Addr),
}

impl fmt::Display for MatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchValue::Tuple(t) => write!(f, "{t}"),
            MatchValue::Ip(ip) => write!(f, "{ip}"),
        }
    }
}

/// 把 `ip` 截断为掩码 `len` 的网络地址。
pub fn prefix_of(ip: Ipv4Addr, len: u8) -> Ipv4Addr {
    let bits = u32::from(ip);
    let masked = match len {
        0 => 0,
        l if l >= 32 => bits,
        l => bits & (u32::MAX << (32 - l)),
    };
    Ipv4Addr::from(masked)
}

/// 超时类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    /// 安装时固定，命中不刷新
    Hard,
    /// 每次命中重置
    Idle,
}

/// 规则计时器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub installed_at: SimTime,
    pub timeout: SimTime,
    pub kind: TimeoutKind,
}

impl Timer {
    pub fn expires_at(&self) -> SimTime {
        self.installed_at.saturating_add(self.timeout)
    }
}

/// 动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward(Hop),
    Tag(u64),
}

/// 流表主键：每个 (field, value) 至多一条表项。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub field: FieldKind,
    pub value: MatchValue,
}

/// 流表项
#[derive(Debug, Clone)]
pub struct Entry {
    pub field: FieldKind,
    pub priority: u8,
    pub value: MatchValue,
    pub actions: Vec<Action>,
    pub remove_notify: bool,
    pub timer: Option<Timer>,
    /// 命中计数
    pub hits: u64,
}

impl Entry {
    pub fn new(field: FieldKind, priority: u8, value: MatchValue, actions: Vec<Action>) -> Self {
        Self {
            field,
            priority,
            value,
            actions,
            remove_notify: false,
            timer: None,
            hits: 0,
        }
    }

    /// 精确五元组规则
    pub fn five_tuple(tuple: FiveTuple, actions: Vec<Action>) -> Self {
        Self::new(
            FieldKind::FiveTuple,
            FIVE_TUPLE_PRIORITY,
            MatchValue::Tuple(tuple),
            actions,
        )
    }

    /// 目的前缀规则（长度 32 即精确目的 IP）
    pub fn for_rule(rule: Rule, actions: Vec<Action>) -> Self {
        Self::new(
            FieldKind::for_prefix_len(rule.len),
            rule.len.min(DST_IP_PRIORITY),
            MatchValue::Ip(prefix_of(rule.addr, rule.len)),
            actions,
        )
    }

    pub fn notify_on_remove(mut self) -> Self {
        self.remove_notify = true;
        self
    }

    pub fn with_timer(mut self, installed_at: SimTime, timeout: SimTime, kind: TimeoutKind) -> Self {
        self.timer = Some(Timer {
            installed_at,
            timeout,
            kind,
        });
        self
    }

    pub fn key(&self) -> EntryKey {
        EntryKey {
            field: self.field,
            value: self.value,
        }
    }

    /// 目的地址类规则对应的 [`Rule`]；五元组规则没有。
    pub fn rule(&self) -> Option<Rule> {
        match (self.field, self.value) {
            (FieldKind::DstIp, MatchValue::Ip(addr)) => Some(Rule::new(addr, DST_IP_PRIORITY)),
            (FieldKind::DstPrefix(len), MatchValue::Ip(addr)) => Some(Rule::new(addr, len)),
            _ => None,
        }
    }

    pub fn timeout_kind(&self) -> Option<TimeoutKind> {
        self.timer.map(|t| t.kind)
    }

    /// 按 FIFO 淘汰时使用的安装时间；未计时的表项视为最早安装。
    pub fn installed_at(&self) -> SimTime {
        self.timer.map_or(SimTime::ZERO, |t| t.installed_at)
    }

    pub fn is_expired(&self, now: SimTime) -> bool {
        self.timer.is_some_and(|t| t.expires_at() <= now)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.priority == other.priority && self.value == other.value
    }
}

impl Eq for Entry {}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field:{:?}, priority:{}, match:{}, actions:{:?}, notify:{}, hits:{}",
            self.field, self.priority, self.value, self.actions, self.remove_notify, self.hits
        )?;
        if let Some(t) = self.timer {
            write!(
                f,
                ", installed_at:{:?}, timeout:{:?}, kind:{:?}",
                t.installed_at, t.timeout, t.kind
            )?;
        }
        Ok(())
    }
}
