//! 规则依赖
//!
//! 规则集由外部离线构建（来自 trace / classbench），仿真期间只读。
//! 控制器只通过 [`RuleDependency`] 读取：目的 IP 对应的规则，以及规则的依赖规则列表。

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::net::prefix_of;
use crate::sim::ConfigError;

/// 目的前缀规则：`addr/len`，`addr` 总是规范化为网络地址。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rule {
    pub len: u8,
    pub addr: Ipv4Addr,
}

impl Rule {
    pub fn new(addr: Ipv4Addr, len: u8) -> Self {
        let len = len.min(32);
        Self {
            len,
            addr: prefix_of(addr, len),
        }
    }

    /// 精确目的 IP
    pub fn host(addr: Ipv4Addr) -> Self {
        Self::new(addr, 32)
    }

    pub fn is_exact(&self) -> bool {
        self.len == 32
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        prefix_of(ip, self.len) == self.addr
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl FromStr for Rule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ConfigError::InvalidRule(s.to_string());
        let (addr, len) = match s.split_once('/') {
            Some((addr, len)) => (addr, len.parse::<u8>().map_err(|_| bad())?),
            None => (s, 32),
        };
        if len > 32 {
            return Err(bad());
        }
        let addr: Ipv4Addr = addr.trim().parse().map_err(|_| bad())?;
        Ok(Rule::new(addr, len))
    }
}

/// 规则依赖提供者
pub trait RuleDependency {
    /// 目的 IP 对应的规则
    fn rule_for(&self, dst: Ipv4Addr) -> Option<Rule>;
    /// 规则依赖的其他规则
    fn dependencies_of(&self, rule: &Rule) -> Option<&[Rule]>;
}

/// 内存中的规则集
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    rules: HashMap<Ipv4Addr, Rule>,
    deps: HashMap<Rule, Vec<Rule>>,
    max_deps: Option<usize>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每条规则最多保留的依赖条数
    pub fn with_max_dependencies(mut self, max: usize) -> Self {
        self.max_deps = Some(max);
        for deps in self.deps.values_mut() {
            deps.truncate(max);
        }
        self
    }

    /// 绑定目的 IP 到规则；规则若还没有依赖项，登记为空依赖。
    pub fn insert_rule(&mut self, dst: Ipv4Addr, rule: Rule) {
        self.rules.insert(dst, rule);
        self.deps.entry(rule).or_default();
    }

    pub fn set_dependencies(&mut self, rule: Rule, mut deps: Vec<Rule>) {
        if let Some(max) = self.max_deps {
            deps.truncate(max);
        }
        self.deps.insert(rule, deps);
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn from_spec(spec: &RulesetSpec) -> Result<Self, ConfigError> {
        let mut set = Ruleset::new();
        if let Some(max) = spec.max_dependencies {
            set = set.with_max_dependencies(max);
        }
        for (rule, deps) in &spec.dependencies {
            let rule: Rule = rule.parse()?;
            let deps = deps
                .iter()
                .map(|d| d.parse::<Rule>())
                .collect::<Result<Vec<_>, _>>()?;
            set.set_dependencies(rule, deps);
        }
        for (dst, rule) in &spec.rules {
            let dst: Ipv4Addr = dst
                .parse()
                .map_err(|_| ConfigError::InvalidRule(dst.clone()))?;
            set.insert_rule(dst, rule.parse()?);
        }
        Ok(set)
    }
}

impl RuleDependency for Ruleset {
    fn rule_for(&self, dst: Ipv4Addr) -> Option<Rule> {
        self.rules.get(&dst).copied()
    }

    fn dependencies_of(&self, rule: &Rule) -> Option<&[Rule]> {
        self.deps.get(rule).map(|v| v.as_slice())
    }
}

/// 规则集的 JSON 描述
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesetSpec {
    /// 目的 IP -> "a.b.c.d/len"
    #[serde(default)]
    pub rules: BTreeMap<String, String>,
    /// 规则 -> 依赖规则列表
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub max_dependencies: Option<usize>,
}
