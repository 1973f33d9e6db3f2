//! 控制器错误类型

use std::net::Ipv4Addr;

use thiserror::Error;

use super::mode::PacketInMode;
use super::ruleset::Rule;
use crate::net::SwitchId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("no path from {from} to {to}")]
    NoPath { from: SwitchId, to: SwitchId },
    #[error("ruleset has no rule for destination {0}")]
    MissingRule(Ipv4Addr),
    #[error("ruleset has no dependency entry for rule {0}")]
    MissingDependencies(Rule),
    #[error("mode {0} needs a rule-dependency provider")]
    RulesetRequired(PacketInMode),
}
