//! Packet-in 策略

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sim::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PacketInMode {
    /// 只在首跳安装精确五元组规则，逐跳懒安装
    Default,
    /// 一次性在整条路径安装精确五元组规则
    Spath,
    /// 目的前缀规则 + 依赖规则，HARD 超时由预测器给出
    Hard,
    /// 精确目的 IP 规则，IDLE 超时由预测器给出
    Idle,
    /// 主规则 IDLE（预测器给出），依赖规则 HARD 且永不超时
    Hybrid,
}

impl PacketInMode {
    /// HARD/HYBRID 需要外部提供的规则依赖集合
    pub fn needs_ruleset(self) -> bool {
        matches!(self, PacketInMode::Hard | PacketInMode::Hybrid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PacketInMode::Default => "default",
            PacketInMode::Spath => "spath",
            PacketInMode::Hard => "hard",
            PacketInMode::Idle => "idle",
            PacketInMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for PacketInMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PacketInMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(PacketInMode::Default),
            "spath" => Ok(PacketInMode::Spath),
            "hard" => Ok(PacketInMode::Hard),
            "idle" => Ok(PacketInMode::Idle),
            "hybrid" => Ok(PacketInMode::Hybrid),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for PacketInMode {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PacketInMode> for String {
    fn from(mode: PacketInMode) -> Self {
        mode.as_str().to_string()
    }
}
