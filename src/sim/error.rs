//! 仿真与配置错误类型

use std::path::PathBuf;

use thiserror::Error;

use crate::ctrl::{ControllerError, PacketInMode};
use crate::net::{NetworkError, SwitchId, TableError};

/// 配置错误：全部在仿真开始前报告
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown packet-in mode {0:?} (expected default, spath, hard, idle or hybrid)")]
    UnknownMode(String),
    #[error("unknown predictor {0:?} (expected fixed or simple)")]
    UnknownPredictor(String),
    #[error("predictor {0:?} is a learned predictor and is not built into this simulator")]
    UnsupportedPredictor(String),
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    #[error("invalid flow: {0}")]
    InvalidFlow(String),
    #[error("invalid rule {0:?}")]
    InvalidRule(String),
    #[error("mode {0} needs a ruleset in the scenario")]
    RulesetRequired(PacketInMode),
    #[error("unsupported scenario schema_version {0}")]
    UnsupportedSchema(u32),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),
}

/// 仿真运行错误
#[derive(Debug, Error)]
pub enum SimError {
    /// 转发环路：策略或拓扑的逻辑错误，不可恢复
    #[error("packet {pkt_id} still in flight at {at} after {hops} hops (limit {limit}); forwarding loop")]
    ForwardingLoop {
        pkt_id: u64,
        at: SwitchId,
        hops: usize,
        limit: usize,
    },
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Table(#[from] TableError),
}
