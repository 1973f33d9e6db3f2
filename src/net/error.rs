//! 网络层错误类型

use thiserror::Error;

use super::entry::EntryKey;
use super::id::SwitchId;
use super::instruction::Query;

/// 流表 / 交换机操作错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("no entry {key:?} (priority {priority}) in flow table of {switch}")]
    EntryNotFound {
        switch: SwitchId,
        key: EntryKey,
        priority: u8,
    },
    #[error("matched action list on {switch} carries no forward action")]
    NoForwardAction { switch: SwitchId },
}

/// 指令执行错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("instruction targets unknown switch {0}")]
    UnknownSwitch(SwitchId),
    #[error("query {0:?} does not produce a count")]
    UnexpectedReply(Query),
    #[error(transparent)]
    Table(#[from] TableError),
}
