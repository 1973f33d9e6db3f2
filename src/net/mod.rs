//! 网络模拟模块
//!
//! 此模块包含数据平面的核心组件：交换机、流表、流表项、数据包、
//! 指令协议与执行器，以及最短路径索引。

// 子模块声明
mod id;
mod packet;
mod entry;
mod error;
mod flow_table;
mod switch;
mod instruction;
mod network;
mod routing;

// 重新导出公共接口
pub use id::{Hop, SwitchId};
pub use packet::{FiveTuple, Packet, REFERENCE_PKT_BYTES};
pub use entry::{
    Action, DST_IP_PRIORITY, Entry, EntryKey, FIVE_TUPLE_PRIORITY, FieldKind, MatchValue,
    TimeoutKind, Timer, prefix_of,
};
pub use error::{NetworkError, TableError};
pub use flow_table::{AddOutcome, FlowTable, TickOutcome};
pub use switch::{Switch, SwitchKind, TableCapacity};
pub use instruction::{Instruction, Query, QueryReply};
pub use network::Network;
pub use routing::{DelayModel, DelayParams, Path, PathIndex};
