//! 控制器与流表之间唯一的变更通道：ADD / DELETE / QUERY 三种指令。

use super::entry::Entry;
use super::id::SwitchId;

#[derive(Debug, Clone)]
pub enum Instruction {
    Add { switch: SwitchId, entry: Entry },
    Delete { switch: SwitchId, entry: Entry },
    Query(Query),
}

/// 查询范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// 所有交换机表项总数
    TotalSize,
    /// 某台交换机的表项数
    TableSize(SwitchId),
    /// 某台交换机的表项列表
    Entries(SwitchId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryReply {
    TotalSize(usize),
    TableSize(usize),
    Entries(Vec<Entry>),
}
