//! 网络（指令执行器）
//!
//! 持有所有交换机与控制器，把控制器指令翻译成流表变更，并回答表状态查询。

use tracing::{debug, trace, warn};

use super::error::NetworkError;
use super::id::SwitchId;
use super::instruction::{Instruction, Query, QueryReply};
use super::switch::{Switch, SwitchKind, TableCapacity};
use crate::ctrl::Controller;
use crate::topo::Topology;

pub struct Network {
    switches: Vec<Switch>,
    controller: Controller,
}

impl Network {
    /// 每个拓扑节点一台交换机；`software` 中的节点为软件交换机。
    pub fn new(
        topo: &Topology,
        software: &[SwitchId],
        capacity: TableCapacity,
        controller: Controller,
    ) -> Self {
        let switches = topo
            .switches()
            .map(|id| {
                let kind = if software.contains(&id) {
                    SwitchKind::Software
                } else {
                    SwitchKind::Hardware
                };
                Switch::new(id, kind, &capacity)
            })
            .collect();
        Self {
            switches,
            controller,
        }
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    pub fn switch(&self, id: SwitchId) -> Result<&Switch, NetworkError> {
        self.switches
            .get(id.0)
            .ok_or(NetworkError::UnknownSwitch(id))
    }

    pub fn switch_mut(&mut self, id: SwitchId) -> Result<&mut Switch, NetworkError> {
        self.switches
            .get_mut(id.0)
            .ok_or(NetworkError::UnknownSwitch(id))
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn total_entries(&self) -> usize {
        self.switches.iter().map(Switch::table_size).sum()
    }

    /// 顺序执行一批指令，返回其中 QUERY 的应答（按出现顺序）。
    ///
    /// 删除不存在的表项只记录告警并跳过。
    #[tracing::instrument(skip_all, fields(batch = batch.len()))]
    pub fn apply(&mut self, batch: Vec<Instruction>) -> Result<Vec<QueryReply>, NetworkError> {
        let mut replies = Vec::new();
        for inst in batch {
            match inst {
                Instruction::Add { switch, entry } => {
                    self.switch_mut(switch)?.add_entry(entry);
                }
                Instruction::Delete { switch, entry } => {
                    match self.switch_mut(switch)?.delete_entry(&entry) {
                        Ok(_) => trace!(%switch, "删除表项"),
                        Err(err) => warn!(%err, "删除不存在的表项，忽略"),
                    }
                }
                Instruction::Query(q) => replies.push(self.query(q)?),
            }
        }
        debug!(replies = replies.len(), "指令批执行完成");
        Ok(replies)
    }

    /// 计数类查询（`TotalSize` / `TableSize`）；其他查询返回 `UnexpectedReply`。
    pub fn query_count(&self, q: Query) -> Result<usize, NetworkError> {
        match self.query(q)? {
            QueryReply::TotalSize(n) | QueryReply::TableSize(n) => Ok(n),
            QueryReply::Entries(_) => Err(NetworkError::UnexpectedReply(q)),
        }
    }

    /// 只读查询
    pub fn query(&self, q: Query) -> Result<QueryReply, NetworkError> {
        Ok(match q {
            Query::TotalSize => QueryReply::TotalSize(self.total_entries()),
            Query::TableSize(id) => QueryReply::TableSize(self.switch(id)?.table_size()),
            Query::Entries(id) => {
                QueryReply::Entries(self.switch(id)?.entries().into_iter().cloned().collect())
            }
        })
    }
}
