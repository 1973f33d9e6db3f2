//! 数据包类型
//!
//! 数据包由外部流量源产生；核心只读取五元组、大小与目的地，
//! 传输过程中只会修改 `path` 与 `tag`。

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::id::{Hop, SwitchId};

/// 参考包大小：最大以太网帧
pub const REFERENCE_PKT_BYTES: u32 = 1500;

/// 五元组，同时也是流的稳定标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FiveTuple {
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}:{}/{}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port, self.protocol
        )
    }
}

/// 仿真数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub tuple: FiveTuple,
    pub size_bytes: u32,
    pub src: SwitchId,
    pub dst: SwitchId,
    /// 实际经过的节点序列（含控制器绕行），用于计算时延
    pub path: Vec<Hop>,
    pub tag: Option<u64>,
}

impl Packet {
    /// 由五元组构造：`*.*.k.*` 地址归属交换机 `k`。
    pub fn from_tuple(id: u64, tuple: FiveTuple, size_bytes: u32) -> Self {
        let src = SwitchId(tuple.src_ip.octets()[2] as usize);
        let dst = SwitchId(tuple.dst_ip.octets()[2] as usize);
        Self::with_endpoints(id, tuple, size_bytes, src, dst)
    }

    /// 显式指定源/目的交换机。
    pub fn with_endpoints(
        id: u64,
        tuple: FiveTuple,
        size_bytes: u32,
        src: SwitchId,
        dst: SwitchId,
    ) -> Self {
        Self {
            id,
            tuple,
            size_bytes,
            src,
            dst,
            path: Vec::new(),
            tag: None,
        }
    }

    /// 流标识
    pub fn flow_key(&self) -> FiveTuple {
        self.tuple
    }

    pub fn dst_ip(&self) -> Ipv4Addr {
        self.tuple.dst_ip
    }
}
