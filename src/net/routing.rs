//! 最短路径索引
//!
//! 为每个 (src, dst) 预计算所有最小跳数路径，并按仿真传输时延升序排列。
//! 控制器总是选用第 0 条（时延最小）路径。
//!
//! 搜索是单位权重的 Dijkstra：最小堆以 (距离, 发现序号) 为键，
//! 不保留单一前驱，而是累积所有同距离的前驱路径。

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::id::{Hop, SwitchId};
use super::packet::REFERENCE_PKT_BYTES;
use crate::sim::SimTime;
use crate::topo::Topology;

/// 交换机序列，跳数 = 长度 - 1
pub type Path = Vec<SwitchId>;

/// 时延常数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayParams {
    /// 链路速率（ns/B）；1 Gbps = 8
    pub link_ns_per_byte: u64,
    pub hardware_fwd: SimTime,
    pub software_fwd: SimTime,
    pub controller: SimTime,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            link_ns_per_byte: 8,
            hardware_fwd: SimTime::from_micros(5),
            software_fwd: SimTime::from_micros(35),
            controller: SimTime::from_micros(4000),
        }
    }
}

/// 路径时延模型：`link * size * hops + Σ 每跳转发时延`
#[derive(Debug, Clone, Default)]
pub struct DelayModel {
    pub params: DelayParams,
    software: BTreeSet<SwitchId>,
}

impl DelayModel {
    pub fn new(params: DelayParams, software: impl IntoIterator<Item = SwitchId>) -> Self {
        Self {
            params,
            software: software.into_iter().collect(),
        }
    }

    pub fn is_software(&self, id: SwitchId) -> bool {
        self.software.contains(&id)
    }

    fn hop_delay(&self, hop: Hop) -> SimTime {
        match hop {
            Hop::Controller => self.params.controller,
            Hop::Switch(id) if self.is_software(id) => self.params.software_fwd,
            Hop::Switch(_) | Hop::Local => self.params.hardware_fwd,
        }
    }

    /// 实际经过路径（可含控制器哨兵）的时延
    pub fn delay(&self, path: &[Hop], size_bytes: u32) -> SimTime {
        let hops = path.len().saturating_sub(1) as u64;
        let link = self
            .params
            .link_ns_per_byte
            .saturating_mul(size_bytes as u64)
            .saturating_mul(hops);
        path.iter()
            .fold(SimTime(link), |acc, &hop| acc.saturating_add(self.hop_delay(hop)))
    }

    pub fn switch_path_delay(&self, path: &[SwitchId], size_bytes: u32) -> SimTime {
        let hops: Vec<Hop> = path.iter().copied().map(Hop::Switch).collect();
        self.delay(&hops, size_bytes)
    }
}

/// (src, dst) -> 按时延升序的最短路径列表。构造后只读。
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    paths: Vec<Vec<Vec<Path>>>,
}

impl PathIndex {
    /// 对每个源节点做一次搜索，跳过 `excluded` 中的节点。
    #[tracing::instrument(skip_all, fields(switches = topo.len(), excluded = excluded.len()))]
    pub fn compute(topo: &Topology, delay: &DelayModel, excluded: &[SwitchId]) -> Self {
        let excluded: BTreeSet<SwitchId> = excluded.iter().copied().collect();
        let paths = (0..topo.len())
            .map(|src| {
                let mut per_dst = shortest_paths_from(topo, SwitchId(src), &excluded);
                for dst_paths in &mut per_dst {
                    // 稳定排序：同时延保持发现顺序
                    dst_paths.sort_by_key(|p| delay.switch_path_delay(p, REFERENCE_PKT_BYTES));
                }
                per_dst
            })
            .collect();
        debug!("最短路径索引构建完成");
        Self { paths }
    }

    pub fn paths(&self, src: SwitchId, dst: SwitchId) -> &[Path] {
        self.paths
            .get(src.0)
            .and_then(|row| row.get(dst.0))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 时延最小的路径
    pub fn best(&self, src: SwitchId, dst: SwitchId) -> Option<&Path> {
        self.paths(src, dst).first()
    }
}

fn shortest_paths_from(topo: &Topology, src: SwitchId, excluded: &BTreeSet<SwitchId>) -> Vec<Vec<Path>> {
    let n = topo.len();
    let mut dist: Vec<Option<u32>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut paths: Vec<Vec<Path>> = vec![Vec::new(); n];
    let mut heap: BinaryHeap<Reverse<(u32, u64, usize)>> = BinaryHeap::new();
    let mut seq = 0u64;

    dist[src.0] = Some(0);
    paths[src.0] = vec![vec![src]];
    heap.push(Reverse((0, seq, src.0)));

    while let Some(Reverse((d, _, u))) = heap.pop() {
        if visited[u] {
            continue;
        }
        visited[u] = true;
        let base = paths[u].clone();

        for &v in topo.neighbors(SwitchId(u)) {
            if excluded.contains(&v) || visited[v.0] {
                continue;
            }
            let nd = d + 1;
            let extended = base.iter().map(|p| {
                let mut p = p.clone();
                p.push(v);
                p
            });
            match dist[v.0] {
                Some(known) if nd > known => {}
                Some(known) if nd == known => paths[v.0].extend(extended),
                _ => {
                    dist[v.0] = Some(nd);
                    paths[v.0] = extended.collect();
                    seq = seq.wrapping_add(1);
                    heap.push(Reverse((nd, seq, v.0)));
                }
            }
        }
    }

    paths
}
