use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ConfigError;
use super::simulator::{SimConfig, Simulator};
use super::time::SimTime;
use crate::ctrl::{Controller, PacketInMode, Ruleset, RulesetSpec};
use crate::net::{
    DelayModel, DelayParams, FiveTuple, Network, Packet, REFERENCE_PKT_BYTES, SwitchId,
    TableCapacity,
};
use crate::predict::{HeuristicParams, PredictorChoice};
use crate::topo::{Builtin, Topology};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<ScenarioMeta>,
    pub topology: TopologySpec,
    /// 存在时覆盖内置拓扑的软件交换机集合
    #[serde(default)]
    pub software_switches: Option<Vec<usize>>,
    #[serde(default)]
    pub defaults: Option<ScenarioDefaults>,
    #[serde(default)]
    pub ruleset: Option<RulesetSpec>,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySpec {
    Adjacency { adj: Vec<Vec<usize>> },
    Builtin { name: Builtin },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioDefaults {
    #[serde(default)]
    pub mode: Option<PacketInMode>,
    #[serde(default)]
    pub predictor: Option<PredictorChoice>,
    #[serde(default)]
    pub check_interval: Option<u64>,
    #[serde(default)]
    pub update_interval_ms: Option<u64>,
    #[serde(default)]
    pub default_timeout_ms: Option<u64>,
    #[serde(default)]
    pub hardware_capacity: Option<usize>,
    #[serde(default)]
    pub software_capacity: Option<usize>,
    #[serde(default)]
    pub hardware_fwd_us: Option<u64>,
    #[serde(default)]
    pub software_fwd_us: Option<u64>,
    #[serde(default)]
    pub controller_delay_us: Option<u64>,
    /// 启发式预测器的上限
    #[serde(default)]
    pub max_timeout_ms: Option<u64>,
}

/// 一条流：`packets` 个共享五元组的连续数据包
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSpec {
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    #[serde(default)]
    pub src_port: u16,
    #[serde(default)]
    pub dst_port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: u8,
    #[serde(default)]
    pub size_bytes: Option<u32>,
    #[serde(default)]
    pub packets: Option<u64>,
    /// 显式指定端点；否则取地址第三个字节
    #[serde(default)]
    pub src: Option<usize>,
    #[serde(default)]
    pub dst: Option<usize>,
}

fn default_protocol() -> u8 {
    6
}

/// 命令行对场景文件的覆盖项
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub mode: Option<PacketInMode>,
    pub predictor: Option<PredictorChoice>,
    pub check_interval: Option<u64>,
}

/// 启动一次运行所需的全部对象
pub struct Run {
    pub net: Network,
    pub sim: Simulator,
    pub packets: Vec<Packet>,
    pub mode: PacketInMode,
    pub predictor: PredictorChoice,
}

impl ScenarioSpec {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let spec: ScenarioSpec = serde_json::from_str(raw)?;
        if spec.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema(spec.schema_version));
        }
        Ok(spec)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn topology(&self) -> Result<(Topology, Vec<SwitchId>), ConfigError> {
        let (topo, builtin_soft) = match &self.topology {
            TopologySpec::Adjacency { adj } => (Topology::from_adjacency(adj.clone())?, Vec::new()),
            TopologySpec::Builtin { name } => (name.build()?, name.software_switches()),
        };
        let software = match &self.software_switches {
            Some(labels) => labels
                .iter()
                .map(|&l| {
                    if l < topo.len() {
                        Ok(SwitchId(l))
                    } else {
                        Err(ConfigError::InvalidTopology(format!(
                            "software switch {l} is outside the topology"
                        )))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => builtin_soft,
        };
        Ok((topo, software))
    }

    /// 按文件顺序把流展开为数据包序列
    pub fn packets(&self) -> Vec<Packet> {
        let mut out = Vec::new();
        for flow in &self.flows {
            let tuple = FiveTuple {
                src_ip: flow.src_ip,
                dst_ip: flow.dst_ip,
                src_port: flow.src_port,
                dst_port: flow.dst_port,
                protocol: flow.protocol,
            };
            let size = flow.size_bytes.unwrap_or(REFERENCE_PKT_BYTES);
            for _ in 0..flow.packets.unwrap_or(1) {
                let id = out.len() as u64;
                let mut pkt = Packet::from_tuple(id, tuple, size);
                if let Some(src) = flow.src {
                    pkt.src = SwitchId(src);
                }
                if let Some(dst) = flow.dst {
                    pkt.dst = SwitchId(dst);
                }
                out.push(pkt);
            }
        }
        out
    }

    /// 构建网络、控制器与仿真器；所有配置错误都在处理第一个包之前报告。
    pub fn build(&self, overrides: Overrides) -> Result<Run, ConfigError> {
        let d = self.defaults.clone().unwrap_or_default();
        let mode = overrides.mode.or(d.mode).unwrap_or(PacketInMode::Default);
        let predictor = overrides
            .predictor
            .or(d.predictor)
            .unwrap_or(PredictorChoice::Fixed);

        let (topo, software) = self.topology()?;

        let base = DelayParams::default();
        let params = DelayParams {
            link_ns_per_byte: base.link_ns_per_byte,
            hardware_fwd: d.hardware_fwd_us.map_or(base.hardware_fwd, SimTime::from_micros),
            software_fwd: d.software_fwd_us.map_or(base.software_fwd, SimTime::from_micros),
            controller: d.controller_delay_us.map_or(base.controller, SimTime::from_micros),
        };
        let delay = DelayModel::new(params, software.iter().copied());

        let default_timeout = d
            .default_timeout_ms
            .map_or(SimTime::from_secs(5), SimTime::from_millis);
        let mut heuristic = HeuristicParams::default();
        if let Some(ms) = d.max_timeout_ms {
            heuristic.ceiling_max = SimTime::from_millis(ms);
        }

        let mut controller = Controller::new(
            topo.clone(),
            delay,
            mode,
            predictor.build(default_timeout, heuristic),
            default_timeout,
        );
        match &self.ruleset {
            Some(spec) => controller = controller.with_rules(Box::new(Ruleset::from_spec(spec)?)),
            None if mode.needs_ruleset() => return Err(ConfigError::RulesetRequired(mode)),
            None => {}
        }

        let base_cap = TableCapacity::default();
        let capacity = TableCapacity {
            hardware: d.hardware_capacity.unwrap_or(base_cap.hardware),
            software: d.software_capacity.unwrap_or(base_cap.software),
        };
        let net = Network::new(&topo, &software, capacity, controller);

        let cfg = SimConfig {
            check_interval: overrides
                .check_interval
                .or(d.check_interval)
                .unwrap_or(SimConfig::default().check_interval),
            update_interval: d
                .update_interval_ms
                .map_or(SimConfig::default().update_interval, SimTime::from_millis),
            ..SimConfig::default()
        };

        let packets = self.packets();
        if let Some(pkt) = packets
            .iter()
            .find(|p| p.src.0 >= topo.len() || p.dst.0 >= topo.len())
        {
            return Err(ConfigError::InvalidFlow(format!(
                "{} maps to {} -> {}, but only {} switches exist",
                pkt.tuple,
                pkt.src,
                pkt.dst,
                topo.len()
            )));
        }
        info!(
            switches = topo.len(),
            software = software.len(),
            %mode,
            %predictor,
            packets = packets.len(),
            "场景构建完成"
        );

        Ok(Run {
            net,
            sim: Simulator::new(cfg),
            packets,
            mode,
            predictor,
        })
    }
}
