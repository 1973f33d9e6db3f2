use clap::Parser;
use ofsim_rs::ctrl::PacketInMode;
use ofsim_rs::net::FiveTuple;
use ofsim_rs::predict::PredictorChoice;
use ofsim_rs::sim::{Checkpoint, MetricsSink, Overrides, Recorder, ScenarioSpec, SimTime};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "ofsim",
    about = "Run a scenario.json on the OpenFlow control-plane simulator"
)]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,

    /// Override packet-in mode: default, spath, hard, idle or hybrid
    #[arg(long)]
    mode: Option<String>,

    /// Override timeout predictor: fixed or simple
    #[arg(long)]
    predictor: Option<String>,

    /// Record a checkpoint every N distinct flows
    #[arg(long)]
    check_interval: Option<u64>,

    /// Stop after this many packets
    #[arg(long)]
    until_packets: Option<u64>,

    /// Also write checkpoint records to this JSON file
    #[arg(long)]
    checkpoints_json: Option<PathBuf>,
}

/// 边运行边打印检查点
#[derive(Default)]
struct StdoutSink {
    inner: Recorder,
}

impl MetricsSink for StdoutSink {
    fn on_checkpoint(&mut self, cp: &Checkpoint) {
        println!(
            "checkpoint flows={} elapsed_us={:.3} entries={} overflow={} packet_ins={} installs={} packets={}",
            cp.flows,
            cp.elapsed.as_micros_f64(),
            cp.total_entries,
            cp.total_overflow,
            cp.total_packet_ins,
            cp.total_installs,
            cp.total_packets
        );
        self.inner.on_checkpoint(cp);
    }

    fn on_packet_done(&mut self, flow: FiveTuple, delay: SimTime) {
        self.inner.on_packet_done(flow, delay);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let overrides = Overrides {
        mode: args
            .mode
            .as_deref()
            .map(str::parse::<PacketInMode>)
            .transpose()?,
        predictor: args
            .predictor
            .as_deref()
            .map(str::parse::<PredictorChoice>)
            .transpose()?,
        check_interval: args.check_interval,
    };

    let spec = ScenarioSpec::load(&args.scenario)?;
    let mut run = spec.build(overrides)?;

    let limit = args.until_packets.map_or(usize::MAX, |n| n as usize);
    let packets = run.packets.drain(..).take(limit).collect::<Vec<_>>();

    let mut sink = StdoutSink::default();
    let stats = run.sim.run(&mut run.net, packets, &mut sink)?;

    println!(
        "done @ {:.3}us mode={} predictor={} packets={} flows={} packet_ins={} overflowed={} entries={} installs={}",
        run.sim.now().as_micros_f64(),
        run.mode,
        run.predictor,
        stats.packets,
        stats.flows,
        stats.packet_ins,
        stats.overflowed,
        run.net.total_entries(),
        run.net.controller().total_installs()
    );

    if let Some(path) = &args.checkpoints_json {
        let json = serde_json::to_string_pretty(&sink.inner.checkpoints)?;
        fs::write(path, json)?;
        eprintln!("wrote checkpoints to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
