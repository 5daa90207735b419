use anyhow::Context;
use clap::Parser;
use generator::world::{
    SyntheticImu, SyntheticPosition, SyntheticScan, SyntheticTelemetry, SyntheticWorld,
};
use gui_bridge::bridge::GuiBridge;
use hudcore::prelude::PollingService;
use hudcore::processing::DirectionEstimator;
use hudcore::services::{OrientationService, PositionService, ScannerService, SystemMetricsService};
use hudcore::{AggregationStore, LifecycleManager};
use log::{info, warn};
use sources::{gpsd::GpsdClient, imu::MissingImu, iwlist::IwlistScanner, procfs::ProcfsTelemetry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::{HudConfig, PlannedService, SourceKind};
use workflow::runner::FrameRunner;

mod generator;
mod gui_bridge;
mod sources;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Sensor fusion and RF direction-finding HUD driver")]
struct Args {
    /// Load the HUD config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use seeded synthetic feeds instead of hardware
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    /// Run the frame loop for this many seconds, then shut down
    #[arg(long)]
    duration: Option<f64>,
    /// Serve frames over the local HTTP bridge until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Seed for the synthetic feeds
    #[arg(long)]
    seed: Option<u64>,
}

fn build_services(config: &HudConfig) -> Vec<Box<dyn PollingService>> {
    let world = Arc::new(SyntheticWorld::generate(config.seed));
    let synthetic = config.source == SourceKind::Synthetic;

    config
        .service_plan()
        .into_iter()
        .enumerate()
        .map(|(index, planned)| {
            let seed = config.seed.wrapping_add(index as u64 + 1);
            let service: Box<dyn PollingService> = match planned {
                PlannedService::SystemMetrics if synthetic => {
                    Box::new(SystemMetricsService::new(SyntheticTelemetry::new(seed)))
                }
                PlannedService::SystemMetrics => {
                    Box::new(SystemMetricsService::new(ProcfsTelemetry::new()))
                }
                PlannedService::GpsTracker if synthetic => {
                    Box::new(PositionService::new(SyntheticPosition::new(Arc::clone(&world))))
                }
                PlannedService::GpsTracker => {
                    Box::new(PositionService::new(GpsdClient::new(config.gpsd_address.clone())))
                }
                PlannedService::ImuTracker if synthetic => Box::new(OrientationService::new(
                    SyntheticImu::new(Arc::clone(&world), seed),
                )),
                PlannedService::ImuTracker => Box::new(OrientationService::new(MissingImu)),
                PlannedService::WifiScanner(interface) if synthetic => {
                    Box::new(ScannerService::new(
                        interface,
                        SyntheticScan::new(
                            Arc::clone(&world),
                            config.wifi_right_interface.clone(),
                            seed,
                        ),
                    ))
                }
                PlannedService::WifiScanner(interface) => {
                    Box::new(ScannerService::new(interface, IwlistScanner::new()))
                }
                PlannedService::WifiLocator { left, right } => Box::new(
                    DirectionEstimator::new(left, right)
                        .with_params(config.direction.params)
                        .with_interval(Duration::from_secs_f64(config.direction_interval_secs())),
                ),
            };
            service
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = args.config {
        HudConfig::load(path)?
    } else {
        HudConfig::default()
    };
    config.apply_overrides(args.synthetic, args.seed);
    for warning in config.validate() {
        warn!("config: {}", warning);
    }

    let store = Arc::new(AggregationStore::new());
    let mut manager = LifecycleManager::new(Arc::clone(&store));
    manager.start_all(build_services(&config));

    let gui_bridge = if args.serve {
        GuiBridge::serve(config.bridge_port)
    } else {
        GuiBridge::detached()
    };
    let mut runner = FrameRunner::new(store);
    let frame_period =
        Duration::from_secs_f64(config.frame_period_secs()).max(Duration::from_millis(1));
    let deadline = args
        .duration
        .filter(|secs| *secs > 0.0)
        .map(|secs| Instant::now() + Duration::from_secs_f64(secs));

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for the frame loop")?;

    gui_bridge.publish_status("HUD running (Ctrl+C to stop)...");
    let interrupted = runtime.block_on(async {
        let shutdown = signal::ctrl_c();
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(frame_period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let (snapshot, scene) = runner.next_frame(manager.status());
                    gui_bridge.publish(snapshot, scene);
                    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                        return Ok::<bool, anyhow::Error>(false);
                    }
                }
                result = &mut shutdown => {
                    result.context("awaiting Ctrl+C to exit")?;
                    return Ok(true);
                }
            }
        }
    })?;

    manager.stop_all();
    let scene = gui_bridge.latest_scene();
    println!(
        "Run complete -> frames {}, devices {}, heading bar stacks {}, compass stacks {}",
        runner.frame(),
        scene.device_count,
        scene.heading_bar.len(),
        scene.compass.len()
    );
    for status in manager.status() {
        info!(
            "{}: {:?}, cycles {}, errors {}",
            status.name, status.state, status.metrics.cycles, status.metrics.errors
        );
    }

    if args.serve && !interrupted {
        gui_bridge.publish_status("HTTP bridge serving last frame (Ctrl+C to stop)...");
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
