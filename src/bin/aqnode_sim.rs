//! Run the node core against simulated sensors and a logging transport.
//!
//! Usage: `aqnode-sim [config.toml]`. Data and status reports appear as
//! log lines instead of broker publishes.

use aqnode::calibration::FileCalibrationStore;
use aqnode::config::NodeConfig;
use aqnode::node::Node;
use aqnode::sensors::SimulatedSensor;
use aqnode::telemetry::LogTransport;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("aqnode-sim failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> aqnode::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => NodeConfig::from_file(std::path::Path::new(&path))?,
        None => NodeConfig::default(),
    };
    tracing::info!(
        host = %config.transport.host,
        port = config.transport.port,
        "broker target (not dialed, publishes go to the log)"
    );

    let store_path = std::env::temp_dir().join(format!(
        "aqnode-{}-calibration.json",
        config.device.serial
    ));
    let store = FileCalibrationStore::new(store_path);

    let mut node = Node::new(config, LogTransport::new(), SimulatedSensor::new(), store)?;
    node.run()
}
