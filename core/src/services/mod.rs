//! Polling workers, one per sensor channel.
//!
//! Each service owns a source (the hardware or feed it reads) and writes the
//! latest value into the store once per cycle. Sources are traits so the
//! binary decides whether a channel reads real hardware or a synthetic feed.

pub mod orientation;
pub mod position;
pub mod scanner;
pub mod sources;
pub mod system;

pub use orientation::OrientationService;
pub use position::PositionService;
pub use scanner::ScannerService;
pub use sources::{
    OrientationSample, OrientationSource, PositionSource, ScanSource, TelemetrySource,
};
pub use system::SystemMetricsService;
