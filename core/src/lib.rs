//! Sensor aggregation and dual-receiver direction finding for the HUD platform.
//!
//! Independent polling services write the latest reading of each channel into
//! one [`AggregationStore`]; the frame loop pulls a coherent [`Snapshot`] per
//! frame. [`DirectionEstimator`] correlates two radio interfaces into bearings
//! and [`cluster_layout`] groups angularly crowded indicators for display.

pub mod channels;
pub mod lifecycle;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod services;
pub mod store;
pub mod telemetry;

pub use lifecycle::{LifecycleManager, ServiceState};
pub use prelude::{PollingService, ServiceError, ServiceResult};
pub use processing::{cluster_layout, DirectionEstimator};
pub use store::{AggregationStore, Snapshot};
