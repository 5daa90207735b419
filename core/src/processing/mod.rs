pub mod classify;
pub mod cluster;
pub mod direction;
pub mod pathloss;
pub mod scan;

pub use classify::{classify_device, color_id, palette_color};
pub use cluster::{cluster_layout, Cluster, LayoutEntity};
pub use direction::{estimate_bearing, DirectionEstimator, DirectionParams};
pub use pathloss::{path_loss_distance, triangulated_distance};
pub use scan::{normalize_scan, parse_iwlist, RawSignal, ScanEntry};
