use hudcore::channels::{DeviceType, PositionReading, SystemTelemetry};
use hudcore::lifecycle::ServiceStatus;
use serde::Serialize;

/// One directional device indicator, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceMarker {
    pub id: String,
    pub device_type: DeviceType,
    pub color: [u8; 3],
    pub signal_dbm: f64,
    pub bearing_deg: f64,
    /// Offset from the current heading; absent without a heading.
    pub relative_deg: Option<f64>,
    pub confidence: f64,
    pub distance_label: Option<String>,
}

/// Markers drawn stacked at one anchor, strongest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStack {
    pub anchor_deg: f64,
    pub markers: Vec<DeviceMarker>,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HudScene {
    pub frame: u64,
    pub revision: u64,
    pub heading_deg: Option<f64>,
    pub position: PositionReading,
    pub telemetry: SystemTelemetry,
    pub device_count: usize,
    pub heading_bar: Vec<MarkerStack>,
    pub compass: Vec<MarkerStack>,
    pub services: Vec<ServiceStatus>,
}

/// `~12m` below one kilometre, `~1.2km` above. Non-positive distances have
/// no label.
pub fn distance_label(distance_m: f64) -> Option<String> {
    if distance_m.is_nan() || distance_m <= 0.0 {
        return None;
    }
    if distance_m < 1000.0 {
        Some(format!("~{}m", distance_m.trunc() as u64))
    } else {
        Some(format!("~{:.1}km", distance_m / 1000.0))
    }
}
