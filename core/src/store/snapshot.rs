use crate::channels::position::best_heading;
use crate::channels::{
    DirectionEstimate, OrientationReading, PositionReading, RfDevice, SystemTelemetry,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Copy of every channel taken under a single store lock acquisition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Count of store writes applied before this copy was taken.
    pub revision: u64,
    pub position: PositionReading,
    pub orientation: OrientationReading,
    pub telemetry: SystemTelemetry,
    pub rf_devices: Vec<RfDevice>,
    pub rf_devices_by_interface: BTreeMap<String, Vec<RfDevice>>,
    pub direction_estimates: BTreeMap<String, DirectionEstimate>,
}

impl Snapshot {
    pub fn heading(&self) -> Option<f64> {
        best_heading(&self.orientation, &self.position)
    }

    pub fn estimate_for(&self, device_id: &str) -> Option<&DirectionEstimate> {
        self.direction_estimates.get(device_id)
    }
}
