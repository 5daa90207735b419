//! Thread-safe latest-value store shared by every producer and the frame loop.
//!
//! All channels sit behind one mutex. Writers copy in, readers copy out, and
//! nothing blocks while holding the guard, so a snapshot is always a single
//! serialization point across channels.

pub mod snapshot;

pub use snapshot::Snapshot;

use crate::channels::position::best_heading;
use crate::channels::{
    DirectionEstimate, OrientationReading, PositionReading, RfDevice, SystemTelemetry,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Channels {
    revision: u64,
    position: PositionReading,
    orientation: OrientationReading,
    telemetry: SystemTelemetry,
    rf_devices: Vec<RfDevice>,
    rf_by_interface: BTreeMap<String, Vec<RfDevice>>,
    directions: BTreeMap<String, DirectionEstimate>,
}

/// Inputs for one direction-finding cycle, read under one lock.
#[derive(Debug, Clone, Default)]
pub struct CorrelationInputs {
    pub left: Vec<RfDevice>,
    pub right: Vec<RfDevice>,
    pub heading: Option<f64>,
}

#[derive(Debug, Default)]
pub struct AggregationStore {
    inner: Mutex<Channels>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A writer that panicked mid-copy cannot leave a channel half-written:
    // every write is a single assignment, so the data behind a poisoned lock
    // is still coherent.
    fn channels(&self) -> MutexGuard<'_, Channels> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the position channel.
    ///
    /// The incoming heading is dropped when the orientation channel already
    /// holds one, so a slower satellite fix never shadows the inertial heading.
    pub fn set_position(&self, mut reading: PositionReading) {
        let mut channels = self.channels();
        if channels.orientation.heading_deg.is_some() {
            reading.heading_deg = None;
        }
        channels.position = reading;
        channels.revision += 1;
    }

    /// Replaces the orientation channel. A present heading retires any
    /// position heading already stored.
    pub fn set_orientation(&self, reading: OrientationReading) {
        let mut channels = self.channels();
        if reading.heading_deg.is_some() {
            channels.position.heading_deg = None;
        }
        channels.orientation = reading;
        channels.revision += 1;
    }

    pub fn set_telemetry(&self, telemetry: SystemTelemetry) {
        let mut channels = self.channels();
        channels.telemetry = telemetry;
        channels.revision += 1;
    }

    /// Replaces the scan results for `interface` and rebuilds the merged list.
    ///
    /// In the merged list the interface just written wins for any id it
    /// reports; devices only other interfaces still see are kept after it.
    /// Hidden networks have no id to match on and are always kept.
    /// Without an interface the merged list is replaced outright.
    pub fn set_rf_devices(&self, devices: Vec<RfDevice>, interface: Option<&str>) {
        let mut channels = self.channels();
        match interface {
            Some(name) => {
                let mut merged = devices.clone();
                for (other, list) in channels.rf_by_interface.iter() {
                    if other == name {
                        continue;
                    }
                    for device in list {
                        if device.id.is_empty() || !merged.iter().any(|seen| seen.id == device.id) {
                            merged.push(device.clone());
                        }
                    }
                }
                channels.rf_by_interface.insert(name.to_string(), devices);
                channels.rf_devices = merged;
            }
            None => channels.rf_devices = devices,
        }
        channels.revision += 1;
    }

    pub fn set_direction_estimate(&self, device_id: &str, bearing_deg: f64, confidence: f64) {
        let estimate = DirectionEstimate::new(device_id, bearing_deg, confidence);
        let mut channels = self.channels();
        channels.directions.insert(device_id.to_string(), estimate);
        channels.revision += 1;
    }

    /// Overwrites the single-interface distance of `device_id` in the merged
    /// list. Returns whether any entry was updated.
    pub fn set_triangulated_distance(&self, device_id: &str, distance_m: f64) -> bool {
        if device_id.is_empty() {
            return false;
        }
        let mut channels = self.channels();
        let mut updated = false;
        for device in channels.rf_devices.iter_mut().filter(|d| d.id == device_id) {
            device.distance_m = distance_m.max(0.0);
            updated = true;
        }
        if updated {
            channels.revision += 1;
        }
        updated
    }

    pub fn position(&self) -> PositionReading {
        self.channels().position
    }

    pub fn orientation(&self) -> OrientationReading {
        self.channels().orientation
    }

    pub fn telemetry(&self) -> SystemTelemetry {
        self.channels().telemetry
    }

    /// Orientation heading if present, else position heading.
    pub fn heading(&self) -> Option<f64> {
        let channels = self.channels();
        best_heading(&channels.orientation, &channels.position)
    }

    /// Scan results of one interface, or the merged list when `None`.
    pub fn rf_devices(&self, interface: Option<&str>) -> Vec<RfDevice> {
        let channels = self.channels();
        match interface {
            Some(name) => channels
                .rf_by_interface
                .get(name)
                .cloned()
                .unwrap_or_default(),
            None => channels.rf_devices.clone(),
        }
    }

    pub fn direction_estimates(&self) -> BTreeMap<String, DirectionEstimate> {
        self.channels().directions.clone()
    }

    pub fn correlation_inputs(&self, left: &str, right: &str) -> CorrelationInputs {
        let channels = self.channels();
        CorrelationInputs {
            left: channels.rf_by_interface.get(left).cloned().unwrap_or_default(),
            right: channels.rf_by_interface.get(right).cloned().unwrap_or_default(),
            heading: best_heading(&channels.orientation, &channels.position),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let channels = self.channels();
        Snapshot {
            revision: channels.revision,
            position: channels.position,
            orientation: channels.orientation,
            telemetry: channels.telemetry,
            rf_devices: channels.rf_devices.clone(),
            rf_devices_by_interface: channels.rf_by_interface.clone(),
            direction_estimates: channels.directions.clone(),
        }
    }
}
