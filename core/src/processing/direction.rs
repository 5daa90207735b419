//! Dual-receiver direction finding.
//!
//! Two interfaces mounted left and right of the heading axis hear the same
//! emitter at slightly different strengths. The differential is mapped
//! linearly onto an angular offset from the current heading, and the two
//! single-receiver path-loss ranges are blended into one distance.

use crate::channels::RfDevice;
use crate::math::angles::normalize_360;
use crate::prelude::{PollingService, ServiceResult};
use crate::processing::pathloss::triangulated_distance;
use crate::store::{AggregationStore, CorrelationInputs};
use crate::telemetry::LogManager;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const SERVICE_NAME: &str = "WiFiLocator";

/// Tunable constants of the differential model. They are empirical, not
/// derived from antenna geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionParams {
    /// Differential at which the offset saturates.
    pub max_differential_dbm: f64,
    /// Largest offset from heading the model will report.
    pub max_offset_deg: f64,
    /// Differential that yields full confidence.
    pub confidence_scale_dbm: f64,
}

impl Default for DirectionParams {
    fn default() -> Self {
        Self {
            max_differential_dbm: 20.0,
            max_offset_deg: 45.0,
            confidence_scale_dbm: 10.0,
        }
    }
}

/// Intermediate and final values of one bearing computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BearingEstimate {
    pub differential_dbm: f64,
    pub angle_offset_deg: f64,
    pub bearing_deg: f64,
    pub confidence: f64,
}

/// Bearing of an emitter given its left/right readings and the heading.
///
/// A stronger left reading puts the emitter left of the heading, so the
/// offset is subtracted. Equal readings give zero confidence: dead ahead and
/// unknown are indistinguishable.
pub fn estimate_bearing(
    left_dbm: f64,
    right_dbm: f64,
    heading_deg: f64,
    params: &DirectionParams,
) -> BearingEstimate {
    let differential_dbm = left_dbm - right_dbm;
    let max_offset = params.max_offset_deg.abs();
    let angle_offset_deg = if params.max_differential_dbm > 0.0 {
        (differential_dbm / params.max_differential_dbm * max_offset).clamp(-max_offset, max_offset)
    } else {
        0.0
    };
    let confidence = if params.confidence_scale_dbm > 0.0 {
        (differential_dbm.abs() / params.confidence_scale_dbm).clamp(0.0, 1.0)
    } else {
        0.0
    };

    BearingEstimate {
        differential_dbm,
        angle_offset_deg,
        bearing_deg: normalize_360(heading_deg - angle_offset_deg),
        confidence,
    }
}

/// Result for one emitter heard on both interfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub device_id: String,
    pub bearing: BearingEstimate,
    pub distance_m: Option<f64>,
}

/// What one estimator cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    NoHeading,
    Estimated { devices: usize },
}

fn index_by_id(devices: &[RfDevice]) -> HashMap<&str, &RfDevice> {
    let mut index = HashMap::with_capacity(devices.len());
    for device in devices.iter().filter(|d| !d.id.is_empty()) {
        index.entry(device.id.as_str()).or_insert(device);
    }
    index
}

/// Correlates two interfaces' scans and writes bearings and distances back.
pub struct DirectionEstimator {
    left_interface: String,
    right_interface: String,
    params: DirectionParams,
    interval: Duration,
    logger: LogManager,
}

impl DirectionEstimator {
    pub fn new(left_interface: impl Into<String>, right_interface: impl Into<String>) -> Self {
        Self {
            left_interface: left_interface.into(),
            right_interface: right_interface.into(),
            params: DirectionParams::default(),
            interval: DEFAULT_INTERVAL,
            logger: LogManager::new(SERVICE_NAME),
        }
    }

    pub fn with_params(mut self, params: DirectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn params(&self) -> &DirectionParams {
        &self.params
    }

    /// Pure half of a cycle. Only ids present on both sides correlate;
    /// hidden (empty) ids never do. Yields nothing without a heading.
    pub fn correlate(&self, inputs: &CorrelationInputs) -> Vec<Correlation> {
        let heading = match inputs.heading {
            Some(heading) => heading,
            None => return Vec::new(),
        };

        let right_index = index_by_id(&inputs.right);
        let mut seen = HashSet::new();
        let mut correlations = Vec::new();

        for left in inputs.left.iter().filter(|d| !d.id.is_empty()) {
            if !seen.insert(left.id.as_str()) {
                continue;
            }
            let right = match right_index.get(left.id.as_str()) {
                Some(device) => device,
                None => continue,
            };

            let bearing = estimate_bearing(left.signal_dbm, right.signal_dbm, heading, &self.params);
            let distance_m = triangulated_distance(
                left.signal_dbm,
                right.signal_dbm,
                left.band,
                left.device_type,
            );
            correlations.push(Correlation {
                device_id: left.id.clone(),
                bearing,
                distance_m,
            });
        }
        correlations
    }

    /// Reads both interfaces and the heading under one store lock, computes
    /// outside it, then writes each result back. Previously stored estimates
    /// are left in place when no heading is available.
    pub fn run_cycle(&self, store: &AggregationStore) -> CycleOutcome {
        let inputs = store.correlation_inputs(&self.left_interface, &self.right_interface);
        if inputs.heading.is_none() {
            self.logger
                .detail("No heading data available for direction estimation");
            return CycleOutcome::NoHeading;
        }

        let correlations = self.correlate(&inputs);
        for correlation in &correlations {
            store.set_direction_estimate(
                &correlation.device_id,
                correlation.bearing.bearing_deg,
                correlation.bearing.confidence,
            );
            self.logger.detail(&format!(
                "Direction estimate for {}: {:.1} deg (confidence: {:.2})",
                correlation.device_id, correlation.bearing.bearing_deg, correlation.bearing.confidence
            ));

            if let Some(distance) = correlation.distance_m {
                store.set_triangulated_distance(&correlation.device_id, distance);
                self.logger.detail(&format!(
                    "Triangulated distance for {}: {:.1}m",
                    correlation.device_id, distance
                ));
            }
        }

        CycleOutcome::Estimated {
            devices: correlations.len(),
        }
    }
}

impl PollingService for DirectionEstimator {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn initialize(&mut self) -> ServiceResult<()> {
        self.logger.record(&format!(
            "Direction finding on left: {}, right: {}",
            self.left_interface, self.right_interface
        ));
        Ok(())
    }

    fn poll(&mut self, store: &AggregationStore) -> ServiceResult<()> {
        self.run_cycle(store);
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{Band, DeviceType, OrientationReading, PositionReading};

    fn device(id: &str, signal_dbm: f64) -> RfDevice {
        RfDevice::new(id, signal_dbm, Some(6), Band::Ghz2_4, "Secured", DeviceType::Router, 0.0, 0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn five_db_left_advantage_turns_bearing_left() {
        let estimate = estimate_bearing(-50.0, -55.0, 90.0, &DirectionParams::default());
        assert!(close(estimate.differential_dbm, 5.0));
        assert!(close(estimate.angle_offset_deg, 11.25));
        assert!(close(estimate.bearing_deg, 78.75));
        assert!(close(estimate.confidence, 0.5));
    }

    #[test]
    fn equal_readings_point_at_heading_with_no_confidence() {
        let estimate = estimate_bearing(-50.0, -50.0, 90.0, &DirectionParams::default());
        assert_eq!(estimate.angle_offset_deg, 0.0);
        assert_eq!(estimate.bearing_deg, 90.0);
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn large_differentials_saturate_and_wrap() {
        let params = DirectionParams::default();
        let right_heavy = estimate_bearing(-80.0, -40.0, 10.0, &params);
        assert!(close(right_heavy.angle_offset_deg, -45.0));
        assert!(close(right_heavy.bearing_deg, 55.0));
        assert_eq!(right_heavy.confidence, 1.0);

        let left_heavy = estimate_bearing(-40.0, -80.0, 10.0, &params);
        assert!(close(left_heavy.bearing_deg, 325.0));
    }

    #[test]
    fn only_devices_on_both_interfaces_correlate() {
        let estimator = DirectionEstimator::new("wlan1", "wlan2");
        let inputs = CorrelationInputs {
            left: vec![device("A", -50.0), device("B", -60.0), device("", -40.0)],
            right: vec![device("A", -55.0), device("C", -60.0), device("", -45.0)],
            heading: Some(90.0),
        };

        let correlations = estimator.correlate(&inputs);
        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].device_id, "A");
        assert!(close(correlations[0].bearing.bearing_deg, 78.75));
        assert!(correlations[0].distance_m.unwrap() > 0.0);
    }

    #[test]
    fn missing_heading_skips_cycle_and_keeps_old_estimates() {
        let store = AggregationStore::new();
        store.set_rf_devices(vec![device("A", -50.0)], Some("wlan1"));
        store.set_rf_devices(vec![device("A", -55.0)], Some("wlan2"));
        store.set_direction_estimate("A", 12.0, 0.9);

        let estimator = DirectionEstimator::new("wlan1", "wlan2");
        assert_eq!(estimator.run_cycle(&store), CycleOutcome::NoHeading);
        assert_eq!(store.direction_estimates()["A"].bearing_deg, 12.0);
    }

    #[test]
    fn cycle_writes_estimates_and_triangulated_distance() {
        let store = AggregationStore::new();
        store.set_rf_devices(vec![device("A", -50.0), device("B", -70.0)], Some("wlan1"));
        store.set_rf_devices(vec![device("A", -55.0)], Some("wlan2"));
        store.set_position(PositionReading::new(None, None, None, Some(90.0)));

        let estimator = DirectionEstimator::new("wlan1", "wlan2");
        assert_eq!(estimator.run_cycle(&store), CycleOutcome::Estimated { devices: 1 });

        let estimates = store.direction_estimates();
        assert!(close(estimates["A"].bearing_deg, 78.75));
        assert!(!estimates.contains_key("B"));

        let expected =
            triangulated_distance(-50.0, -55.0, Band::Ghz2_4, DeviceType::Router).unwrap();
        let merged = store.rf_devices(None);
        let a = merged.iter().find(|d| d.id == "A").unwrap();
        let b = merged.iter().find(|d| d.id == "B").unwrap();
        assert!(close(a.distance_m, expected));
        assert_eq!(b.distance_m, 0.0);
    }

    #[test]
    fn orientation_heading_is_preferred() {
        let store = AggregationStore::new();
        store.set_rf_devices(vec![device("A", -50.0)], Some("wlan1"));
        store.set_rf_devices(vec![device("A", -50.0)], Some("wlan2"));
        store.set_position(PositionReading::new(None, None, None, Some(200.0)));
        store.set_orientation(OrientationReading::new(Some(30.0), None, None));

        DirectionEstimator::new("wlan1", "wlan2").run_cycle(&store);
        assert_eq!(store.direction_estimates()["A"].bearing_deg, 30.0);
    }

    #[test]
    fn custom_params_change_scale() {
        let params = DirectionParams {
            max_differential_dbm: 10.0,
            max_offset_deg: 90.0,
            confidence_scale_dbm: 20.0,
        };
        let estimate = estimate_bearing(-50.0, -55.0, 90.0, &params);
        assert!(close(estimate.angle_offset_deg, 45.0));
        assert!(close(estimate.confidence, 0.25));
    }
}
