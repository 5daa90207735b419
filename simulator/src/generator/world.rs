//! Seeded synthetic sensor feeds so the HUD runs without hardware.
//!
//! A [`SyntheticWorld`] places a handful of emitters around a slowly turning
//! vehicle. Every feed reads the same world, so the two scan interfaces see a
//! left/right differential that matches the vehicle heading the IMU feed
//! reports.

use hudcore::channels::{
    Band, OrientationReading, PositionReading, SystemTelemetry, Temperature,
};
use hudcore::math::{normalize_360, relative_deg};
use hudcore::prelude::ServiceResult;
use hudcore::processing::classify::classify_device;
use hudcore::processing::pathloss::{band_loss_adjustment_db, tx_power_dbm, REFERENCE_LOSS_DB};
use hudcore::processing::scan::{RawSignal, ScanEntry, OPEN, SECURED};
use hudcore::services::{
    OrientationSample, OrientationSource, PositionSource, ScanSource, TelemetrySource,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;

const EMITTER_NAMES: &[(&str, u32)] = &[
    ("HomeNet", 6),
    ("Cafe_Guest", 1),
    ("NETGEAR-5G", 149),
    ("TP-Link_2F1A", 11),
    ("DJI-Mavic3", 149),
    ("Skydio-X2", 161),
    ("Office", 6),
    ("Parrot-Anafi", 157),
    ("", 6),
];

/// Differential at which the simulated antenna pattern saturates.
const MAX_DIFFERENTIAL_DBM: f64 = 20.0;
const MAX_OFFSET_DEG: f64 = 45.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    pub id: String,
    pub channel: u32,
    pub bearing_deg: f64,
    pub distance_m: f64,
    pub secured: bool,
}

impl Emitter {
    pub fn band(&self) -> Band {
        Band::from_channel(self.channel)
    }

    /// Received strength at an isotropic antenna, inverting the path-loss
    /// model the estimator uses.
    pub fn signal_dbm(&self) -> f64 {
        let band = self.band();
        let device_type = classify_device(&self.id, band, Some(self.channel));
        tx_power_dbm(device_type) + REFERENCE_LOSS_DB
            - band_loss_adjustment_db(band)
            - 20.0 * self.distance_m.max(1.0).log10()
    }
}

/// Receiver mounted on one side of the heading axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug)]
pub struct SyntheticWorld {
    pub emitters: Vec<Emitter>,
    pub start_heading_deg: f64,
    pub turn_rate_dps: f64,
    pub origin: (f64, f64),
    pub speed_mps: f64,
    pub noise_dbm: f64,
    started: Instant,
}

impl SyntheticWorld {
    pub fn generate(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let count = rng.gen_range(5..=EMITTER_NAMES.len());
        let mut names: Vec<(&str, u32)> = EMITTER_NAMES.to_vec();
        names.shuffle(&mut rng);

        let emitters = names
            .into_iter()
            .take(count)
            .map(|(id, channel)| Emitter {
                id: id.to_string(),
                channel,
                bearing_deg: rng.gen_range(0.0..360.0),
                distance_m: rng.gen_range(5.0..400.0),
                secured: rng.gen_bool(0.7),
            })
            .collect();

        Self {
            emitters,
            start_heading_deg: rng.gen_range(0.0..360.0),
            turn_rate_dps: rng.gen_range(2.0..8.0),
            origin: (rng.gen_range(-60.0..60.0), rng.gen_range(-180.0..180.0)),
            speed_mps: rng.gen_range(0.5..3.0),
            noise_dbm: 1.0,
            started: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn heading_at(&self, t: f64) -> f64 {
        normalize_360(self.start_heading_deg + self.turn_rate_dps * t)
    }

    /// Dead-reckoned fix; one degree of latitude is taken as 111 km.
    pub fn position_at(&self, t: f64) -> PositionReading {
        let heading = self.heading_at(t).to_radians();
        let travelled_deg = self.speed_mps * t / 111_000.0;
        PositionReading::new(
            Some(self.origin.0 + travelled_deg * heading.cos()),
            Some(self.origin.1 + travelled_deg * heading.sin()),
            Some(self.speed_mps),
            Some(self.heading_at(t)),
        )
    }

    /// Noise-free reading of `emitter` on one receiver at time `t`.
    pub fn reading(&self, emitter: &Emitter, side: Side, t: f64) -> f64 {
        // Emitter to the left (negative relative angle) is stronger on the left.
        let relative = relative_deg(emitter.bearing_deg, self.heading_at(t));
        let differential = (-relative / MAX_OFFSET_DEG * MAX_DIFFERENTIAL_DBM)
            .clamp(-MAX_DIFFERENTIAL_DBM, MAX_DIFFERENTIAL_DBM);
        let half = differential / 2.0;
        match side {
            Side::Left => emitter.signal_dbm() + half,
            Side::Right => emitter.signal_dbm() - half,
        }
    }

    pub fn scan_at(&self, side: Side, t: f64, rng: &mut StdRng) -> Vec<ScanEntry> {
        self.emitters
            .iter()
            .map(|emitter| {
                let jitter = if self.noise_dbm > 0.0 {
                    rng.gen_range(-self.noise_dbm..self.noise_dbm)
                } else {
                    0.0
                };
                let signal = (self.reading(emitter, side, t) + jitter).round();
                let mut entry = ScanEntry::new(
                    emitter.id.clone(),
                    RawSignal::Dbm(signal),
                    Some(emitter.channel),
                );
                entry.security = if emitter.secured { SECURED } else { OPEN }.to_string();
                entry
            })
            .collect()
    }
}

pub struct SyntheticPosition {
    world: Arc<SyntheticWorld>,
}

impl SyntheticPosition {
    pub fn new(world: Arc<SyntheticWorld>) -> Self {
        Self { world }
    }
}

impl PositionSource for SyntheticPosition {
    fn connect(&mut self) -> ServiceResult<()> {
        Ok(())
    }

    fn next_fix(&mut self) -> ServiceResult<Option<PositionReading>> {
        Ok(Some(self.world.position_at(self.world.elapsed_secs())))
    }
}

pub struct SyntheticImu {
    world: Arc<SyntheticWorld>,
    rng: StdRng,
}

impl SyntheticImu {
    pub fn new(world: Arc<SyntheticWorld>, seed: u64) -> Self {
        Self {
            world,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl OrientationSource for SyntheticImu {
    fn read(&mut self) -> ServiceResult<Option<OrientationSample>> {
        let heading = self.world.heading_at(self.world.elapsed_secs());
        Ok(Some(OrientationSample::Euler(OrientationReading::new(
            Some(heading),
            Some(self.rng.gen_range(-2.0..2.0)),
            Some(self.rng.gen_range(-3.0..3.0)),
        ))))
    }
}

pub struct SyntheticTelemetry {
    rng: StdRng,
    sent_kb: f64,
    recv_kb: f64,
}

impl SyntheticTelemetry {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sent_kb: 0.0,
            recv_kb: 0.0,
        }
    }
}

impl TelemetrySource for SyntheticTelemetry {
    fn sample(&mut self) -> ServiceResult<SystemTelemetry> {
        self.sent_kb += self.rng.gen_range(0.5..20.0);
        self.recv_kb += self.rng.gen_range(1.0..80.0);
        Ok(SystemTelemetry {
            cpu_percent: self.rng.gen_range(5.0..60.0),
            ram_percent: self.rng.gen_range(30.0..55.0),
            temp_celsius: Temperature::Celsius(self.rng.gen_range(42.0..58.0)),
            net_sent_kb: self.sent_kb,
            net_recv_kb: self.recv_kb,
        })
    }
}

/// Scans the world from the left receiver unless asked for `right_interface`.
pub struct SyntheticScan {
    world: Arc<SyntheticWorld>,
    right_interface: String,
    rng: StdRng,
}

impl SyntheticScan {
    pub fn new(world: Arc<SyntheticWorld>, right_interface: impl Into<String>, seed: u64) -> Self {
        Self {
            world,
            right_interface: right_interface.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ScanSource for SyntheticScan {
    fn scan(&mut self, interface: &str) -> ServiceResult<Vec<ScanEntry>> {
        let side = if interface == self.right_interface {
            Side::Right
        } else {
            Side::Left
        };
        let t = self.world.elapsed_secs();
        Ok(self.world.scan_at(side, t, &mut self.rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hudcore::processing::direction::{estimate_bearing, DirectionParams};
    use hudcore::processing::scan::normalize_scan;

    fn quiet_world(seed: u64) -> SyntheticWorld {
        let mut world = SyntheticWorld::generate(seed);
        world.noise_dbm = 0.0;
        world
    }

    #[test]
    fn same_seed_builds_same_world() {
        let a = SyntheticWorld::generate(13);
        let b = SyntheticWorld::generate(13);
        assert_eq!(a.emitters, b.emitters);
        assert_eq!(a.start_heading_deg, b.start_heading_deg);
        assert!(a.emitters.len() >= 5);
    }

    #[test]
    fn differential_recovers_bearing_within_pattern() {
        let world = quiet_world(21);
        let t = 3.0;
        let heading = world.heading_at(t);
        let params = DirectionParams::default();

        for emitter in &world.emitters {
            let relative = relative_deg(emitter.bearing_deg, heading);
            if relative.abs() >= MAX_OFFSET_DEG {
                continue;
            }
            let left = world.reading(emitter, Side::Left, t);
            let right = world.reading(emitter, Side::Right, t);
            let estimate = estimate_bearing(left, right, heading, &params);
            assert!(
                relative_deg(estimate.bearing_deg, emitter.bearing_deg).abs() < 1e-6,
                "{} expected {} got {}",
                emitter.id,
                emitter.bearing_deg,
                estimate.bearing_deg
            );
        }
    }

    #[test]
    fn scans_normalize_into_devices() {
        let world = Arc::new(quiet_world(5));
        let mut scan = SyntheticScan::new(Arc::clone(&world), "wlan2", 1);
        let left = normalize_scan(scan.scan("wlan1").unwrap());
        let right = normalize_scan(scan.scan("wlan2").unwrap());
        assert_eq!(left.len(), world.emitters.len());
        assert_eq!(right.len(), world.emitters.len());
        assert!(left.windows(2).all(|w| w[0].signal_dbm >= w[1].signal_dbm));
    }

    #[test]
    fn telemetry_counters_grow() {
        let mut telemetry = SyntheticTelemetry::new(3);
        let first = telemetry.sample().unwrap();
        let second = telemetry.sample().unwrap();
        assert!(second.net_sent_kb > first.net_sent_kb);
        assert!(second.net_recv_kb > first.net_recv_kb);
        assert!(first.temp_celsius.celsius().is_some());
    }

    #[test]
    fn position_follows_heading() {
        let world = quiet_world(8);
        let fix = world.position_at(10.0);
        assert!(fix.has_fix());
        assert_eq!(fix.heading_deg, Some(world.heading_at(10.0)));
    }
}
