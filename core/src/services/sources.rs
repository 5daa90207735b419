use crate::channels::{OrientationReading, PositionReading, SystemTelemetry};
use crate::math::orientation::quaternion_to_euler;
use crate::prelude::ServiceResult;
use crate::processing::scan::ScanEntry;

/// Satellite positioning feed with an explicit connection.
///
/// `connect` and `next_fix` report a dropped link as
/// [`ServiceError::Disconnected`](crate::prelude::ServiceError::Disconnected),
/// which puts the owning service into reconnect backoff.
pub trait PositionSource: Send {
    fn connect(&mut self) -> ServiceResult<()>;

    /// Next available fix, or `None` when the feed had nothing new.
    fn next_fix(&mut self) -> ServiceResult<Option<PositionReading>>;

    fn disconnect(&mut self) {}
}

/// Raw attitude sample as the inertial sensor reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrientationSample {
    Quaternion { w: f64, x: f64, y: f64, z: f64 },
    Euler(OrientationReading),
}

impl OrientationSample {
    pub fn resolve(self) -> OrientationReading {
        match self {
            OrientationSample::Quaternion { w, x, y, z } => {
                let euler = quaternion_to_euler(w, x, y, z);
                OrientationReading::new(
                    Some(euler.heading_deg),
                    Some(euler.pitch_deg),
                    Some(euler.roll_deg),
                )
            }
            OrientationSample::Euler(reading) => reading,
        }
    }
}

pub trait OrientationSource: Send {
    fn initialize(&mut self) -> ServiceResult<()> {
        Ok(())
    }

    fn read(&mut self) -> ServiceResult<Option<OrientationSample>>;
}

pub trait TelemetrySource: Send {
    fn sample(&mut self) -> ServiceResult<SystemTelemetry>;
}

/// One scan of one radio interface.
pub trait ScanSource: Send {
    fn scan(&mut self, interface: &str) -> ServiceResult<Vec<ScanEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quaternion_sample_resolves_to_degrees() {
        let half = std::f64::consts::FRAC_PI_4;
        // 90 degree yaw about z.
        let sample = OrientationSample::Quaternion {
            w: half.cos(),
            x: 0.0,
            y: 0.0,
            z: half.sin(),
        };
        let reading = sample.resolve();
        assert!((reading.heading_deg.unwrap() - 90.0).abs() < 1e-9);
        assert!(reading.pitch_deg.unwrap().abs() < 1e-9);
        assert!(reading.roll_deg.unwrap().abs() < 1e-9);
    }

    #[test]
    fn euler_sample_passes_through() {
        let reading = OrientationReading::new(Some(10.0), None, Some(2.0));
        assert_eq!(OrientationSample::Euler(reading).resolve(), reading);
    }
}
