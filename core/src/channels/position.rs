use serde::{Deserialize, Serialize};

/// Latest fix reported by the satellite positioning source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionReading {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
}

impl PositionReading {
    pub fn new(
        latitude: Option<f64>,
        longitude: Option<f64>,
        speed_mps: Option<f64>,
        heading_deg: Option<f64>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            speed_mps,
            heading_deg,
        }
    }

    pub fn has_fix(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Attitude reported by the inertial sensor, already resolved to degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationReading {
    pub heading_deg: Option<f64>,
    pub pitch_deg: Option<f64>,
    pub roll_deg: Option<f64>,
}

impl OrientationReading {
    pub fn new(heading_deg: Option<f64>, pitch_deg: Option<f64>, roll_deg: Option<f64>) -> Self {
        Self {
            heading_deg,
            pitch_deg,
            roll_deg,
        }
    }
}

/// Best available heading: orientation first, then position.
pub fn best_heading(orientation: &OrientationReading, position: &PositionReading) -> Option<f64> {
    orientation.heading_deg.or(position.heading_deg)
}
