use crate::math::angles::normalize_360;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frequency band an emitter was heard on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    #[default]
    #[serde(rename = "2.4GHz")]
    Ghz2_4,
    #[serde(rename = "5.8GHz")]
    Ghz5_8,
}

impl Band {
    /// Highest channel number allocated in the 2.4 GHz band.
    pub const MAX_2_4_CHANNEL: u32 = 14;

    pub fn from_channel(channel: u32) -> Self {
        if channel > Self::MAX_2_4_CHANNEL {
            Band::Ghz5_8
        } else {
            Band::Ghz2_4
        }
    }

    pub fn from_frequency_ghz(frequency: f64) -> Self {
        if frequency >= 5.0 {
            Band::Ghz5_8
        } else {
            Band::Ghz2_4
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Ghz2_4 => write!(f, "2.4GHz"),
            Band::Ghz5_8 => write!(f, "5.8GHz"),
        }
    }
}

/// Heuristic emitter class, used for transmit-power selection and icons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Router,
    Drone,
    #[default]
    Unknown,
}

/// One detected emitter as reported by a single receiving interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfDevice {
    pub id: String,
    pub signal_dbm: f64,
    pub channel: Option<u32>,
    pub band: Band,
    pub security: String,
    pub device_type: DeviceType,
    pub distance_m: f64,
    pub color_id: usize,
}

impl RfDevice {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        signal_dbm: f64,
        channel: Option<u32>,
        band: Band,
        security: impl Into<String>,
        device_type: DeviceType,
        distance_m: f64,
        color_id: usize,
    ) -> Self {
        Self {
            id: id.into(),
            signal_dbm,
            channel,
            band,
            security: security.into(),
            device_type,
            distance_m: distance_m.max(0.0),
            color_id,
        }
    }
}

/// Bearing toward an emitter derived from the dual-interface differential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionEstimate {
    pub device_id: String,
    pub bearing_deg: f64,
    pub confidence: f64,
}

impl DirectionEstimate {
    /// Builds an estimate with the bearing folded into [0, 360) and the
    /// confidence clamped into [0, 1].
    pub fn new(device_id: impl Into<String>, bearing_deg: f64, confidence: f64) -> Self {
        Self {
            device_id: device_id.into(),
            bearing_deg: normalize_360(bearing_deg),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
