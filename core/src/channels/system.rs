use serde::{Deserialize, Serialize};
use std::fmt;

/// CPU temperature, which not every platform can report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    Celsius(f64),
    #[default]
    Unavailable,
}

impl Temperature {
    pub fn celsius(&self) -> Option<f64> {
        match self {
            Temperature::Celsius(value) => Some(*value),
            Temperature::Unavailable => None,
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temperature::Celsius(value) => write!(f, "{:.1}", value),
            Temperature::Unavailable => write!(f, "N/A"),
        }
    }
}

/// Host health counters sampled by the telemetry service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemTelemetry {
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub temp_celsius: Temperature,
    pub net_sent_kb: f64,
    pub net_recv_kb: f64,
}
