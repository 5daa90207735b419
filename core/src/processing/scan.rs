//! Normalization of raw radio scan results into [`RfDevice`] records.

use crate::channels::{Band, RfDevice};
use crate::processing::classify::{classify_device, color_id};
use crate::processing::pathloss::path_loss_distance;
use serde::{Deserialize, Serialize};

pub const SECURED: &str = "Secured";
pub const OPEN: &str = "Open";

/// Signal strength exactly as the scan tool printed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RawSignal {
    Dbm(f64),
    Quality { value: f64, max: f64 },
    Unknown,
}

impl RawSignal {
    /// Parses `"-45 dBm"`, `"-45"` or a `"q/max"` quality fraction.
    pub fn parse(text: &str) -> Self {
        let token = text.split_whitespace().next().unwrap_or("");
        if let Some((value, max)) = token.split_once('/') {
            return match (value.parse::<f64>(), max.parse::<f64>()) {
                (Ok(value), Ok(max)) if max > 0.0 => RawSignal::Quality { value, max },
                _ => RawSignal::Unknown,
            };
        }
        token
            .parse::<f64>()
            .map(RawSignal::Dbm)
            .unwrap_or(RawSignal::Unknown)
    }

    /// dBm figure, mapping a quality fraction as `-100 + 0.7 * percent`.
    pub fn to_dbm(self) -> Option<f64> {
        match self {
            RawSignal::Dbm(dbm) => Some(dbm),
            RawSignal::Quality { value, max } => {
                let percent = (value / max * 100.0).clamp(0.0, 100.0);
                Some(-100.0 + 0.7 * percent)
            }
            RawSignal::Unknown => None,
        }
    }
}

/// One emitter from one scan of one interface, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub id: String,
    pub signal: RawSignal,
    pub channel: Option<u32>,
    pub frequency_ghz: Option<f64>,
    pub security: String,
}

impl ScanEntry {
    pub fn new(id: impl Into<String>, signal: RawSignal, channel: Option<u32>) -> Self {
        Self {
            id: id.into(),
            signal,
            channel,
            frequency_ghz: None,
            security: OPEN.to_string(),
        }
    }

    pub fn band(&self) -> Band {
        match (self.frequency_ghz, self.channel) {
            (Some(frequency), _) => Band::from_frequency_ghz(frequency),
            (None, Some(channel)) => Band::from_channel(channel),
            (None, None) => Band::Ghz2_4,
        }
    }

    /// Builds the device record. Entries whose signal cannot be read as dBm
    /// are dropped.
    pub fn into_device(self) -> Option<RfDevice> {
        let signal_dbm = self.signal.to_dbm()?;
        let band = self.band();
        let device_type = classify_device(&self.id, band, self.channel);
        let distance_m = path_loss_distance(signal_dbm, band, device_type);
        let color = color_id(&self.id);
        Some(RfDevice::new(
            self.id,
            signal_dbm,
            self.channel,
            band,
            self.security,
            device_type,
            distance_m,
            color,
        ))
    }
}

/// Normalizes a scan and orders it strongest first.
pub fn normalize_scan(entries: Vec<ScanEntry>) -> Vec<RfDevice> {
    let mut devices: Vec<RfDevice> = entries
        .into_iter()
        .filter_map(ScanEntry::into_device)
        .collect();
    devices.sort_by(|a, b| b.signal_dbm.total_cmp(&a.signal_dbm));
    devices
}

fn value_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.split_once(key).map(|(_, rest)| rest.trim())
}

fn parse_cell(block: &str) -> Option<ScanEntry> {
    let mut id = None;
    let mut level = RawSignal::Unknown;
    let mut quality = RawSignal::Unknown;
    let mut channel = None;
    let mut frequency_ghz = None;
    let mut security = OPEN;

    for line in block.lines().map(str::trim) {
        if let Some(rest) = value_after(line, "ESSID:") {
            id = Some(rest.trim_matches('"').to_string());
        } else if line.starts_with("Quality") || line.contains("Signal level") {
            if let Some(rest) = value_after(line, "Quality=") {
                quality = RawSignal::parse(rest);
            }
            if let Some(rest) = value_after(line, "Signal level=") {
                level = RawSignal::parse(rest);
            }
        } else if let Some(rest) = value_after(line, "Channel:") {
            channel = rest.parse().ok();
        } else if let Some(rest) = value_after(line, "Frequency:") {
            let mut parts = rest.split_whitespace();
            frequency_ghz = parts.next().and_then(|value| value.parse().ok());
            if channel.is_none() {
                channel = rest
                    .split_once("(Channel ")
                    .and_then(|(_, tail)| tail.trim_end_matches(')').trim().parse().ok());
            }
        } else if let Some(rest) = value_after(line, "Encryption key:") {
            if rest == "on" {
                security = SECURED;
            }
        }
    }

    let signal = match level {
        RawSignal::Unknown => quality,
        known => known,
    };

    Some(ScanEntry {
        id: id?,
        signal,
        channel,
        frequency_ghz,
        security: security.to_string(),
    })
}

/// Parses the text printed by `iwlist <interface> scan`. Cells without an
/// ESSID line are skipped.
pub fn parse_iwlist(output: &str) -> Vec<ScanEntry> {
    output.split("Cell ").skip(1).filter_map(parse_cell).collect()
}
