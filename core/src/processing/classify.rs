//! Best-effort emitter classification and stable palette assignment.
//!
//! The classifier looks only at the advertised id, band and channel, so it
//! will misfile a router named after a drone vendor and vice versa.

use crate::channels::{Band, DeviceType};

/// Name fragments advertised by common consumer drone links.
const DRONE_VENDOR_FRAGMENTS: &[&str] = &[
    "dji", "mavic", "phantom", "parrot", "anafi", "autel", "skydio", "tello", "yuneec",
];

/// Fragments typical of infrastructure network names.
const GENERIC_NETWORK_FRAGMENTS: &[&str] = &[
    "wifi", "wi-fi", "wlan", "net", "home", "guest", "router", "office", "linksys", "netgear",
    "tp-link", "asus", "xfinity", "_5g", "-5g",
];

/// Non-overlapping channels of the 2.4 GHz band.
const CONVENTIONAL_2_4_CHANNELS: &[u32] = &[1, 6, 11];

/// RGB palette shared with the renderer, indexed by [`color_id`].
pub const DEVICE_PALETTE: [[u8; 3]; 12] = [
    [0, 255, 255],
    [255, 100, 255],
    [0, 255, 100],
    [100, 255, 255],
    [255, 150, 100],
    [200, 100, 255],
    [50, 255, 200],
    [255, 200, 100],
    [150, 255, 255],
    [255, 100, 150],
    [100, 255, 150],
    [200, 255, 100],
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn classify_device(id: &str, band: Band, channel: Option<u32>) -> DeviceType {
    let lowered = id.to_lowercase();
    if contains_any(&lowered, DRONE_VENDOR_FRAGMENTS) {
        return DeviceType::Drone;
    }
    if band == Band::Ghz5_8 && !contains_any(&lowered, GENERIC_NETWORK_FRAGMENTS) {
        return DeviceType::Drone;
    }

    let conventional = band == Band::Ghz2_4
        && channel.is_some_and(|number| CONVENTIONAL_2_4_CHANNELS.contains(&number));
    if conventional || !id.is_empty() {
        DeviceType::Router
    } else {
        DeviceType::Unknown
    }
}

/// 32-bit FNV-1a over the id bytes; identical across runs and platforms.
fn fnv1a(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    bytes.iter().fold(OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(PRIME)
    })
}

/// Palette slot for a device id.
pub fn color_id(id: &str) -> usize {
    fnv1a(id.as_bytes()) as usize % DEVICE_PALETTE.len()
}

pub fn palette_color(color_id: usize) -> [u8; 3] {
    DEVICE_PALETTE[color_id % DEVICE_PALETTE.len()]
}
