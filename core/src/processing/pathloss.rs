use crate::channels::{Band, DeviceType};

pub const ROUTER_TX_POWER_DBM: f64 = 20.0;
pub const DRONE_TX_POWER_DBM: f64 = 27.0;
pub const REFERENCE_LOSS_DB: f64 = 7.55;
pub const BAND_5_8_LOSS_ADJUSTMENT_DB: f64 = 7.6;

/// Assumed transmit power. Unclassified emitters are treated as routers.
pub fn tx_power_dbm(device_type: DeviceType) -> f64 {
    match device_type {
        DeviceType::Drone => DRONE_TX_POWER_DBM,
        DeviceType::Router | DeviceType::Unknown => ROUTER_TX_POWER_DBM,
    }
}

pub fn band_loss_adjustment_db(band: Band) -> f64 {
    match band {
        Band::Ghz2_4 => 0.0,
        Band::Ghz5_8 => BAND_5_8_LOSS_ADJUSTMENT_DB,
    }
}

/// Single-receiver range from the log-distance model
/// `10^((tx + ref - rssi - band_adj) / 20)`.
pub fn path_loss_distance(signal_dbm: f64, band: Band, device_type: DeviceType) -> f64 {
    let exponent = (tx_power_dbm(device_type) + REFERENCE_LOSS_DB
        - signal_dbm
        - band_loss_adjustment_db(band))
        / 20.0;
    10f64.powf(exponent)
}

/// Combines the two single-receiver ranges of one emitter.
///
/// Each side is weighted by `100 - |rssi|` and the weights are crossed:
/// `(d_left * w_right + d_right * w_left) / (w_left + w_right)`. Returns
/// `None` when both readings sit at or below the weighting floor.
pub fn triangulated_distance(
    left_dbm: f64,
    right_dbm: f64,
    band: Band,
    device_type: DeviceType,
) -> Option<f64> {
    let weight_left = 100.0 - left_dbm.abs();
    let weight_right = 100.0 - right_dbm.abs();
    let total = weight_left + weight_right;
    if total <= 0.0 {
        return None;
    }

    let d_left = path_loss_distance(left_dbm, band, device_type);
    let d_right = path_loss_distance(right_dbm, band, device_type);
    Some(((d_left * weight_right + d_right * weight_left) / total).max(0.0))
}
