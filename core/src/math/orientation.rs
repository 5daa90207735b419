use std::f64::consts::FRAC_PI_2;

use super::angles::normalize_360;

/// Heading, pitch and roll in degrees resolved from a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub heading_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

/// Converts a (w, x, y, z) quaternion to aerospace ZYX Euler angles.
///
/// Heading is folded into [0, 360) with 0 = north, 90 = east. Pitch saturates
/// at +/-90 degrees when the input sits on the gimbal-lock singularity.
pub fn quaternion_to_euler(w: f64, x: f64, y: f64, z: f64) -> EulerAngles {
    let sinr_cosp = 2.0 * (w * x + y * z);
    let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
    let roll = sinr_cosp.atan2(cosr_cosp);

    let sinp = 2.0 * (w * y - z * x);
    let pitch = if sinp.abs() >= 1.0 {
        FRAC_PI_2.copysign(sinp)
    } else {
        sinp.asin()
    };

    let siny_cosp = 2.0 * (w * z + x * y);
    let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
    let yaw = siny_cosp.atan2(cosy_cosp);

    EulerAngles {
        heading_deg: normalize_360(yaw.to_degrees()),
        pitch_deg: pitch.to_degrees(),
        roll_deg: roll.to_degrees(),
    }
}
