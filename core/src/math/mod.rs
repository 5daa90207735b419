pub mod angles;
pub mod orientation;

pub use angles::{normalize_360, relative_deg};
pub use orientation::{quaternion_to_euler, EulerAngles};
