//! Hardware-backed sources for the core polling services.

pub mod gpsd;
pub mod imu;
pub mod iwlist;
pub mod procfs;
