use hudcore::prelude::{ServiceError, ServiceResult};
use hudcore::services::{OrientationSample, OrientationSource};

/// Placeholder for boards without an inertial driver in this build. It fails
/// initialization so the IMU worker exits and heading falls back to GPS.
pub struct MissingImu;

impl OrientationSource for MissingImu {
    fn initialize(&mut self) -> ServiceResult<()> {
        Err(ServiceError::Unavailable(
            "no inertial sensor driver on this platform".into(),
        ))
    }

    fn read(&mut self) -> ServiceResult<Option<OrientationSample>> {
        Ok(None)
    }
}
