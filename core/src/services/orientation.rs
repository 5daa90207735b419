use super::sources::OrientationSource;
use crate::prelude::{PollingService, ServiceResult};
use crate::store::AggregationStore;
use std::time::Duration;

pub const SERVICE_NAME: &str = "IMUTracker";
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(20);

/// Polls the inertial sensor and resolves quaternions before storing.
pub struct OrientationService<S> {
    source: S,
    interval: Duration,
}

impl<S: OrientationSource> OrientationService<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl<S: OrientationSource> PollingService for OrientationService<S> {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn initialize(&mut self) -> ServiceResult<()> {
        self.source.initialize()
    }

    fn poll(&mut self, store: &AggregationStore) -> ServiceResult<()> {
        if let Some(sample) = self.source.read()? {
            store.set_orientation(sample.resolve());
        }
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}
