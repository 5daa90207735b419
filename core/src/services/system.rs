use super::sources::TelemetrySource;
use crate::prelude::{PollingService, ServiceResult};
use crate::store::AggregationStore;
use std::time::Duration;

pub const SERVICE_NAME: &str = "SystemMetrics";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

pub struct SystemMetricsService<S> {
    source: S,
    interval: Duration,
}

impl<S: TelemetrySource> SystemMetricsService<S> {
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

impl<S: TelemetrySource> PollingService for SystemMetricsService<S> {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn poll(&mut self, store: &AggregationStore) -> ServiceResult<()> {
        let telemetry = self.source.sample()?;
        store.set_telemetry(telemetry);
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}
