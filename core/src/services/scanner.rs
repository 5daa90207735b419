use super::sources::ScanSource;
use crate::prelude::{PollingService, ServiceResult};
use crate::processing::scan::normalize_scan;
use crate::store::AggregationStore;
use crate::telemetry::LogManager;
use std::time::Duration;

pub const SERVICE_PREFIX: &str = "WiFiScanner";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Scans one radio interface and publishes its normalized device list.
pub struct ScannerService<S> {
    name: String,
    interface: String,
    source: S,
    interval: Duration,
    logger: LogManager,
}

impl<S: ScanSource> ScannerService<S> {
    pub fn new(interface: impl Into<String>, source: S) -> Self {
        let interface = interface.into();
        let name = format!("{}:{}", SERVICE_PREFIX, interface);
        Self {
            logger: LogManager::new(name.clone()),
            name,
            interface,
            source,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl<S: ScanSource> PollingService for ScannerService<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self, store: &AggregationStore) -> ServiceResult<()> {
        let entries = self.source.scan(&self.interface)?;
        let devices = normalize_scan(entries);
        self.logger.detail(&format!("{} devices in range", devices.len()));
        store.set_rf_devices(devices, Some(&self.interface));
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}
