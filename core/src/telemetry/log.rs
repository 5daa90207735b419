use log::{debug, error, info, warn};

/// Prefixes every line with the owning service so interleaved worker output
/// stays attributable.
#[derive(Debug, Clone)]
pub struct LogManager {
    service: String,
}

impl LogManager {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.service, message);
    }

    pub fn detail(&self, message: &str) {
        debug!("[{}] {}", self.service, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.service, message);
    }

    pub fn failure(&self, message: &str) {
        error!("[{}] {}", self.service, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("hud")
    }
}
