use crate::store::AggregationStore;
use std::time::Duration;

/// Common error type for polling services.
///
/// None of these ever reach the store or the render path; the worker loop
/// decides per variant whether to retry, back off, or exit.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("connection lost: {0}")]
    Disconnected(String),
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to spawn worker: {0}")]
    Spawn(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Trait describing one independently polled sensor channel.
///
/// A service is moved onto its own worker thread by the lifecycle manager.
/// `initialize` runs once; a failure there ends the worker without touching
/// the store. `poll` runs once per cycle and must not hold the store across
/// its own I/O.
pub trait PollingService: Send {
    fn name(&self) -> &str;

    fn initialize(&mut self) -> ServiceResult<()> {
        Ok(())
    }

    fn poll(&mut self, store: &AggregationStore) -> ServiceResult<()>;

    /// Delay before the next cycle after a successful poll.
    fn interval(&self) -> Duration;

    /// Delay before the next cycle after a failed poll.
    fn retry_delay(&mut self, _error: &ServiceError) -> Duration {
        self.interval()
    }

    fn cleanup(&mut self) {}
}
