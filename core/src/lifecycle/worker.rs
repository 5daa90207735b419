use super::cancel::{CancellationSignal, Flag};
use crate::prelude::{PollingService, ServiceError};
use crate::store::AggregationStore;
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

/// Raises the completion flag however the worker body ends, panics included.
struct FinishGuard(Flag);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.set();
    }
}

/// Body of one worker thread.
///
/// Failures never leave this function: transient and connection errors are
/// logged and retried after the service's own delay, an unavailable source
/// ends the loop. The cancellation signal is checked before every cycle and
/// wakes any pending sleep.
pub(crate) fn run_service(
    mut service: Box<dyn PollingService>,
    store: Arc<AggregationStore>,
    signal: CancellationSignal,
    metrics: Arc<MetricsRecorder>,
    finished: Flag,
) {
    let _guard = FinishGuard(finished);
    let logger = LogManager::new(service.name());
    logger.record("service started");

    if let Err(err) = service.initialize() {
        metrics.record_error();
        logger.failure(&format!("initialization failed, service exiting: {}", err));
        return;
    }

    while !signal.is_cancelled() {
        let delay = match service.poll(&store) {
            Ok(()) => {
                metrics.record_cycle();
                service.interval()
            }
            Err(ServiceError::Unavailable(reason)) => {
                metrics.record_error();
                logger.failure(&format!("source unavailable, service exiting: {}", reason));
                break;
            }
            Err(err) => {
                metrics.record_error();
                let delay = service.retry_delay(&err);
                logger.warn(&format!("{} (retrying in {:?})", err, delay));
                delay
            }
        };

        if signal.sleep(delay) {
            break;
        }
    }

    service.cleanup();
    logger.record("service stopped");
}
