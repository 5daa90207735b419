use super::sources::PositionSource;
use crate::lifecycle::Backoff;
use crate::prelude::{PollingService, ServiceError, ServiceResult};
use crate::store::AggregationStore;
use crate::telemetry::LogManager;
use std::time::Duration;

pub const SERVICE_NAME: &str = "GPSTracker";
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

/// Keeps the position channel current and reconnects with backoff when the
/// feed drops.
pub struct PositionService<S> {
    source: S,
    backoff: Backoff,
    connected: bool,
    interval: Duration,
    logger: LogManager,
}

impl<S: PositionSource> PositionService<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            backoff: Backoff::default(),
            connected: false,
            interval: DEFAULT_INTERVAL,
            logger: LogManager::new(SERVICE_NAME),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn ensure_connected(&mut self) -> ServiceResult<()> {
        if self.connected {
            return Ok(());
        }
        self.source.connect()?;
        self.connected = true;
        self.backoff.reset();
        self.logger.record("connected to position source");
        Ok(())
    }
}

impl<S: PositionSource> PollingService for PositionService<S> {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn poll(&mut self, store: &AggregationStore) -> ServiceResult<()> {
        self.ensure_connected()?;
        match self.source.next_fix() {
            Ok(Some(reading)) => {
                // The store drops the heading while orientation owns it.
                store.set_position(reading);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                if matches!(err, ServiceError::Disconnected(_)) {
                    self.connected = false;
                    self.source.disconnect();
                }
                Err(err)
            }
        }
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    /// Any failure while the link is down is a connection failure, whatever
    /// the source called it, and backs off.
    fn retry_delay(&mut self, error: &ServiceError) -> Duration {
        if !self.connected || matches!(error, ServiceError::Disconnected(_)) {
            self.backoff.next_delay()
        } else {
            self.interval
        }
    }

    fn cleanup(&mut self) {
        if self.connected {
            self.source.disconnect();
            self.connected = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{OrientationReading, PositionReading};
    use std::collections::VecDeque;

    /// Scripted feed: each connect attempt and each read pops the next
    /// outcome.
    #[derive(Default)]
    struct ScriptedFeed {
        connects: VecDeque<bool>,
        fixes: VecDeque<ServiceResult<Option<PositionReading>>>,
        disconnects: usize,
    }

    impl PositionSource for ScriptedFeed {
        fn connect(&mut self) -> ServiceResult<()> {
            if self.connects.pop_front().unwrap_or(true) {
                Ok(())
            } else {
                Err(ServiceError::Disconnected("connection refused".into()))
            }
        }

        fn next_fix(&mut self) -> ServiceResult<Option<PositionReading>> {
            self.fixes.pop_front().unwrap_or(Ok(None))
        }

        fn disconnect(&mut self) {
            self.disconnects += 1;
        }
    }

    fn fix(heading: f64) -> PositionReading {
        PositionReading::new(Some(51.5), Some(-0.12), Some(3.0), Some(heading))
    }

    #[test]
    fn fix_lands_in_store() {
        let store = AggregationStore::new();
        let mut service = PositionService::new(ScriptedFeed {
            fixes: VecDeque::from(vec![Ok(Some(fix(45.0)))]),
            ..Default::default()
        });

        service.poll(&store).unwrap();
        assert!(service.is_connected());
        assert_eq!(store.position(), fix(45.0));
        assert_eq!(store.heading(), Some(45.0));
    }

    #[test]
    fn fix_does_not_shadow_orientation_heading() {
        let store = AggregationStore::new();
        store.set_orientation(OrientationReading::new(Some(300.0), None, None));
        let mut service = PositionService::new(ScriptedFeed {
            fixes: VecDeque::from(vec![Ok(Some(fix(45.0)))]),
            ..Default::default()
        });

        service.poll(&store).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.position.heading_deg, None);
        assert_eq!(snapshot.position.latitude, Some(51.5));
        assert_eq!(snapshot.heading(), Some(300.0));
    }

    #[test]
    fn repeated_connect_failures_back_off_then_reset() {
        let store = AggregationStore::new();
        let mut service = PositionService::new(ScriptedFeed {
            connects: VecDeque::from(vec![false, false, false, true, false]),
            fixes: VecDeque::from(vec![
                Ok(Some(fix(10.0))),
                Err(ServiceError::Disconnected("eof".into())),
            ]),
            ..Default::default()
        });

        let mut delays = Vec::new();
        for _ in 0..3 {
            let err = service.poll(&store).unwrap_err();
            delays.push(service.retry_delay(&err));
        }
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );

        service.poll(&store).unwrap();
        assert!(service.is_connected());

        let err = service.poll(&store).unwrap_err();
        assert!(matches!(err, ServiceError::Disconnected(_)));
        assert!(!service.is_connected());
        assert_eq!(service.retry_delay(&err), Duration::from_secs(1));
        assert_eq!(service.source.disconnects, 1);
    }

    /// Connect fails with something other than `Disconnected`.
    struct UnresolvableFeed;

    impl PositionSource for UnresolvableFeed {
        fn connect(&mut self) -> ServiceResult<()> {
            Err(ServiceError::InvalidConfig("gpsd.invalid:2947: no such host".into()))
        }

        fn next_fix(&mut self) -> ServiceResult<Option<PositionReading>> {
            Ok(None)
        }
    }

    #[test]
    fn any_connect_failure_backs_off() {
        let store = AggregationStore::new();
        let mut service = PositionService::new(UnresolvableFeed);

        let mut delays = Vec::new();
        for _ in 0..4 {
            let err = service.poll(&store).unwrap_err();
            assert!(matches!(err, ServiceError::InvalidConfig(_)));
            delays.push(service.retry_delay(&err));
        }
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[test]
    fn transient_read_error_keeps_connection() {
        let store = AggregationStore::new();
        let mut service = PositionService::new(ScriptedFeed {
            fixes: VecDeque::from(vec![Err(ServiceError::Transient("bad sentence".into()))]),
            ..Default::default()
        });

        let err = service.poll(&store).unwrap_err();
        assert!(service.is_connected());
        assert_eq!(service.retry_delay(&err), DEFAULT_INTERVAL);
        assert_eq!(store.position(), PositionReading::default());
    }

    #[test]
    fn cleanup_disconnects_once() {
        let store = AggregationStore::new();
        let mut service = PositionService::new(ScriptedFeed::default());
        service.poll(&store).unwrap();
        service.cleanup();
        service.cleanup();
        assert_eq!(service.source.disconnects, 1);
    }
}
