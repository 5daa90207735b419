use super::cancel::{CancellationSignal, Flag};
use super::worker::run_service;
use crate::prelude::{PollingService, ServiceError, ServiceResult};
use crate::store::AggregationStore;
use crate::telemetry::{Metrics, MetricsRecorder};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Per-worker wait applied by [`LifecycleManager::stop_all`].
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceState {
    NotStarted,
    Running,
    StopRequested,
    Stopped,
}

/// Bookkeeping for one launched worker.
pub struct ServiceDescriptor {
    name: String,
    signal: CancellationSignal,
    state: ServiceState,
    finished: Flag,
    metrics: Arc<MetricsRecorder>,
    handle: Option<JoinHandle<()>>,
}

impl ServiceDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Whether the worker thread has left its loop, for any reason.
    pub fn is_finished(&self) -> bool {
        self.finished.is_set()
    }

    fn request_stop(&mut self) -> bool {
        if self.state != ServiceState::Running {
            return false;
        }
        self.state = ServiceState::StopRequested;
        self.signal.cancel();
        true
    }
}

/// Externally visible view of one service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub state: ServiceState,
    pub finished: bool,
    pub metrics: Metrics,
}

/// Starts independent polling workers against a shared store and brings
/// them down with a bounded wait.
pub struct LifecycleManager {
    store: Arc<AggregationStore>,
    services: Vec<ServiceDescriptor>,
    stop_timeout: Duration,
    worker_stack_size: Option<usize>,
}

impl LifecycleManager {
    pub fn new(store: Arc<AggregationStore>) -> Self {
        info!("LifecycleManager initialized");
        Self {
            store,
            services: Vec::new(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            worker_stack_size: None,
        }
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Stack size for worker threads; the platform default when unset.
    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }

    pub fn store(&self) -> &Arc<AggregationStore> {
        &self.store
    }

    /// Launches one worker. The service is handed its own cancellation
    /// signal and a handle to the store. A worker that fails to spawn stays
    /// listed as `NotStarted`.
    pub fn start(&mut self, service: Box<dyn PollingService>) -> ServiceResult<()> {
        let name = service.name().to_string();
        let mut descriptor = ServiceDescriptor {
            name: name.clone(),
            signal: CancellationSignal::new(),
            state: ServiceState::NotStarted,
            finished: Flag::default(),
            metrics: Arc::new(MetricsRecorder::new()),
            handle: None,
        };

        let store = Arc::clone(&self.store);
        let signal = descriptor.signal.clone();
        let finished = descriptor.finished.clone();
        let metrics = Arc::clone(&descriptor.metrics);
        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(bytes) = self.worker_stack_size {
            builder = builder.stack_size(bytes);
        }
        let result = match builder.spawn(move || run_service(service, store, signal, metrics, finished)) {
            Ok(handle) => {
                descriptor.handle = Some(handle);
                descriptor.state = ServiceState::Running;
                info!("Service '{}' started", name);
                Ok(())
            }
            Err(err) => Err(ServiceError::Spawn(format!("{}: {}", name, err))),
        };
        self.services.push(descriptor);
        result
    }

    /// Launches every service in the order given. A service that cannot be
    /// spawned is logged and skipped; the rest still start.
    pub fn start_all<I>(&mut self, services: I) -> usize
    where
        I: IntoIterator<Item = Box<dyn PollingService>>,
    {
        info!("Starting all enabled services...");
        let mut started = 0;
        for service in services {
            match self.start(service) {
                Ok(()) => started += 1,
                Err(err) => error!("{}", err),
            }
        }
        info!("Started {} service(s)", started);
        started
    }

    /// Signals every running worker, then waits up to the stop timeout for
    /// each. Workers that overrun are reported and left detached. Calling
    /// this again once everything is stopped does nothing.
    pub fn stop_all(&mut self) {
        let mut pending = Vec::new();
        for (index, service) in self.services.iter_mut().enumerate() {
            if service.request_stop() {
                info!("Signaling service '{}' to stop", service.name);
                pending.push(index);
            }
        }

        if pending.is_empty() {
            info!("No services to stop");
            return;
        }
        info!("Stopping {} service(s)...", pending.len());

        for index in pending {
            let service = &mut self.services[index];
            if service.finished.wait_timeout(self.stop_timeout) {
                if let Some(handle) = service.handle.take() {
                    if handle.join().is_err() {
                        warn!("Service '{}' terminated by panic", service.name);
                    }
                }
                info!("Service '{}' stopped successfully", service.name);
            } else {
                service.handle = None;
                warn!(
                    "Service '{}' did not stop within {:?} timeout",
                    service.name, self.stop_timeout
                );
            }
            service.state = ServiceState::Stopped;
        }
        info!("All services stopped");
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn status(&self) -> Vec<ServiceStatus> {
        self.services
            .iter()
            .map(|service| ServiceStatus {
                name: service.name.clone(),
                state: service.state,
                finished: service.finished.is_set(),
                metrics: service.metrics.snapshot(),
            })
            .collect()
    }
}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::SystemTelemetry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    struct CountingService {
        name: String,
        polls: Arc<AtomicUsize>,
    }

    impl PollingService for CountingService {
        fn name(&self) -> &str {
            &self.name
        }

        fn poll(&mut self, store: &AggregationStore) -> ServiceResult<()> {
            let count = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            store.set_telemetry(SystemTelemetry {
                cpu_percent: count as f64,
                ..Default::default()
            });
            Ok(())
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(5)
        }
    }

    struct FlakyService {
        polls: Arc<AtomicUsize>,
    }

    impl PollingService for FlakyService {
        fn name(&self) -> &str {
            "Flaky"
        }

        fn poll(&mut self, _store: &AggregationStore) -> ServiceResult<()> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::Transient("scan timed out".into()))
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(5)
        }
    }

    struct MissingHardware;

    impl PollingService for MissingHardware {
        fn name(&self) -> &str {
            "MissingHardware"
        }

        fn initialize(&mut self) -> ServiceResult<()> {
            Err(ServiceError::Unavailable("no sensor on bus".into()))
        }

        fn poll(&mut self, _store: &AggregationStore) -> ServiceResult<()> {
            unreachable!("poll after failed initialization")
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(5)
        }
    }

    /// Sleeps without looking at its cancellation signal.
    struct StuckService;

    impl PollingService for StuckService {
        fn name(&self) -> &str {
            "Stuck"
        }

        fn poll(&mut self, _store: &AggregationStore) -> ServiceResult<()> {
            thread::sleep(Duration::from_millis(400));
            Ok(())
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(5)
        }
    }

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn start_all_runs_services_in_declaration_order() {
        let store = Arc::new(AggregationStore::new());
        let mut manager = LifecycleManager::new(Arc::clone(&store));
        let polls = Arc::new(AtomicUsize::new(0));

        let services: Vec<Box<dyn PollingService>> = vec![
            Box::new(CountingService {
                name: "First".into(),
                polls: Arc::clone(&polls),
            }),
            Box::new(MissingHardware),
        ];
        assert_eq!(manager.start_all(services), 2);

        let names: Vec<&str> = manager.services().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["First", "MissingHardware"]);

        wait_until(|| polls.load(Ordering::SeqCst) >= 3);
        assert!(store.telemetry().cpu_percent >= 3.0);
        manager.stop_all();
    }

    #[test]
    fn failing_worker_is_isolated_from_others() {
        let store = Arc::new(AggregationStore::new());
        let mut manager = LifecycleManager::new(Arc::clone(&store));
        let good = Arc::new(AtomicUsize::new(0));
        let flaky = Arc::new(AtomicUsize::new(0));

        manager
            .start(Box::new(FlakyService {
                polls: Arc::clone(&flaky),
            }))
            .unwrap();
        manager.start(Box::new(MissingHardware)).unwrap();
        manager
            .start(Box::new(CountingService {
                name: "Good".into(),
                polls: Arc::clone(&good),
            }))
            .unwrap();

        wait_until(|| flaky.load(Ordering::SeqCst) >= 3 && good.load(Ordering::SeqCst) >= 3);
        wait_until(|| manager.services()[1].is_finished());

        let status = manager.status();
        assert!(status[0].metrics.errors >= 3);
        assert!(!status[0].finished);
        assert!(status[1].finished);
        assert_eq!(status[1].metrics.cycles, 0);
        assert!(status[2].metrics.cycles >= 3);
        manager.stop_all();
    }

    #[test]
    fn stop_all_is_idempotent() {
        let store = Arc::new(AggregationStore::new());
        let mut manager = LifecycleManager::new(store);
        let polls = Arc::new(AtomicUsize::new(0));
        manager
            .start(Box::new(CountingService {
                name: "Counter".into(),
                polls,
            }))
            .unwrap();
        assert_eq!(manager.services()[0].state(), ServiceState::Running);

        manager.stop_all();
        let first: Vec<ServiceState> = manager.services().iter().map(|s| s.state()).collect();
        manager.stop_all();
        let second: Vec<ServiceState> = manager.services().iter().map(|s| s.state()).collect();

        assert_eq!(first, vec![ServiceState::Stopped]);
        assert_eq!(first, second);
        assert!(manager.services()[0].is_finished());
    }

    #[test]
    fn stop_all_returns_after_timeout_for_stuck_worker() {
        let store = Arc::new(AggregationStore::new());
        let mut manager =
            LifecycleManager::new(store).with_stop_timeout(Duration::from_millis(50));
        manager.start(Box::new(StuckService)).unwrap();
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        manager.stop_all();
        assert!(started.elapsed() < Duration::from_millis(350));
        assert_eq!(manager.services()[0].state(), ServiceState::Stopped);
    }

    #[test]
    fn stop_without_services_is_a_no_op() {
        let mut manager = LifecycleManager::new(Arc::new(AggregationStore::new()));
        manager.stop_all();
        assert!(manager.status().is_empty());
    }

    #[test]
    fn failed_spawn_stays_not_started() {
        let store = Arc::new(AggregationStore::new());
        let mut manager = LifecycleManager::new(store).with_worker_stack_size(1 << 50);
        let polls = Arc::new(AtomicUsize::new(0));

        let err = manager
            .start(Box::new(CountingService {
                name: "Oversized".into(),
                polls: Arc::clone(&polls),
            }))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Spawn(_)));

        let status = manager.status();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].name, "Oversized");
        assert_eq!(status[0].state, ServiceState::NotStarted);
        assert!(!status[0].finished);

        manager.stop_all();
        assert_eq!(manager.services()[0].state(), ServiceState::NotStarted);
        assert_eq!(polls.load(Ordering::SeqCst), 0);
    }
}
