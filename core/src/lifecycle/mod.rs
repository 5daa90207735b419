//! Worker lifecycle: launch, cooperative cancellation and bounded shutdown.

pub mod backoff;
pub mod cancel;
pub mod manager;
mod worker;

pub use backoff::Backoff;
pub use cancel::CancellationSignal;
pub use manager::{LifecycleManager, ServiceDescriptor, ServiceState, ServiceStatus};
