pub mod lifecycle_monitor;
pub mod result_recorder;
pub mod retry;

pub use lifecycle_monitor::{LifecycleMonitor, TerminalObservation};
pub use result_recorder::{ResultRecorder, RunSummary};
pub use retry::{RetryPolicy, Retryable};
