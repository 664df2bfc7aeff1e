use super::{LogObserver, NoopObserver, Observer};
use crate::config::ObservabilityConfig;
use std::sync::Arc;

/// Builds the observer selected by `[observability] backend`.
pub fn create_observer(config: &ObservabilityConfig) -> Arc<dyn Observer> {
    match config.backend.as_str() {
        "log" => Arc::new(LogObserver::new()),
        "none" | "noop" => Arc::new(NoopObserver),
        other => {
            tracing::warn!(backend = %other, "unknown observability backend, falling back to noop");
            Arc::new(NoopObserver)
        }
    }
}
