use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Outcome counters for the comment workflow
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub commands_accepted: AtomicU64,
    pub commands_rejected: AtomicU64,
    pub not_found: AtomicU64,
    pub store_unavailable: AtomicU64,
    pub version_conflicts: AtomicU64,
    pub publications_succeeded: AtomicU64,
    pub publications_failed: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.commands_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.commands_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unavailable(&self) {
        self.store_unavailable.fetch_add(1, Ordering::Relaxed);
        warn!("State store unavailable");
    }

    pub fn record_conflict(&self) {
        self.version_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publication(&self, succeeded: bool) {
        if succeeded {
            self.publications_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.publications_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_stats(&self) -> WorkflowStats {
        WorkflowStats {
            commands_accepted: self.commands_accepted.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            store_unavailable: self.store_unavailable.load(Ordering::Relaxed),
            version_conflicts: self.version_conflicts.load(Ordering::Relaxed),
            publications_succeeded: self.publications_succeeded.load(Ordering::Relaxed),
            publications_failed: self.publications_failed.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Workflow metrics: accepted={}, rejected={}, not_found={}, unavailable={}, conflicts={}, published={}, publish_failures={}",
            stats.commands_accepted,
            stats.commands_rejected,
            stats.not_found,
            stats.store_unavailable,
            stats.version_conflicts,
            stats.publications_succeeded,
            stats.publications_failed
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStats {
    pub commands_accepted: u64,
    pub commands_rejected: u64,
    pub not_found: u64,
    pub store_unavailable: u64,
    pub version_conflicts: u64,
    pub publications_succeeded: u64,
    pub publications_failed: u64,
}

/// Global metrics instance
static WORKFLOW_METRICS: std::sync::LazyLock<WorkflowMetrics> =
    std::sync::LazyLock::new(WorkflowMetrics::new);

pub fn workflow_metrics() -> &'static WorkflowMetrics {
    &WORKFLOW_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
