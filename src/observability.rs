use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for workflow operations
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub definitions_created: AtomicU64,
    pub definitions_rejected: AtomicU64,
    pub instances_created: AtomicU64,
    pub transitions_committed: AtomicU64,
    pub transitions_rejected: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_definition_created(&self) {
        self.definitions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_definition_rejected(&self) {
        self.definitions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_instance_created(&self) {
        self.instances_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition_committed(&self) {
        self.transitions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition_rejected(&self) {
        self.transitions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            definitions_created: self.definitions_created.load(Ordering::Relaxed),
            definitions_rejected: self.definitions_rejected.load(Ordering::Relaxed),
            instances_created: self.instances_created.load(Ordering::Relaxed),
            transitions_committed: self.transitions_committed.load(Ordering::Relaxed),
            transitions_rejected: self.transitions_rejected.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Workflow engine metrics: definitions={} (rejected={}), instances={}, transitions={} (rejected={})",
            stats.definitions_created,
            stats.definitions_rejected,
            stats.instances_created,
            stats.transitions_committed,
            stats.transitions_rejected
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub definitions_created: u64,
    pub definitions_rejected: u64,
    pub instances_created: u64,
    pub transitions_committed: u64,
    pub transitions_rejected: u64,
}

/// Time an operation and log its duration
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
