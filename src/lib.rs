// Workflow Engine Library - finite-state workflow definitions and instances
// This exposes the core components for embedding, testing and the HTTP front end

pub mod config;
pub mod observability;
pub mod registry;
pub mod server;
pub mod service;
pub mod shutdown;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::{EngineConfig, ObservabilityConfig, ServerConfig};
pub use observability::{EngineMetrics, EngineStats, OperationTimer};
pub use registry::{InMemoryWorkflowStore, InstanceHandle, RegistryError, WorkflowStore};
pub use server::{make_app, run_server};
pub use service::{ServiceError, WorkflowService};
pub use telemetry::{create_operation_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflows::{
    validate_definition, ActionDef, ActionHistoryItem, State, StateReferenceRole, TransitionEngine,
    TransitionError, ValidationError, WorkflowDefinition, WorkflowInstance,
};
