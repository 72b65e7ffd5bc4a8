//! Registry of workflow definitions and their running instances.
//!
//! Both collections are keyed by id. Definitions are shared read-only once
//! admitted; each instance sits behind its own lock so updates to different
//! instances never contend.

mod memory;

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::workflows::{ValidationError, WorkflowDefinition, WorkflowInstance};

pub use memory::InMemoryWorkflowStore;

/// Shared, individually locked instance record.
pub type InstanceHandle = Arc<Mutex<WorkflowInstance>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("workflowdefinition with same id exists")]
    DuplicateDefinitionId { id: String },

    #[error("workflowinstance with same id exists")]
    DuplicateInstanceId { id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl RegistryError {
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::DuplicateDefinitionId { .. } => "DuplicateDefinitionId",
            RegistryError::DuplicateInstanceId { .. } => "DuplicateInstanceId",
            RegistryError::Validation(e) => e.kind(),
        }
    }
}

/// Storage seam for definitions and instances.
pub trait WorkflowStore: Send + Sync {
    /// Admits a definition if its id is free and it passes validation.
    fn put_definition(&self, def: WorkflowDefinition) -> Result<Arc<WorkflowDefinition>, RegistryError>;

    fn get_definition(&self, id: &str) -> Option<Arc<WorkflowDefinition>>;

    /// All definitions, ordered by id.
    fn list_definitions(&self) -> Vec<Arc<WorkflowDefinition>>;

    fn put_instance(&self, instance: WorkflowInstance) -> Result<InstanceHandle, RegistryError>;

    /// Lock handle for a check-then-mutate sequence on one instance.
    fn instance_handle(&self, id: &str) -> Option<InstanceHandle>;

    /// Consistent snapshot of one instance.
    fn get_instance(&self, id: &str) -> Option<WorkflowInstance>;

    /// Snapshots of all instances, ordered by id.
    fn list_instances(&self) -> Vec<WorkflowInstance>;

    fn definition_count(&self) -> usize;

    fn instance_count(&self) -> usize;
}
