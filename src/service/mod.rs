//! Orchestrates the registry and the transition engine behind the seven
//! externally visible operations.

pub mod errors;

use std::sync::{Arc, PoisonError};

use tracing::{info, warn};

use crate::observability::{EngineMetrics, OperationTimer};
use crate::registry::{InMemoryWorkflowStore, WorkflowStore};
use crate::telemetry::{create_operation_span, generate_correlation_id};
use crate::workflows::{TransitionEngine, WorkflowDefinition, WorkflowInstance};

pub use errors::ServiceError;

pub struct WorkflowService {
    store: Arc<dyn WorkflowStore>,
    engine: TransitionEngine,
    metrics: Arc<EngineMetrics>,
}

impl std::fmt::Debug for WorkflowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowService")
            .field("definitions", &self.store.definition_count())
            .field("instances", &self.store.instance_count())
            .field("metrics", &self.metrics.get_stats())
            .finish()
    }
}

impl Default for WorkflowService {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl WorkflowService {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self {
            store,
            engine: TransitionEngine::new(),
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryWorkflowStore::new()))
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn store(&self) -> &dyn WorkflowStore {
        self.store.as_ref()
    }

    pub fn create_definition(&self, def: WorkflowDefinition) -> Result<Arc<WorkflowDefinition>, ServiceError> {
        let correlation_id = generate_correlation_id();
        let span = create_operation_span("create_definition", Some(&def.id), None, Some(&correlation_id));
        let _enter = span.enter();
        let timer = OperationTimer::new("create_definition");

        let workflow_id = def.id.clone();
        let result = self.store.put_definition(def).map_err(ServiceError::from);
        match &result {
            Ok(stored) => {
                self.metrics.record_definition_created();
                info!(
                    workflow_id = %stored.id,
                    states = stored.states.len(),
                    actions = stored.actions.len(),
                    "Workflow definition created"
                );
            }
            Err(e) => {
                self.metrics.record_definition_rejected();
                warn!(workflow_id = %workflow_id, kind = e.kind(), reason = %e, "Workflow definition rejected");
            }
        }
        timer.finish();
        result
    }

    pub fn get_definition(&self, id: &str) -> Result<Arc<WorkflowDefinition>, ServiceError> {
        self.store
            .get_definition(id)
            .ok_or_else(|| ServiceError::DefinitionNotFound { id: id.to_string() })
    }

    pub fn list_definitions(&self) -> Vec<Arc<WorkflowDefinition>> {
        self.store.list_definitions()
    }

    pub fn create_instance(&self, workflow_id: &str) -> Result<WorkflowInstance, ServiceError> {
        let correlation_id = generate_correlation_id();
        let span = create_operation_span("create_instance", Some(workflow_id), None, Some(&correlation_id));
        let _enter = span.enter();

        let def = self.get_definition(workflow_id).inspect_err(|e| {
            warn!(workflow_id = %workflow_id, kind = e.kind(), "Instance creation rejected");
        })?;

        let instance = self.engine.instantiate(&def).map_err(|e| {
            warn!(workflow_id = %workflow_id, kind = e.kind(), reason = %e, "Instance creation rejected");
            ServiceError::from(e)
        })?;

        self.store.put_instance(instance.clone())?;
        self.metrics.record_instance_created();
        info!(
            workflow_id = %workflow_id,
            instance_id = %instance.id,
            current_state = %instance.current_state(),
            "Workflow instance created"
        );
        Ok(instance)
    }

    pub fn get_instance(&self, id: &str) -> Result<WorkflowInstance, ServiceError> {
        self.store
            .get_instance(id)
            .ok_or_else(|| ServiceError::InstanceNotFound { id: id.to_string() })
    }

    pub fn list_instances(&self) -> Vec<WorkflowInstance> {
        self.store.list_instances()
    }

    /// Action ids that would currently be accepted for the instance.
    pub fn available_actions(&self, instance_id: &str) -> Result<Vec<String>, ServiceError> {
        let instance = self.get_instance(instance_id)?;
        let def = self.get_definition(&instance.workflow_definition_id)?;
        Ok(self.engine.available_actions(&def, &instance))
    }

    /// Fires an action on an instance. Concurrent calls on the same instance
    /// serialize on its lock; each is evaluated against the state the previous
    /// one left behind.
    pub fn execute_action(&self, instance_id: &str, action_id: &str) -> Result<WorkflowInstance, ServiceError> {
        let correlation_id = generate_correlation_id();
        let span = create_operation_span("execute_action", None, Some(instance_id), Some(&correlation_id));
        let _enter = span.enter();
        let timer = OperationTimer::new("execute_action");

        let result = self.apply_action(instance_id, action_id);
        match &result {
            Ok(instance) => {
                self.metrics.record_transition_committed();
                if let Some(item) = instance.last_transition() {
                    info!(
                        workflow_id = %instance.workflow_definition_id,
                        instance_id = %instance.id,
                        action_id = %item.action_id,
                        from_state = %item.from_state,
                        to_state = %item.to_state,
                        "Workflow transition committed"
                    );
                }
            }
            Err(e) => {
                self.metrics.record_transition_rejected();
                warn!(
                    instance_id = %instance_id,
                    action_id = %action_id,
                    kind = e.kind(),
                    reason = %e,
                    "Workflow transition rejected"
                );
            }
        }
        timer.finish();
        result
    }

    fn apply_action(&self, instance_id: &str, action_id: &str) -> Result<WorkflowInstance, ServiceError> {
        let handle = self
            .store
            .instance_handle(instance_id)
            .ok_or_else(|| ServiceError::InstanceNotFound { id: instance_id.to_string() })?;

        let workflow_id = handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .workflow_definition_id
            .clone();
        let def = self.get_definition(&workflow_id)?;

        // Held only across the check-then-mutate sequence.
        let mut instance = handle.lock().unwrap_or_else(PoisonError::into_inner);
        self.engine.execute(&def, &mut instance, action_id)?;
        Ok(instance.clone())
    }
}
