use std::sync::{Arc, Mutex, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::{InstanceHandle, RegistryError, WorkflowStore};
use crate::workflows::{validate_definition, WorkflowDefinition, WorkflowInstance};

/// Process-lifetime store. Map operations are atomic per key; instance bodies
/// are guarded by a per-instance mutex held only while reading or mutating it.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    definitions: DashMap<String, Arc<WorkflowDefinition>>,
    instances: DashMap<String, InstanceHandle>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Every mutation is applied only after all checks pass, so a poisoned guard
// still holds a consistent instance.
fn snapshot(handle: &Mutex<WorkflowInstance>) -> WorkflowInstance {
    handle.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

impl WorkflowStore for InMemoryWorkflowStore {
    fn put_definition(&self, def: WorkflowDefinition) -> Result<Arc<WorkflowDefinition>, RegistryError> {
        if self.definitions.contains_key(&def.id) {
            return Err(RegistryError::DuplicateDefinitionId { id: def.id });
        }
        // Validation can be long for large graphs; no shard lock is held here.
        validate_definition(&def)?;

        match self.definitions.entry(def.id.clone()) {
            // Lost a race with a concurrent admission of the same id.
            Entry::Occupied(_) => Err(RegistryError::DuplicateDefinitionId { id: def.id }),
            Entry::Vacant(slot) => {
                let def = Arc::new(def);
                slot.insert(def.clone());
                Ok(def)
            }
        }
    }

    fn get_definition(&self, id: &str) -> Option<Arc<WorkflowDefinition>> {
        let found = self.definitions.get(id).map(|d| d.value().clone());
        debug!(workflow_id = %id, found = found.is_some(), "Definition lookup");
        found
    }

    fn list_definitions(&self) -> Vec<Arc<WorkflowDefinition>> {
        let mut defs: Vec<_> = self.definitions.iter().map(|d| d.value().clone()).collect();
        defs.sort_by(|a, b| a.id.cmp(&b.id));
        defs
    }

    fn put_instance(&self, instance: WorkflowInstance) -> Result<InstanceHandle, RegistryError> {
        match self.instances.entry(instance.id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateInstanceId { id: instance.id }),
            Entry::Vacant(slot) => {
                let handle = Arc::new(Mutex::new(instance));
                slot.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    fn instance_handle(&self, id: &str) -> Option<InstanceHandle> {
        // Clone the Arc out so the map shard is released before the caller locks.
        self.instances.get(id).map(|h| h.value().clone())
    }

    fn get_instance(&self, id: &str) -> Option<WorkflowInstance> {
        let found = self.instance_handle(id).map(|h| snapshot(&h));
        debug!(instance_id = %id, found = found.is_some(), "Instance lookup");
        found
    }

    fn list_instances(&self) -> Vec<WorkflowInstance> {
        let handles: Vec<InstanceHandle> = self.instances.iter().map(|h| h.value().clone()).collect();
        let mut instances: Vec<_> = handles.iter().map(|h| snapshot(h)).collect();
        instances.sort_by(|a, b| a.id.cmp(&b.id));
        instances
    }

    fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::{ActionDef, State, TransitionEngine};
    use std::sync::Barrier;
    use std::thread;

    fn definition(id: &str) -> WorkflowDefinition {
        WorkflowDefinition::new(id, "Simple")
            .with_state(State::new("S1", "Start").initial())
            .with_state(State::new("S2", "End").terminal())
            .with_action(ActionDef::new("A1", "Finish", ["S1"], "S2"))
    }

    #[test]
    fn test_put_and_get_definition() {
        let store = InMemoryWorkflowStore::new();
        let stored = store.put_definition(definition("wf-1")).unwrap();
        assert_eq!(stored.id, "wf-1");
        assert_eq!(store.get_definition("wf-1").unwrap().name, "Simple");
        assert!(store.get_definition("wf-2").is_none());
        assert_eq!(store.definition_count(), 1);
    }

    #[test]
    fn test_duplicate_definition_id_rejected_and_original_kept() {
        let store = InMemoryWorkflowStore::new();
        store.put_definition(definition("wf-1")).unwrap();

        let mut other = definition("wf-1");
        other.name = "Impostor".to_string();
        let err = store.put_definition(other).unwrap_err();
        assert_eq!(err.kind(), "DuplicateDefinitionId");
        assert_eq!(store.get_definition("wf-1").unwrap().name, "Simple");
    }

    #[test]
    fn test_duplicate_id_checked_before_validation() {
        let store = InMemoryWorkflowStore::new();
        store.put_definition(definition("wf-1")).unwrap();
        let err = store
            .put_definition(WorkflowDefinition::new("wf-1", "Invalid"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateDefinitionId { id: "wf-1".to_string() });
    }

    #[test]
    fn test_invalid_definition_never_inserted() {
        let store = InMemoryWorkflowStore::new();
        let err = store
            .put_definition(WorkflowDefinition::new("wf-bad", "No states"))
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidInitialStateCount");
        assert!(store.get_definition("wf-bad").is_none());
        assert_eq!(store.definition_count(), 0);
    }

    #[test]
    fn test_list_definitions_sorted_by_id() {
        let store = InMemoryWorkflowStore::new();
        for id in ["c", "a", "b"] {
            store.put_definition(definition(id)).unwrap();
        }
        let ids: Vec<_> = store.list_definitions().iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_put_and_get_instance() {
        let store = InMemoryWorkflowStore::new();
        let instance = WorkflowInstance::new("wf-1", "S1");
        let id = instance.id.clone();

        store.put_instance(instance.clone()).unwrap();
        assert_eq!(store.get_instance(&id), Some(instance.clone()));
        assert_eq!(store.list_instances(), vec![instance.clone()]);

        let err = store.put_instance(instance).unwrap_err();
        assert_eq!(err.kind(), "DuplicateInstanceId");
        assert_eq!(store.instance_count(), 1);
        assert!(store.get_instance("missing").is_none());
    }

    #[test]
    fn test_instance_handle_changes_go_through_engine() {
        let store = InMemoryWorkflowStore::new();
        let def = store.put_definition(definition("wf-1")).unwrap();
        let instance = TransitionEngine::new().instantiate(&def).unwrap();
        let id = instance.id.clone();
        store.put_instance(instance).unwrap();

        let handle = store.instance_handle(&id).unwrap();
        TransitionEngine::new()
            .execute(&def, &mut handle.lock().unwrap(), "A1")
            .unwrap();

        let stored = store.get_instance(&id).unwrap();
        assert_eq!(stored.current_state(), "S2");
        assert_eq!(stored.last_transition().unwrap().to_state, stored.current_state());
    }

    #[test]
    fn test_racing_admissions_of_same_id_accept_exactly_one() {
        let store = Arc::new(InMemoryWorkflowStore::new());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    store.put_definition(definition("contested"))
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.kind(), "DuplicateDefinitionId");
        }
        assert_eq!(store.definition_count(), 1);
    }

    #[test]
    fn test_lookups_proceed_while_large_definition_validates() {
        let store = Arc::new(InMemoryWorkflowStore::new());
        for i in 0..64 {
            store.put_definition(definition(&format!("small-{i}"))).unwrap();
        }

        let mut large = WorkflowDefinition::new("large", "Large")
            .with_state(State::new("s0", "s0").initial());
        for i in 1..50_000 {
            large = large
                .with_state(State::new(format!("s{i}"), format!("s{i}")))
                .with_action(ActionDef::new(
                    format!("a{i}"),
                    format!("a{i}"),
                    [format!("s{}", i - 1)],
                    format!("s{i}"),
                ));
        }

        let admitting = {
            let store = store.clone();
            thread::spawn(move || store.put_definition(large))
        };
        while !admitting.is_finished() {
            for i in 0..64 {
                assert!(store.get_definition(&format!("small-{i}")).is_some());
            }
        }

        assert!(admitting.join().unwrap().is_ok());
        assert_eq!(store.definition_count(), 65);
    }
}
