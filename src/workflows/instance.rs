use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One committed transition. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionHistoryItem {
    #[serde(alias = "actionid")]
    pub action_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "fromstate")]
    pub from_state: String,
    #[serde(alias = "tostate")]
    pub to_state: String,
}

/// A live execution of a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub id: String,
    #[serde(alias = "workflowdefinitionid")]
    pub workflow_definition_id: String,
    #[serde(alias = "currentstate")]
    current_state: String,
    #[serde(default)]
    history: Vec<ActionHistoryItem>,
}

impl WorkflowInstance {
    /// Fresh instance with a random v4 id and empty history.
    pub fn new(workflow_definition_id: impl Into<String>, current_state: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_definition_id: workflow_definition_id.into(),
            current_state: current_state.into(),
            history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    /// Committed transitions, oldest first. The last entry always ends at `current_state`.
    pub fn history(&self) -> &[ActionHistoryItem] {
        &self.history
    }

    pub fn last_transition(&self) -> Option<&ActionHistoryItem> {
        self.history.last()
    }

    /// Appends the record and moves `current_state` to its destination in one step.
    pub(crate) fn commit(&mut self, item: ActionHistoryItem) {
        self.current_state = item.to_state.clone();
        self.history.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_instances_get_unique_ids() {
        let a = WorkflowInstance::new("wf", "s1");
        let b = WorkflowInstance::new("wf", "s1");
        assert_ne!(a.id, b.id);
        assert!(a.history().is_empty());
        assert!(a.last_transition().is_none());
    }

    #[test]
    fn test_commit_updates_state_and_history_together() {
        let mut instance = WorkflowInstance::new("wf", "s1");
        instance.commit(ActionHistoryItem {
            action_id: "a1".to_string(),
            timestamp: Utc::now(),
            from_state: "s1".to_string(),
            to_state: "s2".to_string(),
        });

        assert_eq!(instance.current_state(), "s2");
        assert_eq!(instance.history().len(), 1);
        assert_eq!(instance.last_transition().unwrap().from_state, "s1");
    }

    #[test]
    fn test_serializes_history_with_camel_case_fields() {
        let mut instance = WorkflowInstance::new("wf", "s1");
        instance.commit(ActionHistoryItem {
            action_id: "a1".to_string(),
            timestamp: Utc::now(),
            from_state: "s1".to_string(),
            to_state: "s2".to_string(),
        });

        let value = serde_json::to_value(&instance).unwrap();
        assert_eq!(value["workflowDefinitionId"], "wf");
        assert_eq!(value["currentState"], "s2");
        assert_eq!(value["history"][0]["actionId"], "a1");
        assert_eq!(value["history"][0]["fromState"], "s1");
    }
}
