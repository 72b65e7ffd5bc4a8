use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use super::definition::WorkflowDefinition;

/// Which end of an action pointed at an undeclared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateReferenceRole {
    Target,
    Source,
}

impl std::fmt::Display for StateReferenceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateReferenceRole::Target => write!(f, "tostate"),
            StateReferenceRole::Source => write!(f, "fromstates"),
        }
    }
}

/// Reasons a candidate definition is refused. Only the first failing check is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate state ids")]
    DuplicateStateId { state_id: String },

    #[error("must have exactly one initial state")]
    InvalidInitialStateCount { count: usize },

    #[error("action {action_id} {role} invalid")]
    UnknownStateReference {
        action_id: String,
        state_id: String,
        role: StateReferenceRole,
    },
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::DuplicateStateId { .. } => "DuplicateStateId",
            ValidationError::InvalidInitialStateCount { .. } => "InvalidInitialStateCount",
            ValidationError::UnknownStateReference { .. } => "UnknownStateReference",
        }
    }
}

/// Structural checks on a candidate definition, evaluated in order:
/// distinct state ids, a single initial state, resolvable action endpoints.
///
/// Action id uniqueness, empty `from_states` and reachability are deliberately
/// left unchecked.
pub fn validate_definition(def: &WorkflowDefinition) -> Result<(), ValidationError> {
    let mut state_ids = HashSet::with_capacity(def.states.len());
    for state in &def.states {
        if !state_ids.insert(state.id.as_str()) {
            return Err(ValidationError::DuplicateStateId {
                state_id: state.id.clone(),
            });
        }
    }

    let initial_count = def.states.iter().filter(|s| s.is_initial).count();
    if initial_count != 1 {
        return Err(ValidationError::InvalidInitialStateCount {
            count: initial_count,
        });
    }

    for action in &def.actions {
        if !state_ids.contains(action.to_state.as_str()) {
            return Err(ValidationError::UnknownStateReference {
                action_id: action.id.clone(),
                state_id: action.to_state.clone(),
                role: StateReferenceRole::Target,
            });
        }

        if let Some(unknown) = action
            .from_states
            .iter()
            .find(|id| !state_ids.contains(id.as_str()))
        {
            return Err(ValidationError::UnknownStateReference {
                action_id: action.id.clone(),
                state_id: unknown.clone(),
                role: StateReferenceRole::Source,
            });
        }
    }

    debug!(
        workflow_id = %def.id,
        states = def.states.len(),
        actions = def.actions.len(),
        "Workflow definition passed validation"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::definition::{ActionDef, State};

    fn linear_definition() -> WorkflowDefinition {
        WorkflowDefinition::new("wf", "Linear")
            .with_state(State::new("S1", "Start").initial())
            .with_state(State::new("S2", "Middle"))
            .with_state(State::new("S3", "End").terminal())
            .with_action(ActionDef::new("A1", "Advance", ["S1"], "S2"))
            .with_action(ActionDef::new("A2", "Finish", ["S2"], "S3"))
    }

    #[test]
    fn test_accepts_well_formed_definition() {
        assert_eq!(validate_definition(&linear_definition()), Ok(()));
    }

    #[test]
    fn test_rejects_duplicate_state_ids() {
        let def = linear_definition().with_state(State::new("S2", "Again"));
        let err = validate_definition(&def).unwrap_err();
        assert_eq!(err.kind(), "DuplicateStateId");
        assert_eq!(err.to_string(), "duplicate state ids");
    }

    #[test]
    fn test_rejects_two_initial_states() {
        let def = WorkflowDefinition::new("wf", "Forked")
            .with_state(State::new("S1", "One").initial())
            .with_state(State::new("S2", "Two").initial());

        let err = validate_definition(&def).unwrap_err();
        assert_eq!(err, ValidationError::InvalidInitialStateCount { count: 2 });
        assert_eq!(err.to_string(), "must have exactly one initial state");
    }

    #[test]
    fn test_rejects_missing_initial_state() {
        let def = WorkflowDefinition::new("wf", "Headless").with_state(State::new("S1", "One"));
        assert_eq!(
            validate_definition(&def),
            Err(ValidationError::InvalidInitialStateCount { count: 0 })
        );
    }

    #[test]
    fn test_rejects_empty_definition() {
        let def = WorkflowDefinition::new("wf", "Empty");
        assert_eq!(
            validate_definition(&def).unwrap_err().kind(),
            "InvalidInitialStateCount"
        );
    }

    #[test]
    fn test_rejects_unknown_target_state() {
        let def = linear_definition().with_action(ActionDef::new("A3", "Jump", ["S1"], "S9"));
        let err = validate_definition(&def).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownStateReference {
                action_id: "A3".to_string(),
                state_id: "S9".to_string(),
                role: StateReferenceRole::Target,
            }
        );
        assert_eq!(err.to_string(), "action A3 tostate invalid");
    }

    #[test]
    fn test_rejects_unknown_source_state() {
        let def = linear_definition().with_action(ActionDef::new("A3", "Jump", ["S1", "S7"], "S3"));
        let err = validate_definition(&def).unwrap_err();
        assert_eq!(err.kind(), "UnknownStateReference");
        assert_eq!(err.to_string(), "action A3 fromstates invalid");
    }

    #[test]
    fn test_duplicate_ids_reported_before_initial_count() {
        let def = WorkflowDefinition::new("wf", "Broken")
            .with_state(State::new("S1", "A"))
            .with_state(State::new("S1", "B"));
        assert_eq!(validate_definition(&def).unwrap_err().kind(), "DuplicateStateId");
    }

    #[test]
    fn test_permissive_on_unchecked_properties() {
        // Empty sources, repeated action ids and unreachable states all pass.
        let def = linear_definition()
            .with_state(State::new("Orphan", "Unreachable"))
            .with_action(ActionDef::new("A1", "Duplicate id", ["S2"], "S3"))
            .with_action(ActionDef::new("A4", "No sources", Vec::<String>::new(), "S3"));
        assert_eq!(validate_definition(&def), Ok(()));
    }

    #[test]
    fn test_disabled_initial_state_still_validates() {
        let def = WorkflowDefinition::new("wf", "Dormant")
            .with_state(State::new("S1", "Start").initial().disabled());
        assert_eq!(validate_definition(&def), Ok(()));
    }

    #[test]
    fn test_validation_is_deterministic() {
        let def = linear_definition().with_action(ActionDef::new("A3", "Jump", ["S1"], "S9"));
        assert_eq!(validate_definition(&def), validate_definition(&def));
    }
}
