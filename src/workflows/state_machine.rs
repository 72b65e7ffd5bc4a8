// Transition engine: decides whether an action may move an instance and applies it.
// Every precondition is evaluated before the instance is touched, so a rejection
// never leaves a partial write behind.

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use super::definition::{ActionDef, State, WorkflowDefinition};
use super::instance::{ActionHistoryItem, WorkflowInstance};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no enabled initial state")]
    NoEnabledInitialState { workflow_id: String },

    #[error("current state is invalid or disabled")]
    InvalidCurrentState { state_id: String },

    #[error("instance is at a final state")]
    InstanceAtFinalState { state_id: String },

    #[error("action not found")]
    ActionNotFound { action_id: String },

    #[error("action is disabled")]
    ActionDisabled { action_id: String },

    #[error("action cannot be executed from current state")]
    ActionNotApplicableFromCurrentState { action_id: String, state_id: String },

    #[error("target state is invalid or disabled")]
    TargetStateInvalidOrDisabled { action_id: String, state_id: String },
}

impl TransitionError {
    pub fn kind(&self) -> &'static str {
        match self {
            TransitionError::NoEnabledInitialState { .. } => "NoEnabledInitialState",
            TransitionError::InvalidCurrentState { .. } => "InvalidCurrentState",
            TransitionError::InstanceAtFinalState { .. } => "InstanceAtFinalState",
            TransitionError::ActionNotFound { .. } => "ActionNotFound",
            TransitionError::ActionDisabled { .. } => "ActionDisabled",
            TransitionError::ActionNotApplicableFromCurrentState { .. } => {
                "ActionNotApplicableFromCurrentState"
            }
            TransitionError::TargetStateInvalidOrDisabled { .. } => "TargetStateInvalidOrDisabled",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionEngine;

impl TransitionEngine {
    pub fn new() -> Self {
        Self
    }

    /// New instance parked on the first state (definition order) that is both
    /// initial and enabled.
    pub fn instantiate(&self, def: &WorkflowDefinition) -> Result<WorkflowInstance, TransitionError> {
        let initial = def
            .states
            .iter()
            .find(|s| s.is_initial && s.enabled)
            .ok_or_else(|| TransitionError::NoEnabledInitialState {
                workflow_id: def.id.clone(),
            })?;

        Ok(WorkflowInstance::new(def.id.clone(), initial.id.clone()))
    }

    /// Fires `action_id` against `instance`, appending a history record and moving
    /// the current state. On error the instance is left untouched.
    pub fn execute(
        &self,
        def: &WorkflowDefinition,
        instance: &mut WorkflowInstance,
        action_id: &str,
    ) -> Result<ActionHistoryItem, TransitionError> {
        let (action, target) = self.check(def, instance.current_state(), action_id)?;

        let item = ActionHistoryItem {
            action_id: action.id.clone(),
            timestamp: Utc::now(),
            from_state: instance.current_state().to_string(),
            to_state: target.id.clone(),
        };
        instance.commit(item.clone());

        debug!(
            instance_id = %instance.id,
            action_id = %item.action_id,
            from_state = %item.from_state,
            to_state = %item.to_state,
            "Transition applied"
        );
        Ok(item)
    }

    /// Ids of the actions `execute` would currently accept, in definition order.
    pub fn available_actions(&self, def: &WorkflowDefinition, instance: &WorkflowInstance) -> Vec<String> {
        def.actions
            .iter()
            .filter(|a| self.check(def, instance.current_state(), &a.id).is_ok())
            .map(|a| a.id.clone())
            .collect()
    }

    // Preconditions in the order callers observe them; the first failure wins.
    fn check<'d>(
        &self,
        def: &'d WorkflowDefinition,
        current_state: &str,
        action_id: &str,
    ) -> Result<(&'d ActionDef, &'d State), TransitionError> {
        let current = def
            .state(current_state)
            .filter(|s| s.enabled)
            .ok_or_else(|| TransitionError::InvalidCurrentState {
                state_id: current_state.to_string(),
            })?;

        if current.is_final {
            return Err(TransitionError::InstanceAtFinalState {
                state_id: current.id.clone(),
            });
        }

        let action = def
            .action(action_id)
            .ok_or_else(|| TransitionError::ActionNotFound {
                action_id: action_id.to_string(),
            })?;

        if !action.enabled {
            return Err(TransitionError::ActionDisabled {
                action_id: action.id.clone(),
            });
        }

        if !action.fires_from(current_state) {
            return Err(TransitionError::ActionNotApplicableFromCurrentState {
                action_id: action.id.clone(),
                state_id: current_state.to_string(),
            });
        }

        let target = def
            .states
            .iter()
            .find(|s| s.id == action.to_state && s.enabled)
            .ok_or_else(|| TransitionError::TargetStateInvalidOrDisabled {
                action_id: action.id.clone(),
                state_id: action.to_state.clone(),
            })?;

        Ok((action, target))
    }
}
