// Workflow model, structural validation and the transition engine

pub mod definition;
pub mod instance;
pub mod state_machine;
pub mod validation;

pub use definition::{ActionDef, State, WorkflowDefinition};
pub use instance::{ActionHistoryItem, WorkflowInstance};
pub use state_machine::{TransitionEngine, TransitionError};
pub use validation::{validate_definition, StateReferenceRole, ValidationError};
