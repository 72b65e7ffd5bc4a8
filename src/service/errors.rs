use thiserror::Error;

use crate::registry::RegistryError;
use crate::workflows::{TransitionError, ValidationError};

/// Every outcome a caller of the service can be refused with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("workflowdefinition not found")]
    DefinitionNotFound { id: String },

    #[error("instance not found")]
    InstanceNotFound { id: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Registry(RegistryError::Validation(err))
    }
}

impl ServiceError {
    /// Stable machine-readable name of the rejection.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::DefinitionNotFound { .. } => "DefinitionNotFound",
            ServiceError::InstanceNotFound { .. } => "InstanceNotFound",
            ServiceError::Registry(e) => e.kind(),
            ServiceError::Transition(e) => e.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::DefinitionNotFound { .. } | ServiceError::InstanceNotFound { .. }
        )
    }
}
