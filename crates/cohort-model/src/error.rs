use thiserror::Error;

/// Errors raised when a model specification is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("group column '{group}' is not listed among the model factors")]
    GroupNotInModel { group: String },
    #[error("interaction term '{left}:{right}' references an unknown factor")]
    UnknownInteractionFactor { left: String, right: String },
    #[error("interaction term '{name}:{name}' pairs a factor with itself")]
    SelfInteraction { name: String },
    #[error("factor '{name}' is listed more than once")]
    DuplicateFactor { name: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
