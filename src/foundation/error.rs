/// Convenience result type used across the effect engine.
pub type FxResult<T> = Result<T, FxError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Surface allocation failures are absent: they are absorbed by dropping the
/// affected target from the working set.
#[derive(thiserror::Error, Debug)]
pub enum FxError {
    /// A raster operation was attempted on a target that holds no raster resource.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// `first_version` was called on a context that never recorded an applied effect.
    #[error("no applied effects")]
    NoAppliedEffects,

    /// Invalid caller-provided parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while executing a chain against targets.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FxError {
    /// Build a [`FxError::InvalidTarget`] value.
    pub fn invalid_target(msg: impl Into<String>) -> Self {
        Self::InvalidTarget(msg.into())
    }

    /// Build a [`FxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FxError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
