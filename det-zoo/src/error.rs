use crate::{config::Mode, transform::TransformKind};
use thiserror::Error;

/// Failures of batch pipeline composition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// An operator is not allowed in the transform list of this mode.
    #[error("{kind} cannot be present in the {mode} transforms. Please check the {mode} transforms.")]
    Configuration { kind: TransformKind, mode: Mode },
    /// The model configuration is malformed.
    #[error("invalid model configuration: {0}")]
    InvariantViolation(String),
}
