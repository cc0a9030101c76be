use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpatialError>;

/// Rejections reported by the gesture classifier and the scroll projector.
///
/// Noise, jitter and grace-period expiry are normal control flow and never
/// surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpatialError {
    /// The request itself is malformed; the call was a no-op.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A collaborator could not provide what the call depends on (no pose
    /// source for a node, degenerate viewer scale). Only the affected call
    /// or record is aborted.
    #[error("precondition violated: {message}")]
    PreconditionViolation { message: String },
}

impl SpatialError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
