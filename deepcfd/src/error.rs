use thiserror::Error;

/// The error type for `DeepCFD-Burn` operations.
///
/// Every variant is raised while a model is being planned or built; once a
/// `DeepCfdNet` exists its wiring is known to be consistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeepCfdError {
    /// A skip map and an upsampled decoder map (or the decoded map and the
    /// requested output window) cannot be reconciled by cropping.
    #[error("Shape mismatch at {location}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Where in the graph the mismatch was found.
        location: String,
        /// The resolution required at that point.
        expected: String,
        /// The resolution actually produced.
        actual: String,
    },

    /// Error for when an invalid model configuration is provided.
    #[error("Invalid model configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error for when a policy name does not name a supported strategy.
    #[error("Unsupported {kind} policy: {name}")]
    UnsupportedPolicy {
        /// The policy family (upsampling, downsampling, decoder order).
        kind: &'static str,
        /// The name that failed to parse.
        name: String,
    },

    /// Error for when an input tensor does not match the model's input descriptor.
    #[error("Invalid input tensor shape: expected {expected}, got {actual}")]
    InvalidTensorShape {
        /// The expected tensor shape.
        expected: String,
        /// The actual tensor shape.
        actual: String,
    },
}

impl DeepCfdError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// A specialized `Result` type for `DeepCFD-Burn` operations.
pub type DeepCfdResult<T> = Result<T, DeepCfdError>;
