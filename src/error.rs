//! Error types for resource IDs and provider operations.

use thiserror::Error;

use crate::client::ClientError;
use crate::poll::PollError;

/// Errors produced while parsing or validating an ARM resource ID.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is not an ARM-style path at all.
    #[error("parsing {id:?}: {reason}")]
    Malformed {
        /// The offending input.
        id: String,
        /// Why the input could not be tokenized.
        reason: &'static str,
    },

    /// An expected literal segment is absent.
    #[error("ID was missing the `{segment}` element")]
    MissingElement {
        /// The literal segment that was expected.
        segment: &'static str,
    },

    /// The literal segment is present but its value is empty.
    #[error("ID was missing the value for the `{segment}` element")]
    MissingValue {
        /// The literal segment whose value is empty.
        segment: &'static str,
    },

    /// A segment was found where none (or a different one) was expected.
    #[error("ID contains a segment that was not expected, `{segment}`")]
    UnexpectedSegment {
        /// The literal segment as it appeared in the input.
        segment: String,
    },

    /// The `providers` segment names a different resource provider.
    #[error("ID expected the resource provider `{expected}` but got `{actual}`")]
    UnexpectedNamespace {
        /// The namespace the ID type requires.
        expected: &'static str,
        /// The namespace found in the input.
        actual: String,
    },

    /// A validated value was not a string.
    #[error("expected {key:?} to be a string")]
    TypeMismatch {
        /// The attribute key being validated.
        key: String,
    },
}

impl IdError {
    /// Returns true if an expected element or its value is missing.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            IdError::MissingElement { .. } | IdError::MissingValue { .. }
        )
    }
}

/// Errors that can occur when running provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A resource ID could not be parsed.
    #[error("Invalid resource ID: {0}")]
    InvalidId(#[from] IdError),

    /// The resource-manager API returned an error.
    #[error("API error: {0}")]
    Api(#[from] ClientError),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Operation timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Operation failed due to current state (precondition not met).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::AlreadyExists(msg)
            | Self::DeadlineExceeded(msg)
            | Self::FailedPrecondition(msg)
            | Self::Unimplemented(msg) => msg.clone(),
            Self::InvalidId(err) => err.to_string(),
            Self::Api(err) => err.to_string(),
            Self::Serialization(err) => err.to_string(),
        }
    }

    /// Build the error Terraform surfaces when a resource must be imported first.
    pub fn import_as_exists(resource_type: &str, id: &str) -> Self {
        Self::AlreadyExists(format!(
            "A resource with the ID {:?} already exists - to be managed via Terraform this resource \
             needs to be imported into the State. Please see the resource documentation for {:?} \
             for more information.",
            id, resource_type
        ))
    }
}

impl From<PollError> for ProviderError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Timeout { .. } => ProviderError::DeadlineExceeded(err.to_string()),
            PollError::Refresh(inner) => ProviderError::Api(inner),
            PollError::UnexpectedState { .. } | PollError::MissingState => {
                ProviderError::FailedPrecondition(err.to_string())
            }
        }
    }
}
