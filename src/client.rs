//! The resource-manager client the provider drives.
//!
//! Transport, authentication and retries belong to the implementation behind
//! [`SignalRClient`]. Long-running operations are expected to have completed
//! when a mutating call returns; the provider then polls provisioning state
//! itself where the service keeps working in the background.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{SignalRKeys, SignalRResource, WebPubsubHub};
use crate::resourceids::{SignalRId, WebPubsubHubId};

/// Errors returned by a [`SignalRClient`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The service answered with a non-success status.
    #[error("unexpected status {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Service error message.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Build a 404 error.
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::Status {
            code: 404,
            message: format!("{} was not found", what),
        }
    }

    /// Prefix the message with what was being attempted, keeping the status.
    pub fn context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Self::Status { code, message } => Self::Status {
                code,
                message: format!("{}: {}", context, message),
            },
            Self::Transport(message) => Self::Transport(format!("{}: {}", context, message)),
        }
    }

    /// Whether the service reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { code: 404, .. })
    }
}

/// Operations against `Microsoft.SignalRService`.
///
/// `get` and `get_hub` return `Ok(None)` when the resource does not exist.
#[async_trait]
pub trait SignalRClient: Send + Sync + 'static {
    /// Fetch a SignalR service.
    async fn get(&self, id: &SignalRId) -> Result<Option<SignalRResource>, ClientError>;

    /// Create or replace a SignalR service.
    async fn create_or_update(
        &self,
        id: &SignalRId,
        resource: SignalRResource,
    ) -> Result<SignalRResource, ClientError>;

    /// Patch a SignalR service. Absent fields are left unchanged.
    async fn update(
        &self,
        id: &SignalRId,
        patch: SignalRResource,
    ) -> Result<SignalRResource, ClientError>;

    /// Delete a SignalR service.
    async fn delete(&self, id: &SignalRId) -> Result<(), ClientError>;

    /// Fetch the access keys of a SignalR service.
    async fn list_keys(&self, id: &SignalRId) -> Result<SignalRKeys, ClientError>;

    /// Fetch a Web PubSub hub.
    async fn get_hub(&self, id: &WebPubsubHubId) -> Result<Option<WebPubsubHub>, ClientError>;

    /// Create or replace a Web PubSub hub.
    async fn create_or_update_hub(
        &self,
        id: &WebPubsubHubId,
        hub: WebPubsubHub,
    ) -> Result<WebPubsubHub, ClientError>;

    /// Delete a Web PubSub hub.
    async fn delete_hub(&self, id: &WebPubsubHubId) -> Result<(), ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let err = ClientError::not_found("SignalR Service \"svc\"");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "unexpected status 404: SignalR Service \"svc\" was not found"
        );

        assert!(!ClientError::Transport("connection reset".to_string()).is_not_found());
        assert!(!ClientError::Status {
            code: 409,
            message: "conflict".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_context_keeps_status() {
        let err = ClientError::not_found("hub").context("retrieving Hub \"h\"");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "unexpected status 404: retrieving Hub \"h\": hub was not found"
        );

        let err = ClientError::Transport("reset".to_string()).context("deleting");
        assert_eq!(err, ClientError::Transport("deleting: reset".to_string()));
    }
}
