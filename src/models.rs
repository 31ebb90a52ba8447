//! Wire models for the SignalR and Web PubSub resource-manager payloads.
//!
//! Every field the service may omit is an `Option`. Absent and "present but
//! default" are distinct: several flags are inverted between the wire and the
//! user-facing attributes (`disableAadAuth` against `aad_auth_enabled`), and an
//! absent wire value means the feature is enabled.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Feature flag controlling connectivity logs.
pub const FEATURE_ENABLE_CONNECTIVITY_LOGS: &str = "EnableConnectivityLogs";
/// Feature flag controlling messaging logs.
pub const FEATURE_ENABLE_MESSAGING_LOGS: &str = "EnableMessagingLogs";
/// Feature flag controlling live trace.
pub const FEATURE_ENABLE_LIVE_TRACE: &str = "EnableLiveTrace";
/// Feature flag holding the service mode.
pub const FEATURE_SERVICE_MODE: &str = "ServiceMode";

/// Resource log category for messaging logs.
pub const CATEGORY_MESSAGING_LOGS: &str = "MessagingLogs";
/// Resource log category for connectivity logs.
pub const CATEGORY_CONNECTIVITY_LOGS: &str = "ConnectivityLogs";
/// Resource log category for HTTP request logs.
pub const CATEGORY_HTTP_REQUEST_LOGS: &str = "HttpRequestLogs";

/// Provisioning states reported by the service.
pub mod provisioning_state {
    /// Terminal success state.
    pub const SUCCEEDED: &str = "Succeeded";
    /// Terminal failure state.
    pub const FAILED: &str = "Failed";
    /// The resource is being updated.
    pub const UPDATING: &str = "Updating";
    /// The resource is being created.
    pub const CREATING: &str = "Creating";
    /// The resource is moving between groups or subscriptions.
    pub const MOVING: &str = "Moving";
    /// An operation is running on the resource.
    pub const RUNNING: &str = "Running";
}

/// Upstream / event handler authentication types.
pub mod auth_type {
    /// No authentication.
    pub const NONE: &str = "None";
    /// Managed identity token authentication.
    pub const MANAGED_IDENTITY: &str = "ManagedIdentity";
}

/// A SignalR service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<ResourceSku>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ManagedIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SignalRProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

impl SignalRResource {
    /// The provisioning state, if the service reported one.
    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|props| props.provisioning_state.as_deref())
    }
}

/// Pricing tier of a SignalR service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSku {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
}

/// System and/or user assigned identities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedIdentity {
    #[serde(rename = "type")]
    pub identity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_assigned_identities: Option<HashMap<String, UserAssignedIdentity>>,
}

/// Details of one user assigned identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAssignedIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Properties of a SignalR service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, rename = "externalIP", skip_serializing_if = "Option::is_none")]
    pub external_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<SignalRFeature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<SignalRCorsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<ServerlessUpstreamSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_trace_configuration: Option<LiveTraceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_log_configuration: Option<ResourceLogConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_network_access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_aad_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_local_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<SignalRTlsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serverless: Option<ServerlessSettings>,
}

impl SignalRProperties {
    /// Whether the service runs in `Serverless` mode.
    pub fn is_serverless(&self) -> bool {
        self.features
            .as_deref()
            .and_then(|features| features.iter().find(|f| f.flag == FEATURE_SERVICE_MODE))
            .is_some_and(|f| f.value.eq_ignore_ascii_case("Serverless"))
    }
}

/// A `flag`/`value` pair toggling service behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRFeature {
    pub flag: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,
}

impl SignalRFeature {
    /// Build a feature without extra properties.
    pub fn new(flag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            value: value.into(),
            properties: None,
        }
    }
}

/// Cross-origin settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRCorsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

/// Upstream settings used in `Serverless` mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerlessUpstreamSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<UpstreamTemplate>>,
}

/// One upstream endpoint. Patterns are comma separated on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_pattern: Option<String>,
    pub url_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<UpstreamAuthSettings>,
}

/// Authentication for upstream calls and event handlers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamAuthSettings {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_identity: Option<ManagedIdentitySettings>,
}

impl UpstreamAuthSettings {
    /// Managed identity auth for `resource`, or no auth when `resource` is empty.
    pub fn for_identity(resource: &str) -> Self {
        if resource.is_empty() {
            return Self {
                auth_type: Some(auth_type::NONE.to_string()),
                managed_identity: None,
            };
        }
        Self {
            auth_type: Some(auth_type::MANAGED_IDENTITY.to_string()),
            managed_identity: Some(ManagedIdentitySettings {
                resource: Some(resource.to_string()),
            }),
        }
    }

    /// The managed identity resource, unless auth is absent or `None`.
    pub fn identity_resource(&self) -> Option<&str> {
        match self.auth_type.as_deref() {
            None | Some(auth_type::NONE) => None,
            Some(_) => self
                .managed_identity
                .as_ref()
                .and_then(|mi| mi.resource.as_deref()),
        }
    }
}

/// The managed identity resource used to acquire tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedIdentitySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

/// Live trace settings. Booleans are the strings `"true"`/`"false"` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTraceConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<LogCategory>>,
}

/// Resource log settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLogConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<LogCategory>>,
}

/// A named log category and its `"true"`/`"false"` state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<String>,
}

impl LogCategory {
    /// Build a category from a bool.
    pub fn new(name: &str, enabled: bool) -> Self {
        Self {
            name: Some(name.to_string()),
            enabled: Some(enabled.to_string()),
        }
    }

    /// Whether the wire value reads `true`, ignoring case.
    pub fn is_enabled(&self) -> bool {
        self.enabled
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

/// TLS settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRTlsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_cert_enabled: Option<bool>,
}

/// Serverless connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerlessSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout_in_seconds: Option<i64>,
}

/// Access keys of a SignalR service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_connection_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_connection_string: Option<String>,
}

/// A Web PubSub hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPubsubHub {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: WebPubsubHubProperties,
}

/// Properties of a Web PubSub hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPubsubHubProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_handlers: Option<Vec<EventHandler>>,
    /// `"allow"` or `"deny"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_connect_policy: Option<String>,
}

/// Where and how hub events are delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHandler {
    pub url_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_event_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_events: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<UpstreamAuthSettings>,
}
