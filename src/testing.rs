//! Test support: a harness around [`ProviderService`] and an in-memory
//! [`SignalRClient`].
//!
//! # Example
//!
//! ```
//! use azurerm_signalr_provider::testing::{InMemorySignalRClient, ProviderTester};
//! use azurerm_signalr_provider::{AzureSignalRProvider, ProviderConfig};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let config = ProviderConfig {
//!     subscription_id: Some("12345678-1234-9876-4563-123456789012".to_string()),
//!     ..Default::default()
//! };
//! let tester = ProviderTester::new(AzureSignalRProvider::with_config(
//!     InMemorySignalRClient::new(),
//!     config,
//! ));
//!
//! let state = tester
//!     .lifecycle_create(
//!         "azurerm_web_pubsub_hub",
//!         json!({
//!             "name": "chat",
//!             "web_pubsub_id": "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/rg/providers/Microsoft.SignalRService/webPubSub/wps",
//!         }),
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(state["name"], "chat");
//! # });
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ClientError, SignalRClient};
use crate::error::ProviderError;
use crate::models::{provisioning_state, SignalRKeys, SignalRProperties, SignalRResource, WebPubsubHub};
use crate::resourceids::{ResourceId, SignalRId, WebPubsubHubId};
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Drives a [`ProviderService`] the way the host would, one call at a time.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration.
    ///
    /// Returns `Ok(())` if validation passes (no error diagnostics).
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    ///
    /// Returns `Ok(())` if configuration succeeds.
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Full plan operation with explicit config.
    pub async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, prior_state, proposed_state, config)
            .await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Import `id`, returning the single imported state.
    pub async fn import_one(&self, resource_type: &str, id: &str) -> Result<Value, ProviderError> {
        let mut imported = self.import_resource(resource_type, id).await?;
        match (imported.pop(), imported.is_empty()) {
            (Some(resource), true) => Ok(resource.state),
            _ => Err(ProviderError::FailedPrecondition(format!(
                "expected exactly one imported {}",
                resource_type
            ))),
        }
    }

    /// Upgrade resource state written under schema `version`.
    pub async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: u64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .upgrade_resource_state(resource_type, version, state)
            .await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: plan → create → read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self.plan_create(resource_type, config).await?;

        let created_state = self
            .create(resource_type, plan_result.planned_state)
            .await?;

        self.read(resource_type, created_state).await
    }

    /// Run a full update lifecycle: plan → update → read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;

        let updated_state = self
            .update(resource_type, prior_state, plan_result.planned_state)
            .await?;

        self.read(resource_type, updated_state).await
    }

    /// Run a full delete lifecycle: plan → delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let _ = self
            .plan_delete(resource_type, current_state.clone())
            .await?;

        self.delete(resource_type, current_state).await
    }

    /// Run a full CRUD lifecycle: create → read → update → read → delete,
    /// then check that a refresh drops the resource from state.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created_state = self.lifecycle_create(resource_type, initial_config).await?;

        let updated_state = self
            .lifecycle_update(resource_type, created_state.clone(), updated_config)
            .await?;

        self.lifecycle_delete(resource_type, updated_state.clone())
            .await?;

        let gone = self.read(resource_type, updated_state.clone()).await?;
        if !gone.is_null() {
            return Err(ProviderError::FailedPrecondition(format!(
                "{} still exists after delete",
                resource_type
            )));
        }

        Ok(updated_state)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

/// Check diagnostics and return an error if there are any errors.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changes.iter().map(|c| c.path.as_str()).collect()
}

/// Assert a plan creates the resource: attributes appear and nothing is
/// replaced.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty() && plan.changes.iter().all(|c| c.before.is_none()),
        "expected a create plan, got changes to {:?}",
        changed_paths(plan)
    );
    assert!(!plan.requires_replace, "a create plan must not replace");
}

/// Assert a plan destroys the resource: no planned state remains.
pub fn assert_plan_destroys(plan: &PlanResult) {
    assert!(plan.planned_state.is_null(), "expected a destroy plan, got {}", plan.planned_state);
    assert!(
        plan.changes.iter().all(|c| c.after.is_none()),
        "a destroy plan only removes attributes, got {:?}",
        changed_paths(plan)
    );
}

/// Assert a plan is empty.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(plan.changes.is_empty(), "expected no changes, got {:?}", changed_paths(plan));
}

/// Assert a plan forces replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "expected replacement, changes to {:?} update in place",
        changed_paths(plan)
    );
}

/// Assert a plan updates in place.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "expected an in-place update, changes to {:?} force replacement",
        changed_paths(plan)
    );
}

/// Assert `path` is among the changed attributes.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let changed = changed_paths(plan);
    assert!(changed.contains(&path), "expected '{}' to change, changed: {:?}", path, changed);
}

/// Assert `path` is not among the changed attributes.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    let changed = changed_paths(plan);
    assert!(!changed.contains(&path), "expected '{}' to be unchanged, changed: {:?}", path, changed);
}

/// Assert some error diagnostic is attached to the attribute at `path`.
pub fn assert_error_at(diagnostics: &[Diagnostic], path: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| matches!(d.severity, DiagnosticSeverity::Error) && d.attribute.as_deref() == Some(path)),
        "expected an error at '{}', got {:?}",
        path,
        diagnostics.iter().map(|d| (&d.summary, &d.attribute)).collect::<Vec<_>>()
    );
}

// =========================================================================
// In-memory client
// =========================================================================

#[derive(Debug, Default)]
struct Store {
    services: BTreeMap<String, SignalRResource>,
    hubs: BTreeMap<String, WebPubsubHub>,
    patches: Vec<SignalRResource>,
    provisioning_script: VecDeque<String>,
    failures: HashMap<&'static str, ClientError>,
    calls: HashMap<&'static str, usize>,
}

/// A [`SignalRClient`] backed by maps, for tests.
///
/// Services come back `Succeeded` with a hostname, ports and keys derived
/// from their name. Clones share the same store, so a test can keep a handle
/// while the provider owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemorySignalRClient {
    store: Arc<Mutex<Store>>,
}

impl InMemorySignalRClient {
    /// An empty client.
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, operation: &'static str) -> Result<MutexGuard<'_, Store>, ClientError> {
        let mut store = self.store();
        *store.calls.entry(operation).or_default() += 1;
        match store.failures.remove(operation) {
            Some(err) => Err(err),
            None => Ok(store),
        }
    }

    /// Provisioning states reported by the next `get` calls, one per call,
    /// before the stored state is reported again.
    pub fn script_provisioning_states<I, S>(&self, states: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.store()
            .provisioning_script
            .extend(states.into_iter().map(Into::into));
    }

    /// Fail the next call to `operation` (`"get"`, `"create_or_update"`,
    /// `"update"`, `"delete"`, `"list_keys"`, `"get_hub"`,
    /// `"create_or_update_hub"`, `"delete_hub"`) with `err`.
    pub fn fail_next(&self, operation: &'static str, err: ClientError) {
        self.store().failures.insert(operation, err);
    }

    /// How many times `operation` was called.
    pub fn calls(&self, operation: &str) -> usize {
        self.store().calls.get(operation).copied().unwrap_or_default()
    }

    /// The stored service, if any.
    pub fn service(&self, id: &SignalRId) -> Option<SignalRResource> {
        self.store().services.get(&id.id()).cloned()
    }

    /// Store a service as if it had been created outside the provider.
    pub fn insert_service(&self, id: &SignalRId, resource: SignalRResource) {
        self.store().services.insert(id.id(), provisioned(id, resource));
    }

    /// Drop a service as if it had been deleted outside the provider.
    pub fn remove_service(&self, id: &SignalRId) -> Option<SignalRResource> {
        self.store().services.remove(&id.id())
    }

    /// Every patch sent through `update`, oldest first.
    pub fn patches(&self) -> Vec<SignalRResource> {
        self.store().patches.clone()
    }

    /// The stored hub, if any.
    pub fn hub(&self, id: &WebPubsubHubId) -> Option<WebPubsubHub> {
        self.store().hubs.get(&id.id()).cloned()
    }

    /// Store a hub as if it had been created outside the provider.
    pub fn insert_hub(&self, id: &WebPubsubHubId, hub: WebPubsubHub) {
        self.store().hubs.insert(id.id(), stamped_hub(id, hub));
    }

    /// Drop a hub as if it had been deleted outside the provider.
    pub fn remove_hub(&self, id: &WebPubsubHubId) -> Option<WebPubsubHub> {
        self.store().hubs.remove(&id.id())
    }
}

fn provisioned(id: &SignalRId, mut resource: SignalRResource) -> SignalRResource {
    let name = &id.signal_r_name;
    resource.id = Some(id.id());
    resource.name = Some(name.clone());

    let props = resource.properties.get_or_insert_with(SignalRProperties::default);
    props.provisioning_state = Some(provisioning_state::SUCCEEDED.to_string());
    props.host_name = Some(format!("{}.service.signalr.net", name));
    props.external_ip = Some("10.0.0.4".to_string());
    props.public_port = Some(443);
    props.server_port = Some(443);
    resource
}

fn stamped_hub(id: &WebPubsubHubId, mut hub: WebPubsubHub) -> WebPubsubHub {
    hub.id = Some(id.id());
    hub.name = Some(id.hub_name.clone());
    hub
}

/// Overlay the fields present in `patch` onto `base`. Objects merge, anything
/// else replaces.
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        },
        (base, patch) => *base = patch,
    }
}

fn apply_patch(existing: &SignalRResource, patch: &SignalRResource) -> Result<SignalRResource, ClientError> {
    let invalid = |e: serde_json::Error| ClientError::Status {
        code: 400,
        message: format!("invalid patch: {}", e),
    };
    let mut merged = serde_json::to_value(existing).map_err(invalid)?;
    merge(&mut merged, serde_json::to_value(patch).map_err(invalid)?);
    let mut merged: SignalRResource = serde_json::from_value(merged).map_err(invalid)?;

    // features merge by flag rather than replacing the list
    let patched = patch.properties.as_ref().and_then(|p| p.features.as_ref());
    if let (Some(patched), Some(props)) = (patched, merged.properties.as_mut()) {
        let mut features = existing
            .properties
            .as_ref()
            .and_then(|p| p.features.clone())
            .unwrap_or_default();
        for feature in patched {
            match features.iter_mut().find(|f| f.flag == feature.flag) {
                Some(current) => *current = feature.clone(),
                None => features.push(feature.clone()),
            }
        }
        props.features = Some(features);
    }
    Ok(merged)
}

#[async_trait]
impl SignalRClient for InMemorySignalRClient {
    async fn get(&self, id: &SignalRId) -> Result<Option<SignalRResource>, ClientError> {
        let mut store = self.enter("get")?;
        let scripted = store.provisioning_script.pop_front();
        let Some(mut resource) = store.services.get(&id.id()).cloned() else {
            return Ok(None);
        };
        if let Some(state) = scripted {
            resource
                .properties
                .get_or_insert_with(SignalRProperties::default)
                .provisioning_state = Some(state);
        }
        Ok(Some(resource))
    }

    async fn create_or_update(
        &self,
        id: &SignalRId,
        resource: SignalRResource,
    ) -> Result<SignalRResource, ClientError> {
        let mut store = self.enter("create_or_update")?;
        let resource = provisioned(id, resource);
        store.services.insert(id.id(), resource.clone());
        Ok(resource)
    }

    async fn update(&self, id: &SignalRId, patch: SignalRResource) -> Result<SignalRResource, ClientError> {
        let mut store = self.enter("update")?;
        let existing = store
            .services
            .get(&id.id())
            .ok_or_else(|| ClientError::not_found(id))?;
        let updated = provisioned(id, apply_patch(existing, &patch)?);

        store.patches.push(patch);
        store.services.insert(id.id(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: &SignalRId) -> Result<(), ClientError> {
        let mut store = self.enter("delete")?;
        store
            .services
            .remove(&id.id())
            .map(|_| ())
            .ok_or_else(|| ClientError::not_found(id))
    }

    async fn list_keys(&self, id: &SignalRId) -> Result<SignalRKeys, ClientError> {
        let store = self.enter("list_keys")?;
        if !store.services.contains_key(&id.id()) {
            return Err(ClientError::not_found(id));
        }

        let name = &id.signal_r_name;
        let connection_string = |key: &str| {
            format!(
                "Endpoint=https://{}.service.signalr.net;AccessKey={};Version=1.0;",
                name, key
            )
        };
        let primary = format!("{}-primary-key", name);
        let secondary = format!("{}-secondary-key", name);
        Ok(SignalRKeys {
            primary_connection_string: Some(connection_string(&primary)),
            secondary_connection_string: Some(connection_string(&secondary)),
            primary_key: Some(primary),
            secondary_key: Some(secondary),
        })
    }

    async fn get_hub(&self, id: &WebPubsubHubId) -> Result<Option<WebPubsubHub>, ClientError> {
        let store = self.enter("get_hub")?;
        Ok(store.hubs.get(&id.id()).cloned())
    }

    async fn create_or_update_hub(
        &self,
        id: &WebPubsubHubId,
        hub: WebPubsubHub,
    ) -> Result<WebPubsubHub, ClientError> {
        let mut store = self.enter("create_or_update_hub")?;
        let hub = stamped_hub(id, hub);
        store.hubs.insert(id.id(), hub.clone());
        Ok(hub)
    }

    async fn delete_hub(&self, id: &WebPubsubHubId) -> Result<(), ClientError> {
        let mut store = self.enter("delete_hub")?;
        store
            .hubs
            .remove(&id.id())
            .map(|_| ())
            .ok_or_else(|| ClientError::not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Polling, ProviderConfig};
    use crate::models::ResourceSku;
    use crate::provider::AzureSignalRProvider;
    use crate::types::AttributeChange;
    use serde_json::json;

    const SUBSCRIPTION: &str = "12345678-1234-9876-4563-123456789012";

    fn tester(client: InMemorySignalRClient) -> ProviderTester<AzureSignalRProvider<InMemorySignalRClient>> {
        let config = ProviderConfig {
            subscription_id: Some(SUBSCRIPTION.to_string()),
            polling: Polling {
                interval_ms: 1,
                continuous_target_occurrence: 1,
            },
            ..Default::default()
        };
        ProviderTester::new(AzureSignalRProvider::with_config(client, config))
    }

    fn service_id() -> SignalRId {
        SignalRId::new(SUBSCRIPTION, "rg", "svc")
    }

    #[tokio::test]
    async fn test_client_get_reports_script_then_stored_state() {
        let client = InMemorySignalRClient::new();
        client.insert_service(&service_id(), SignalRResource::default());
        client.script_provisioning_states(["Updating"]);

        let first = client.get(&service_id()).await.unwrap().unwrap();
        assert_eq!(first.provisioning_state(), Some("Updating"));
        let second = client.get(&service_id()).await.unwrap().unwrap();
        assert_eq!(second.provisioning_state(), Some("Succeeded"));
        assert_eq!(client.calls("get"), 2);
    }

    #[tokio::test]
    async fn test_client_update_merges_patch() {
        let client = InMemorySignalRClient::new();
        client.insert_service(
            &service_id(),
            SignalRResource {
                location: Some("westeurope".to_string()),
                sku: Some(ResourceSku {
                    name: "Standard_S1".to_string(),
                    capacity: Some(1),
                }),
                ..Default::default()
            },
        );

        let patch = SignalRResource {
            sku: Some(ResourceSku {
                name: "Standard_S1".to_string(),
                capacity: Some(5),
            }),
            ..Default::default()
        };
        let updated = client.update(&service_id(), patch.clone()).await.unwrap();
        assert_eq!(updated.location.as_deref(), Some("westeurope"));
        assert_eq!(updated.sku.unwrap().capacity, Some(5));
        assert_eq!(client.patches(), vec![patch]);
    }

    #[tokio::test]
    async fn test_client_missing_resources() {
        let client = InMemorySignalRClient::new();
        assert!(client.get(&service_id()).await.unwrap().is_none());
        assert!(client.delete(&service_id()).await.unwrap_err().is_not_found());
        assert!(client.list_keys(&service_id()).await.unwrap_err().is_not_found());

        client.fail_next("get", ClientError::Transport("reset".to_string()));
        assert!(client.get(&service_id()).await.is_err());
        assert!(client.get(&service_id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_tester_resource_types() {
        let tester = tester(InMemorySignalRClient::new());
        assert_eq!(
            tester.resource_types(),
            vec!["azurerm_signalr_service", "azurerm_web_pubsub_hub"]
        );
        assert_eq!(tester.data_source_types(), vec!["azurerm_signalr_service"]);
        assert!(tester.schema().resources.contains_key("azurerm_web_pubsub_hub"));
    }

    #[tokio::test]
    async fn test_tester_configure_reports_diagnostics() {
        let tester = tester(InMemorySignalRClient::new());
        let err = tester
            .validate_provider_config(json!({"subscription_id": "nope"}))
            .await
            .unwrap_err();
        match err {
            TestError::Diagnostics(diags) => assert_error_at(&diags, "subscription_id"),
            TestError::Provider(e) => panic!("unexpected provider error: {}", e),
        }
        assert!(tester.configure(json!({"subscription_id": SUBSCRIPTION})).await.is_ok());
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud_hub() {
        let client = InMemorySignalRClient::new();
        let tester = tester(client.clone());
        let hub = json!({
            "name": "chat",
            "web_pubsub_id": "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/rg/providers/Microsoft.SignalRService/webPubSub/wps",
        });
        let mut opened = hub.clone();
        opened["anonymous_connections_enabled"] = json!(true);

        let state = tester
            .lifecycle_crud("azurerm_web_pubsub_hub", hub, opened)
            .await
            .unwrap();
        assert_eq!(state["anonymous_connections_enabled"], true);
        assert_eq!(client.calls("create_or_update_hub"), 2);
        assert_eq!(client.calls("delete_hub"), 1);
    }

    fn plan(changes: Vec<AttributeChange>, requires_replace: bool) -> PlanResult {
        PlanResult::with_changes(json!({"name": "chat"}), changes, requires_replace)
    }

    #[test]
    fn test_plan_assertions_accept_matching_plans() {
        let create = plan(vec![AttributeChange::added("name", json!("chat"))], false);
        assert_plan_creates(&create);
        assert_plan_changes_attribute(&create, "name");
        assert_plan_does_not_change_attribute(&create, "web_pubsub_id");

        let destroy = PlanResult::with_changes(Value::Null, vec![AttributeChange::removed("name", json!("chat"))], false);
        assert_plan_destroys(&destroy);
    }

    #[test]
    #[should_panic(expected = "expected replacement")]
    fn test_plan_replaces_rejects_in_place_update() {
        let update = plan(vec![AttributeChange::modified("sku", json!(1), json!(2))], false);
        assert_plan_updates_in_place(&update);
        assert_plan_replaces(&update);
    }

    #[test]
    #[should_panic(expected = "expected a create plan")]
    fn test_plan_creates_rejects_update() {
        assert_plan_creates(&plan(vec![AttributeChange::modified("sku", json!(1), json!(2))], false));
    }

    #[test]
    #[should_panic(expected = "expected an error at 'sku.0.capacity'")]
    fn test_error_at_ignores_warnings_and_other_paths() {
        let diagnostics = vec![
            Diagnostic::warning("deprecated").with_attribute("sku.0.capacity"),
            Diagnostic::error("Invalid value for attribute 'name'").with_attribute("name"),
        ];
        assert_error_at(&diagnostics, "name");
        assert_error_at(&diagnostics, "sku.0.capacity");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("Missing subscription").with_attribute("subscription_id"),
            Diagnostic::error("Timeout `read` must be at least one minute").with_detail("got 0"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("Missing subscription"));
        assert!(display.contains("Timeout `read`"));
        assert!(display.contains("subscription_id"));
        assert!(display.contains("got 0"));
    }
}
