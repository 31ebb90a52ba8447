//! `AzureSignalRProvider`: the registry, configuration and client composed
//! behind [`ProviderService`].

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::client::SignalRClient;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::locks::ResourceLocks;
use crate::registration::{Registration, ResourceKind};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::services::{normalize_location, signalr_service, web_pubsub_hub, ServiceContext};
use crate::types::{diff_attributes, ImportedResource, PlanResult};
use crate::validation;

/// The SignalR / Web PubSub provider.
///
/// Until [`ProviderService::configure`] runs, the configuration is the
/// default one with the subscription taken from the environment.
pub struct AzureSignalRProvider<C: SignalRClient> {
    client: C,
    registration: Registration,
    config: RwLock<ProviderConfig>,
    locks: ResourceLocks,
}

impl<C: SignalRClient> AzureSignalRProvider<C> {
    /// Create a provider talking to the service through `client`.
    pub fn new(client: C) -> Self {
        Self::with_config(client, ProviderConfig::default().resolve_from_env())
    }

    /// Create a provider with an already resolved configuration.
    pub fn with_config(client: C, config: ProviderConfig) -> Self {
        Self {
            client,
            registration: Registration::new(),
            config: RwLock::new(config),
            locks: ResourceLocks::new(),
        }
    }

    /// The client the provider talks through.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The resource and data source registry.
    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    /// A snapshot of the current configuration.
    pub async fn config(&self) -> ProviderConfig {
        self.config.read().await.clone()
    }

    fn context<'a>(&'a self, config: &'a ProviderConfig) -> ServiceContext<'a, C> {
        ServiceContext {
            client: &self.client,
            config,
            locks: &self.locks,
        }
    }
}

/// Run `op` under `limit`, turning expiry into `DeadlineExceeded`.
async fn with_timeout<T, F>(limit: Duration, what: String, op: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::DeadlineExceeded(format!(
            "{} did not finish within {:?}",
            what, limit
        ))),
    }
}

fn log_failure<T>(result: Result<T, ProviderError>, operation: &str, resource_type: &str) -> Result<T, ProviderError> {
    if let Err(e) = &result {
        error!(resource_type, error = %e, "{} failed", operation);
    }
    result
}

/// Keep the prior location when the planned one differs only in case or spacing.
fn suppress_location_diff(prior: &Value, planned: &mut Value) {
    let prior_location = prior.get("location").and_then(Value::as_str);
    let planned_location = planned.get("location").and_then(Value::as_str);
    if let (Some(before), Some(after)) = (prior_location, planned_location) {
        if before != after && normalize_location(before) == normalize_location(after) {
            let before = Value::String(before.to_string());
            if let Some(map) = planned.as_object_mut() {
                map.insert("location".to_string(), before);
            }
        }
    }
}

#[async_trait::async_trait]
impl<C: SignalRClient> ProviderService for AzureSignalRProvider<C> {
    fn schema(&self) -> ProviderSchema {
        self.registration.provider_schema(ProviderConfig::schema())
    }

    #[instrument(skip(self, config), name = "provider.validate_provider_config")]
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(count = diagnostics.len(), "provider configuration is invalid");
            return Ok(diagnostics);
        }

        let resolved = ProviderConfig::from_value(config)?.resolve_from_env();
        diagnostics.extend(resolved.diagnostics());
        Ok(diagnostics)
    }

    #[instrument(skip(self, config), name = "provider.configure")]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let resolved = log_failure(ProviderConfig::from_value(config), "Configure", "provider")?
            .resolve_from_env();
        let diagnostics = resolved.diagnostics();
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(count = diagnostics.len(), "provider configuration rejected");
            return Ok(diagnostics);
        }

        *self.config.write().await = resolved;
        info!("provider configured");
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        info!("provider stopping");
        Ok(())
    }

    #[instrument(skip(self, config), name = "provider.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let def = self.registration.resource(resource_type)?;
        let diagnostics = validation::validate(&def.schema, &config);
        if !diagnostics.is_empty() {
            warn!(resource_type, count = diagnostics.len(), "resource configuration has diagnostics");
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, state), name = "provider.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: u64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let def = self.registration.resource(resource_type)?;
        log_failure(def.upgrade_state(version, state), "UpgradeResourceState", resource_type)
    }

    #[instrument(skip(self, prior_state, proposed_state, _config), name = "provider.plan")]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let def = self.registration.resource(resource_type)?;
        let prior = prior_state.filter(|state| !state.is_null());

        if proposed_state.is_null() {
            let prior = prior.unwrap_or(Value::Null);
            let changes = diff_attributes(&prior, &Value::Null);
            debug!(resource_type, "planning destroy");
            return Ok(PlanResult::with_changes(Value::Null, changes, false));
        }

        let mut planned = proposed_state;
        def.schema.block.apply_defaults(&mut planned);

        let Some(prior) = prior else {
            let changes = diff_attributes(&Value::Null, &planned);
            debug!(resource_type, changes = changes.len(), "planning create");
            return Ok(PlanResult::with_changes(planned, changes, false));
        };

        if let Some(map) = planned.as_object_mut() {
            for key in def.schema.computed_keys() {
                let unset = map.get(key).map_or(true, Value::is_null);
                match prior.get(key) {
                    Some(value) if unset && !value.is_null() => {
                        map.insert(key.to_string(), value.clone());
                    },
                    _ => {},
                }
            }
        }
        suppress_location_diff(&prior, &mut planned);

        let changes = diff_attributes(&prior, &planned);
        if changes.is_empty() {
            return Ok(PlanResult::no_change(planned));
        }

        let force_new = def.schema.force_new_keys();
        let requires_replace = changes
            .iter()
            .any(|change| force_new.contains(&change.path.as_str()));
        debug!(resource_type, changes = changes.len(), requires_replace, "planning update");
        Ok(PlanResult::with_changes(planned, changes, requires_replace))
    }

    #[instrument(skip(self, planned_state), name = "provider.create")]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let kind = self.registration.resource(resource_type)?.kind;
        let config = self.config().await;
        let ctx = self.context(&config);

        let op = async {
            match kind {
                ResourceKind::SignalRService => signalr_service::create(&ctx, planned_state).await,
                ResourceKind::WebPubsubHub => web_pubsub_hub::create(&ctx, planned_state).await,
            }
        };
        let what = format!("creating {}", resource_type);
        log_failure(with_timeout(config.timeouts.create(), what, op).await, "Create", resource_type)
    }

    #[instrument(skip(self, current_state), name = "provider.read")]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let kind = self.registration.resource(resource_type)?.kind;
        let config = self.config().await;
        let ctx = self.context(&config);

        let op = async {
            match kind {
                ResourceKind::SignalRService => signalr_service::read(&ctx, current_state).await,
                ResourceKind::WebPubsubHub => web_pubsub_hub::read(&ctx, current_state).await,
            }
        };
        let what = format!("reading {}", resource_type);
        log_failure(with_timeout(config.timeouts.read(), what, op).await, "Read", resource_type)
    }

    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let kind = self.registration.resource(resource_type)?.kind;
        let config = self.config().await;
        let ctx = self.context(&config);

        let op = async {
            match kind {
                ResourceKind::SignalRService => {
                    signalr_service::update(&ctx, prior_state, planned_state).await
                },
                ResourceKind::WebPubsubHub => web_pubsub_hub::update(&ctx, prior_state, planned_state).await,
            }
        };
        let what = format!("updating {}", resource_type);
        log_failure(with_timeout(config.timeouts.update(), what, op).await, "Update", resource_type)
    }

    #[instrument(skip(self, current_state), name = "provider.delete")]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let kind = self.registration.resource(resource_type)?.kind;
        let config = self.config().await;
        let ctx = self.context(&config);

        let op = async {
            match kind {
                ResourceKind::SignalRService => signalr_service::delete(&ctx, current_state).await,
                ResourceKind::WebPubsubHub => web_pubsub_hub::delete(&ctx, current_state).await,
            }
        };
        let what = format!("deleting {}", resource_type);
        log_failure(with_timeout(config.timeouts.delete(), what, op).await, "Delete", resource_type)
    }

    #[instrument(skip(self), name = "provider.import_resource")]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let def = self.registration.resource(resource_type)?;
        let seed = log_failure((def.importer)(id).map_err(ProviderError::from), "Import", resource_type)?;

        let state = self.read(resource_type, seed).await?;
        if state.is_null() {
            return Err(ProviderError::NotFound(format!(
                "cannot import non-existent remote object {}",
                id
            )));
        }
        info!(resource_type, id, "imported resource");
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    #[instrument(skip(self, config), name = "provider.validate_data_source_config")]
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let def = self.registration.data_source(data_source_type)?;
        Ok(validation::validate(&def.schema, &config))
    }

    #[instrument(skip(self, config), name = "provider.read_data_source")]
    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        let kind = self.registration.data_source(data_source_type)?.kind;
        let settings = self.config().await;
        let ctx = self.context(&settings);

        let op = async {
            match kind {
                ResourceKind::SignalRService => signalr_service::read_data_source(&ctx, config).await,
                ResourceKind::WebPubsubHub => Err(ProviderError::UnknownResource(format!(
                    "Unknown data source type: {}",
                    data_source_type
                ))),
            }
        };
        let what = format!("reading data source {}", data_source_type);
        log_failure(
            with_timeout(settings.timeouts.read(), what, op).await,
            "ReadDataSource",
            data_source_type,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemorySignalRClient;
    use serde_json::json;

    const SUBSCRIPTION: &str = "12345678-1234-9876-4563-123456789012";

    fn provider() -> AzureSignalRProvider<InMemorySignalRClient> {
        let config = ProviderConfig {
            subscription_id: Some(SUBSCRIPTION.to_string()),
            ..Default::default()
        };
        AzureSignalRProvider::with_config(InMemorySignalRClient::new(), config)
    }

    #[test]
    fn test_schema_lists_everything() {
        let provider = provider();
        let metadata = provider.metadata();
        assert_eq!(
            metadata.resources,
            vec!["azurerm_signalr_service", "azurerm_web_pubsub_hub"]
        );
        assert_eq!(metadata.data_sources, vec!["azurerm_signalr_service"]);
        assert!(provider.schema().provider.block.attributes.contains_key("subscription_id"));
    }

    #[tokio::test]
    async fn test_validate_provider_config() {
        let provider = provider();
        let diagnostics = provider
            .validate_provider_config(json!({"subscription_id": "not-a-uuid"}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("subscription_id"));

        let diagnostics = provider
            .validate_provider_config(json!({"subscription_id": SUBSCRIPTION}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_configure_stores_config() {
        let provider = provider();
        let diagnostics = provider
            .configure(json!({
                "subscription_id": "00000000-0000-0000-0000-000000000000",
                "timeouts": [{"create": 1}],
            }))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());

        let config = provider.config().await;
        assert_eq!(config.subscription_id.as_deref(), Some("00000000-0000-0000-0000-000000000000"));
        assert_eq!(config.timeouts.create(), Duration::from_secs(60));
        assert_eq!(config.timeouts.read(), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_configure_rejects_zero_timeout() {
        let provider = provider();
        let diagnostics = provider
            .configure(json!({"subscription_id": SUBSCRIPTION, "timeouts": {"delete": 0}}))
            .await
            .unwrap();
        assert!(diagnostics.iter().any(Diagnostic::is_error));
        assert_eq!(provider.config().await.timeouts.delete, 30);
    }

    #[tokio::test]
    async fn test_plan_create_applies_defaults() {
        let provider = provider();
        let plan = provider
            .plan(
                "azurerm_web_pubsub_hub",
                None,
                json!({"name": "hub", "web_pubsub_id": "x"}),
                json!({}),
            )
            .await
            .unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state["anonymous_connections_enabled"], false);
        assert!(plan.changes.iter().any(|c| c.path == "name"));
    }

    #[tokio::test]
    async fn test_plan_force_new_and_computed_carry() {
        let provider = provider();
        let prior = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.SignalRService/SignalR/one",
            "name": "one",
            "location": "West Europe",
            "resource_group_name": "rg",
            "hostname": "one.service.signalr.net",
        });

        let same = json!({"name": "one", "location": "westeurope", "resource_group_name": "rg"});
        let plan = provider
            .plan("azurerm_signalr_service", Some(prior.clone()), same, json!({}))
            .await
            .unwrap();
        assert_eq!(plan.planned_state["hostname"], "one.service.signalr.net");
        assert_eq!(plan.planned_state["location"], "West Europe");
        assert!(!plan.requires_replace);

        let renamed = json!({"name": "two", "location": "westeurope", "resource_group_name": "rg"});
        let plan = provider
            .plan("azurerm_signalr_service", Some(prior), renamed, json!({}))
            .await
            .unwrap();
        assert!(plan.requires_replace);
    }

    #[tokio::test]
    async fn test_plan_destroy() {
        let provider = provider();
        let plan = provider
            .plan("azurerm_web_pubsub_hub", Some(json!({"name": "hub"})), Value::Null, json!({}))
            .await
            .unwrap();
        assert!(plan.planned_state.is_null());
        assert_eq!(plan.changes.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = provider();
        let err = provider.read("azurerm_foo", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));

        let err = provider
            .read_data_source("azurerm_web_pubsub_hub", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_deadline_exceeded() {
        let result: Result<(), _> = with_timeout(Duration::from_millis(1), "sleeping".to_string(), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ProviderError::DeadlineExceeded(_))));
    }
}
