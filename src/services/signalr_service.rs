//! `azurerm_signalr_service`: the resource and the data source of the same name.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{decode, encode, normalize_location, state_id, ServiceContext};
use crate::client::SignalRClient;
use crate::error::{IdError, ProviderError};
use crate::migration::StateUpgrade;
use crate::models::{
    LiveTraceConfiguration, LogCategory, ManagedIdentity, ResourceLogConfiguration, ResourceSku,
    ServerlessSettings, ServerlessUpstreamSettings, SignalRCorsSettings, SignalRFeature,
    SignalRKeys, SignalRProperties, SignalRResource, SignalRTlsSettings, UpstreamAuthSettings,
    UpstreamTemplate, UserAssignedIdentity, CATEGORY_CONNECTIVITY_LOGS, CATEGORY_HTTP_REQUEST_LOGS,
    CATEGORY_MESSAGING_LOGS, FEATURE_ENABLE_CONNECTIVITY_LOGS, FEATURE_ENABLE_LIVE_TRACE,
    FEATURE_ENABLE_MESSAGING_LOGS, FEATURE_SERVICE_MODE,
};
use crate::poll::wait_for_state;
use crate::registration::{DataSourceDefinition, ResourceDefinition, ResourceKind};
use crate::resourceids::{ResourceId, SignalRId};
use crate::schema::{
    Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema, Validator,
};

/// Resource and data source type name.
pub const RESOURCE_TYPE: &str = "azurerm_signalr_service";

const SKU_NAMES: &[&str] = &["Free_F1", "Standard_S1", "Premium_P1"];
const SKU_CAPACITIES: &[i64] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
const SERVICE_MODES: &[&str] = &["Serverless", "Classic", "Default"];
const IDENTITY_TYPES: &[&str] = &["SystemAssigned", "UserAssigned"];

const FREE_SKU: &str = "Free_F1";
const DEFAULT_SERVICE_MODE: &str = "Default";

/// Attributes carried in the `properties` section of the wire model.
const PROPERTY_ATTRIBUTES: &[&str] = &[
    "cors",
    "upstream_endpoint",
    "serverless_connection_timeout_in_seconds",
    "identity",
    "public_network_access_enabled",
    "local_auth_enabled",
    "aad_auth_enabled",
    "tls_client_cert_enabled",
    "connectivity_logs_enabled",
    "messaging_logs_enabled",
    "http_request_logs_enabled",
    "service_mode",
    "live_trace_enabled",
    "live_trace",
];

/// Typed view of the resource state.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceModel {
    pub id: Option<String>,
    pub name: String,
    pub location: String,
    pub resource_group_name: String,
    pub sku: Vec<SkuModel>,
    pub connectivity_logs_enabled: bool,
    pub messaging_logs_enabled: bool,
    pub http_request_logs_enabled: bool,
    pub live_trace_enabled: bool,
    pub live_trace: Vec<LiveTraceModel>,
    pub public_network_access_enabled: bool,
    pub local_auth_enabled: bool,
    pub aad_auth_enabled: bool,
    pub tls_client_cert_enabled: bool,
    pub serverless_connection_timeout_in_seconds: i64,
    pub service_mode: String,
    pub upstream_endpoint: Vec<UpstreamEndpointModel>,
    pub cors: Vec<CorsModel>,
    pub identity: Vec<IdentityModel>,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub public_port: Option<i64>,
    pub server_port: Option<i64>,
    pub primary_access_key: Option<String>,
    pub primary_connection_string: Option<String>,
    pub secondary_access_key: Option<String>,
    pub secondary_connection_string: Option<String>,
    pub tags: BTreeMap<String, String>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkuModel {
    pub name: String,
    pub capacity: i64,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveTraceModel {
    pub enabled: bool,
    pub connectivity_logs_enabled: bool,
    pub messaging_logs_enabled: bool,
    pub http_request_logs_enabled: bool,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamEndpointModel {
    pub category_pattern: Vec<String>,
    pub event_pattern: Vec<String>,
    pub hub_pattern: Vec<String>,
    pub url_template: String,
    pub user_assigned_identity_id: String,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsModel {
    pub allowed_origins: Vec<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityModel {
    #[serde(rename = "type")]
    pub identity_type: String,
    pub identity_ids: Vec<String>,
    pub principal_id: Option<String>,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DataSourceModel {
    name: String,
    resource_group_name: String,
}

/// The registry entry for the resource.
pub fn resource() -> ResourceDefinition {
    ResourceDefinition::new(ResourceKind::SignalRService, schema(), import)
        .with_upgrader(StateUpgrade::ServiceV0ToV1)
}

/// The registry entry for the data source.
pub fn data_source() -> DataSourceDefinition {
    DataSourceDefinition {
        kind: ResourceKind::SignalRService,
        schema: data_source_schema(),
    }
}

/// Seed state for importing `id`.
pub fn import(id: &str) -> Result<Value, IdError> {
    let id = SignalRId::parse(id)?;
    Ok(json!({
        "id": id.id(),
        "name": id.signal_r_name,
        "resource_group_name": id.resource_group_name,
    }))
}

fn string_list() -> AttributeType {
    AttributeType::list(AttributeType::String)
}

fn string_set() -> AttributeType {
    AttributeType::set(AttributeType::String)
}

fn bool_default(value: bool) -> Attribute {
    Attribute::optional_bool().with_default(json!(value))
}

fn required_patterns() -> Attribute {
    Attribute::new(string_list(), AttributeFlags::required()).with_validator(Validator::StringIsNotEmpty)
}

fn identity_block() -> NestedBlock {
    let block = Block::new()
        .with_attribute(
            "type",
            Attribute::required_string().with_validator(Validator::StringInSlice {
                values: IDENTITY_TYPES,
                ignore_case: false,
            }),
        )
        .with_attribute(
            "identity_ids",
            Attribute::new(string_set(), AttributeFlags::optional()),
        )
        .with_attribute("principal_id", Attribute::computed_string())
        .with_attribute("tenant_id", Attribute::computed_string());
    NestedBlock::list(block).with_max_items(1)
}

fn tags() -> Attribute {
    Attribute::new(AttributeType::map(AttributeType::String), AttributeFlags::optional())
}

/// Schema version 1 of the resource.
pub fn schema() -> Schema {
    let sku = Block::new()
        .with_attribute(
            "name",
            Attribute::required_string().with_validator(Validator::StringInSlice {
                values: SKU_NAMES,
                ignore_case: false,
            }),
        )
        .with_attribute(
            "capacity",
            Attribute::required_int64().with_validator(Validator::IntInSlice(SKU_CAPACITIES)),
        );

    let live_trace = Block::new()
        .with_attribute("enabled", bool_default(true))
        .with_attribute("connectivity_logs_enabled", bool_default(true))
        .with_attribute("messaging_logs_enabled", bool_default(true))
        .with_attribute("http_request_logs_enabled", bool_default(true));

    let upstream = Block::new()
        .with_attribute("category_pattern", required_patterns())
        .with_attribute("event_pattern", required_patterns())
        .with_attribute("hub_pattern", required_patterns())
        .with_attribute(
            "url_template",
            Attribute::required_string().with_validator(Validator::UrlTemplate),
        )
        .with_attribute(
            "user_assigned_identity_id",
            Attribute::optional_string().with_validator(Validator::IsUuid),
        );

    let cors = Block::new().with_attribute(
        "allowed_origins",
        Attribute::new(string_set(), AttributeFlags::required()),
    );

    Schema::new(1)
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "name",
            Attribute::required_string()
                .with_force_new()
                .with_validator(Validator::StringIsNotEmpty),
        )
        .with_attribute("location", Attribute::required_string().with_force_new())
        .with_attribute(
            "resource_group_name",
            Attribute::required_string()
                .with_force_new()
                .with_validator(Validator::StringIsNotEmpty),
        )
        .with_block("sku", NestedBlock::list(sku).with_min_items(1).with_max_items(1))
        .with_attribute("connectivity_logs_enabled", bool_default(false))
        .with_attribute("messaging_logs_enabled", bool_default(false))
        .with_attribute("http_request_logs_enabled", bool_default(false))
        .with_attribute(
            "live_trace_enabled",
            bool_default(false).with_deprecation(
                "`live_trace_enabled` has been deprecated in favor of `live_trace` and will be removed in 4.0.",
            ),
        )
        .with_block("live_trace", NestedBlock::list(live_trace).with_max_items(1))
        .with_attribute("public_network_access_enabled", bool_default(true))
        .with_attribute("local_auth_enabled", bool_default(true))
        .with_attribute("aad_auth_enabled", bool_default(true))
        .with_attribute("tls_client_cert_enabled", bool_default(false))
        .with_attribute(
            "serverless_connection_timeout_in_seconds",
            Attribute::optional_int64().with_default(json!(30)),
        )
        .with_attribute(
            "service_mode",
            Attribute::optional_string()
                .with_default(json!(DEFAULT_SERVICE_MODE))
                .with_validator(Validator::StringInSlice {
                    values: SERVICE_MODES,
                    ignore_case: false,
                }),
        )
        .with_block("upstream_endpoint", NestedBlock::set(upstream))
        .with_block("cors", NestedBlock::list(cors).with_computed())
        .with_block("identity", identity_block())
        .with_attribute("hostname", Attribute::computed_string())
        .with_attribute("ip_address", Attribute::computed_string())
        .with_attribute("public_port", Attribute::computed_int64())
        .with_attribute("server_port", Attribute::computed_int64())
        .with_attribute("primary_access_key", Attribute::computed_string().sensitive())
        .with_attribute("primary_connection_string", Attribute::computed_string().sensitive())
        .with_attribute("secondary_access_key", Attribute::computed_string().sensitive())
        .with_attribute("secondary_connection_string", Attribute::computed_string().sensitive())
        .with_attribute("tags", tags())
}

/// Schema of the data source.
pub fn data_source_schema() -> Schema {
    let identity = Block::new()
        .with_attribute("type", Attribute::computed_string())
        .with_attribute("identity_ids", Attribute::new(string_set(), AttributeFlags::computed()))
        .with_attribute("principal_id", Attribute::computed_string())
        .with_attribute("tenant_id", Attribute::computed_string());

    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "name",
            Attribute::required_string().with_validator(Validator::StringIsNotEmpty),
        )
        .with_attribute(
            "resource_group_name",
            Attribute::required_string().with_validator(Validator::StringIsNotEmpty),
        )
        .with_attribute("location", Attribute::computed_string())
        .with_attribute("hostname", Attribute::computed_string())
        .with_attribute("ip_address", Attribute::computed_string())
        .with_attribute("public_port", Attribute::computed_int64())
        .with_attribute("server_port", Attribute::computed_int64())
        .with_attribute("public_network_access_enabled", Attribute::computed_bool())
        .with_attribute("local_auth_enabled", Attribute::computed_bool())
        .with_attribute("aad_auth_enabled", Attribute::computed_bool())
        .with_attribute("tls_client_cert_enabled", Attribute::computed_bool())
        .with_attribute(
            "serverless_connection_timeout_in_seconds",
            Attribute::computed_int64(),
        )
        .with_block("identity", NestedBlock::list(identity).with_computed())
        .with_attribute("primary_access_key", Attribute::computed_string().sensitive())
        .with_attribute("primary_connection_string", Attribute::computed_string().sensitive())
        .with_attribute("secondary_access_key", Attribute::computed_string().sensitive())
        .with_attribute("secondary_connection_string", Attribute::computed_string().sensitive())
        .with_attribute(
            "tags",
            Attribute::new(AttributeType::map(AttributeType::String), AttributeFlags::computed()),
        )
}

// =========================================================================
// CRUD
// =========================================================================

/// Create the service described by `planned`.
pub async fn create<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    planned: Value,
) -> Result<Value, ProviderError> {
    let model: ServiceModel = decode(&schema(), &planned)?;
    let id = SignalRId::new(ctx.subscription()?, &model.resource_group_name, &model.name);

    let existing = ctx
        .client
        .get(&id)
        .await
        .map_err(|e| e.context(format!("checking for presence of existing {}", id)))?;
    if existing.is_some() {
        return Err(ProviderError::import_as_exists(RESOURCE_TYPE, &id.id()));
    }

    let resource = expand_service(&model)?;
    ctx.client
        .create_or_update(&id, resource)
        .await
        .map_err(|e| e.context(format!("creating {}", id)))?;

    wait_for_provisioning(ctx, &id, ctx.config.timeouts.create()).await?;
    info!(id = %id.id(), "created SignalR Service");

    read_existing(ctx, &id, model)
        .await?
        .ok_or_else(|| ProviderError::NotFound(format!("{} vanished after creation", id)))
}

/// Refresh `state`. Returns `Value::Null` when the service no longer exists.
pub async fn read<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    state: Value,
) -> Result<Value, ProviderError> {
    let id = SignalRId::parse(state_id(&state)?)?;
    let prior: ServiceModel = decode(&schema(), &state)?;

    match read_existing(ctx, &id, prior).await? {
        Some(state) => Ok(state),
        None => {
            debug!("{} was not found - removing from state", id);
            Ok(Value::Null)
        },
    }
}

/// Apply the sections that differ between `prior` and `planned`.
pub async fn update<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    prior: Value,
    planned: Value,
) -> Result<Value, ProviderError> {
    let id = SignalRId::parse(state_id(&prior)?)?;
    let _guard = ctx.locks.by_id(&id.id()).await;

    let schema = schema();
    let old: ServiceModel = decode(&schema, &prior)?;
    let new: ServiceModel = decode(&schema, &planned)?;

    let existing = ctx
        .client
        .get(&id)
        .await
        .map_err(|e| e.context(format!("retrieving {}", id)))?
        .ok_or_else(|| ProviderError::NotFound(format!("retrieving {}", id)))?;
    let current_sku = existing.sku.map(|sku| sku.name).unwrap_or_default();

    let patch = expand_patch(&old, &new, current_sku)?;
    ctx.client
        .update(&id, patch)
        .await
        .map_err(|e| e.context(format!("updating {}", id)))?;

    wait_for_provisioning(ctx, &id, ctx.config.timeouts.update()).await?;
    info!(id = %id.id(), "updated SignalR Service");

    read_existing(ctx, &id, new)
        .await?
        .ok_or_else(|| ProviderError::NotFound(format!("{} vanished during update", id)))
}

/// Delete the service. A service that is already gone counts as deleted.
pub async fn delete<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    state: Value,
) -> Result<(), ProviderError> {
    let id = SignalRId::parse(state_id(&state)?)?;
    let _guard = ctx.locks.by_id(&id.id()).await;

    match ctx.client.delete(&id).await {
        Ok(()) => info!(id = %id.id(), "deleted SignalR Service"),
        Err(err) if err.is_not_found() => debug!("{} was already gone", id),
        Err(err) => return Err(err.context(format!("deleting {}", id)).into()),
    }
    Ok(())
}

/// Look a service up by `name` and `resource_group_name`.
pub async fn read_data_source<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    config: Value,
) -> Result<Value, ProviderError> {
    let schema = data_source_schema();
    let query: DataSourceModel = decode(&schema, &config)?;
    let id = SignalRId::new(ctx.subscription()?, &query.resource_group_name, &query.name);

    let mut state = read_existing(ctx, &id, ServiceModel::default())
        .await?
        .ok_or_else(|| ProviderError::NotFound(format!("{} was not found", id)))?;

    if let Value::Object(map) = &mut state {
        map.retain(|key, _| {
            schema.block.attributes.contains_key(key) || schema.block.blocks.contains_key(key)
        });
    }
    Ok(state)
}

async fn read_existing<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    id: &SignalRId,
    prior: ServiceModel,
) -> Result<Option<Value>, ProviderError> {
    let Some(resource) = ctx
        .client
        .get(id)
        .await
        .map_err(|e| e.context(format!("retrieving {}", id)))?
    else {
        return Ok(None);
    };

    let keys = ctx
        .client
        .list_keys(id)
        .await
        .map_err(|e| e.context(format!("listing keys for {}", id)))?;

    encode(&flatten_service(id, &resource, &keys, prior)).map(Some)
}

async fn wait_for_provisioning<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    id: &SignalRId,
    timeout: Duration,
) -> Result<(), ProviderError> {
    let conf = ctx.provisioning(timeout);
    let client = ctx.client;

    let state = wait_for_state(&conf, || async move {
        client
            .get(id)
            .await
            .map(|resource| resource.and_then(|r| r.provisioning_state().map(str::to_string)))
            .map_err(|e| e.context(format!("polling for the provisioning state of {}", id)))
    })
    .await?;

    debug!(id = %id.id(), state = %state, "provisioning finished");
    Ok(())
}

// =========================================================================
// Expand
// =========================================================================

fn free_tier_checks(
    sku_name: &str,
    public_network_access_enabled: Option<bool>,
    tls_client_cert_enabled: Option<bool>,
) -> Result<(), ProviderError> {
    if sku_name != FREE_SKU {
        return Ok(());
    }
    if public_network_access_enabled == Some(false) {
        return Err(ProviderError::Validation(
            "SKU Free_F1 does not support disabling public network access".to_string(),
        ));
    }
    if tls_client_cert_enabled == Some(true) {
        return Err(ProviderError::Validation(
            "SKU Free_F1 does not support enabling tls client cert".to_string(),
        ));
    }
    Ok(())
}

fn public_network_access(enabled: bool) -> String {
    (if enabled { "Enabled" } else { "Disabled" }).to_string()
}

/// The full resource sent on create.
pub fn expand_service(model: &ServiceModel) -> Result<SignalRResource, ProviderError> {
    let sku = expand_sku(&model.sku)?;

    let service_mode = if model.service_mode.is_empty() {
        DEFAULT_SERVICE_MODE
    } else {
        model.service_mode.as_str()
    };
    let features = vec![
        SignalRFeature::new(FEATURE_ENABLE_CONNECTIVITY_LOGS, model.connectivity_logs_enabled.to_string()),
        SignalRFeature::new(FEATURE_ENABLE_MESSAGING_LOGS, model.messaging_logs_enabled.to_string()),
        SignalRFeature::new(FEATURE_ENABLE_LIVE_TRACE, model.live_trace_enabled.to_string()),
        SignalRFeature::new(FEATURE_SERVICE_MODE, service_mode),
    ];

    let properties = SignalRProperties {
        features: Some(features),
        cors: Some(expand_cors(&model.cors)),
        upstream: Some(expand_upstream(&model.upstream_endpoint)),
        live_trace_configuration: expand_live_trace(&model.live_trace),
        resource_log_configuration: Some(resource_log_configuration(
            model.connectivity_logs_enabled,
            model.messaging_logs_enabled,
            model.http_request_logs_enabled,
        )),
        public_network_access: Some(public_network_access(model.public_network_access_enabled)),
        disable_aad_auth: Some(!model.aad_auth_enabled),
        disable_local_auth: Some(!model.local_auth_enabled),
        tls: Some(SignalRTlsSettings {
            client_cert_enabled: Some(model.tls_client_cert_enabled),
        }),
        serverless: Some(ServerlessSettings {
            connection_timeout_in_seconds: Some(model.serverless_connection_timeout_in_seconds),
        }),
        ..Default::default()
    };

    if !model.upstream_endpoint.is_empty() && !properties.is_serverless() {
        return Err(ProviderError::Validation(
            "Upstream configurations are only allowed when the SignalR Service is in `Serverless` mode"
                .to_string(),
        ));
    }

    free_tier_checks(
        &sku.name,
        Some(model.public_network_access_enabled),
        Some(model.tls_client_cert_enabled),
    )?;

    Ok(SignalRResource {
        location: Some(normalize_location(&model.location)),
        sku: Some(sku),
        identity: expand_identity(&model.identity)?,
        properties: Some(properties),
        tags: Some(model.tags.clone().into_iter().collect()),
        ..Default::default()
    })
}

/// The partial resource sent on update: only the sections that changed.
///
/// `current_sku` is the SKU the service has now; the free-tier rules are
/// checked against the new SKU when that changes too.
pub fn expand_patch(
    old: &ServiceModel,
    new: &ServiceModel,
    mut current_sku: String,
) -> Result<SignalRResource, ProviderError> {
    let mut patch = SignalRResource::default();

    if old.sku != new.sku {
        let sku = expand_sku(&new.sku)?;
        current_sku = sku.name.clone();
        patch.sku = Some(sku);
    }

    let old_state = encode(old)?;
    let new_state = encode(new)?;
    let changed = |key: &str| old_state.get(key) != new_state.get(key);

    if PROPERTY_ATTRIBUTES.iter().any(|key| changed(key)) {
        let mut props = SignalRProperties::default();

        if changed("cors") {
            props.cors = Some(expand_cors(&new.cors));
        }

        if changed("upstream_endpoint") {
            props.upstream = Some(expand_upstream(&new.upstream_endpoint));
        }

        if changed("serverless_connection_timeout_in_seconds") {
            props.serverless = Some(ServerlessSettings {
                connection_timeout_in_seconds: Some(new.serverless_connection_timeout_in_seconds),
            });
        }

        if changed("identity") {
            patch.identity = Some(expand_identity(&new.identity)?.unwrap_or_else(|| ManagedIdentity {
                identity_type: "None".to_string(),
                ..Default::default()
            }));
        }

        if changed("public_network_access_enabled") {
            free_tier_checks(&current_sku, Some(new.public_network_access_enabled), None)?;
            props.public_network_access = Some(public_network_access(new.public_network_access_enabled));
        }

        if changed("local_auth_enabled") {
            props.disable_local_auth = Some(!new.local_auth_enabled);
        }

        if changed("aad_auth_enabled") {
            props.disable_aad_auth = Some(!new.aad_auth_enabled);
        }

        if changed("tls_client_cert_enabled") {
            free_tier_checks(&current_sku, None, Some(new.tls_client_cert_enabled))?;
            props.tls = Some(SignalRTlsSettings {
                client_cert_enabled: Some(new.tls_client_cert_enabled),
            });
        }

        let logs_changed = ["connectivity_logs_enabled", "messaging_logs_enabled", "http_request_logs_enabled"]
            .iter()
            .any(|key| changed(key));
        if logs_changed || changed("live_trace_enabled") || changed("service_mode") {
            let mut features = Vec::new();
            if logs_changed {
                features.push(SignalRFeature::new(
                    FEATURE_ENABLE_CONNECTIVITY_LOGS,
                    new.connectivity_logs_enabled.to_string(),
                ));
                features.push(SignalRFeature::new(
                    FEATURE_ENABLE_MESSAGING_LOGS,
                    new.messaging_logs_enabled.to_string(),
                ));
                props.resource_log_configuration = Some(resource_log_configuration(
                    new.connectivity_logs_enabled,
                    new.messaging_logs_enabled,
                    new.http_request_logs_enabled,
                ));
            }
            if changed("live_trace_enabled") {
                features.push(SignalRFeature::new(FEATURE_ENABLE_LIVE_TRACE, new.live_trace_enabled.to_string()));
            }
            if changed("service_mode") {
                let mode = if new.service_mode.is_empty() {
                    DEFAULT_SERVICE_MODE
                } else {
                    new.service_mode.as_str()
                };
                features.push(SignalRFeature::new(FEATURE_SERVICE_MODE, mode));
            }
            props.features = Some(features);
        }

        if changed("live_trace") {
            props.live_trace_configuration = expand_live_trace(&new.live_trace);
        }

        patch.properties = Some(props);
    }

    if old.tags != new.tags {
        patch.tags = Some(new.tags.clone().into_iter().collect());
    }

    Ok(patch)
}

fn expand_sku(input: &[SkuModel]) -> Result<ResourceSku, ProviderError> {
    let sku = input
        .first()
        .ok_or_else(|| ProviderError::Validation("`sku` is required".to_string()))?;
    Ok(ResourceSku {
        name: sku.name.clone(),
        capacity: Some(sku.capacity),
    })
}

fn expand_cors(input: &[CorsModel]) -> SignalRCorsSettings {
    SignalRCorsSettings {
        allowed_origins: input.first().map(|cors| cors.allowed_origins.clone()),
    }
}

fn expand_upstream(input: &[UpstreamEndpointModel]) -> ServerlessUpstreamSettings {
    let templates = input
        .iter()
        .map(|setting| UpstreamTemplate {
            hub_pattern: Some(setting.hub_pattern.join(",")),
            event_pattern: Some(setting.event_pattern.join(",")),
            category_pattern: Some(setting.category_pattern.join(",")),
            url_template: setting.url_template.clone(),
            auth: Some(UpstreamAuthSettings::for_identity(&setting.user_assigned_identity_id)),
        })
        .collect();

    ServerlessUpstreamSettings {
        templates: Some(templates),
    }
}

fn expand_live_trace(input: &[LiveTraceModel]) -> Option<LiveTraceConfiguration> {
    let live_trace = input.first()?;
    Some(LiveTraceConfiguration {
        enabled: Some(live_trace.enabled.to_string()),
        categories: Some(vec![
            LogCategory::new(CATEGORY_MESSAGING_LOGS, live_trace.messaging_logs_enabled),
            LogCategory::new(CATEGORY_CONNECTIVITY_LOGS, live_trace.connectivity_logs_enabled),
            LogCategory::new(CATEGORY_HTTP_REQUEST_LOGS, live_trace.http_request_logs_enabled),
        ]),
    })
}

fn resource_log_configuration(connectivity: bool, messaging: bool, http: bool) -> ResourceLogConfiguration {
    ResourceLogConfiguration {
        categories: Some(vec![
            LogCategory::new(CATEGORY_MESSAGING_LOGS, messaging),
            LogCategory::new(CATEGORY_CONNECTIVITY_LOGS, connectivity),
            LogCategory::new(CATEGORY_HTTP_REQUEST_LOGS, http),
        ]),
    }
}

fn expand_identity(input: &[IdentityModel]) -> Result<Option<ManagedIdentity>, ProviderError> {
    let Some(identity) = input.first() else {
        return Ok(None);
    };

    let user_assigned = identity.identity_type == "UserAssigned";
    if !user_assigned && !identity.identity_ids.is_empty() {
        return Err(ProviderError::Validation(
            "expanding `identity`: `identity_ids` can only be specified when `type` is `UserAssigned`"
                .to_string(),
        ));
    }
    if user_assigned && identity.identity_ids.is_empty() {
        return Err(ProviderError::Validation(
            "expanding `identity`: `identity_ids` must be specified when `type` is `UserAssigned`"
                .to_string(),
        ));
    }

    let user_assigned_identities = user_assigned.then(|| {
        identity
            .identity_ids
            .iter()
            .map(|id| (id.clone(), UserAssignedIdentity::default()))
            .collect::<HashMap<_, _>>()
    });

    Ok(Some(ManagedIdentity {
        identity_type: identity.identity_type.clone(),
        user_assigned_identities,
        ..Default::default()
    }))
}

// =========================================================================
// Flatten
// =========================================================================

/// Overlay what the service reports onto `model`.
///
/// Attributes the service does not report keep their value from `model`.
pub fn flatten_service(
    id: &SignalRId,
    resource: &SignalRResource,
    keys: &SignalRKeys,
    mut model: ServiceModel,
) -> ServiceModel {
    model.id = Some(id.id());
    model.name = id.signal_r_name.clone();
    model.resource_group_name = id.resource_group_name.clone();

    if let Some(location) = &resource.location {
        model.location = normalize_location(location);
    }

    model.sku = resource
        .sku
        .iter()
        .map(|sku| SkuModel {
            name: sku.name.clone(),
            capacity: sku.capacity.unwrap_or(0),
        })
        .collect();

    if let Some(props) = &resource.properties {
        model.hostname = props.host_name.clone();
        model.ip_address = props.external_ip.clone();
        model.public_port = props.public_port;
        model.server_port = props.server_port;

        model.live_trace_enabled = false;
        model.service_mode = DEFAULT_SERVICE_MODE.to_string();
        for feature in props.features.iter().flatten() {
            match feature.flag.as_str() {
                FEATURE_ENABLE_LIVE_TRACE => {
                    model.live_trace_enabled = feature.value.eq_ignore_ascii_case("true")
                },
                FEATURE_SERVICE_MODE => model.service_mode = feature.value.clone(),
                _ => {},
            }
        }

        model.aad_auth_enabled = !props.disable_aad_auth.unwrap_or(false);
        model.local_auth_enabled = !props.disable_local_auth.unwrap_or(false);
        model.public_network_access_enabled = props
            .public_network_access
            .as_deref()
            .map_or(true, |access| access.eq_ignore_ascii_case("Enabled"));
        model.tls_client_cert_enabled = props
            .tls
            .as_ref()
            .and_then(|tls| tls.client_cert_enabled)
            .unwrap_or(false);

        if let Some(timeout) = props
            .serverless
            .as_ref()
            .and_then(|serverless| serverless.connection_timeout_in_seconds)
        {
            model.serverless_connection_timeout_in_seconds = timeout;
        }

        model.cors = flatten_cors(props.cors.as_ref());
        model.upstream_endpoint = flatten_upstream(props.upstream.as_ref());
        model.live_trace = flatten_live_trace(props.live_trace_configuration.as_ref());

        if let Some(categories) = props
            .resource_log_configuration
            .as_ref()
            .and_then(|config| config.categories.as_ref())
        {
            let (mut connectivity, mut messaging, mut http) = (false, false, false);
            for category in categories {
                match category.name.as_deref() {
                    Some(CATEGORY_MESSAGING_LOGS) => messaging = category.is_enabled(),
                    Some(CATEGORY_CONNECTIVITY_LOGS) => connectivity = category.is_enabled(),
                    Some(CATEGORY_HTTP_REQUEST_LOGS) => http = category.is_enabled(),
                    _ => {},
                }
            }
            model.connectivity_logs_enabled = connectivity;
            model.messaging_logs_enabled = messaging;
            model.http_request_logs_enabled = http;
        }
    }

    model.identity = flatten_identity(resource.identity.as_ref());
    model.tags = resource
        .tags
        .clone()
        .unwrap_or_default()
        .into_iter()
        .collect();

    model.primary_access_key = keys.primary_key.clone();
    model.primary_connection_string = keys.primary_connection_string.clone();
    model.secondary_access_key = keys.secondary_key.clone();
    model.secondary_connection_string = keys.secondary_connection_string.clone();

    model
}

fn split_pattern(pattern: Option<&str>) -> Vec<String> {
    pattern
        .map(|p| p.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

fn flatten_upstream(input: Option<&ServerlessUpstreamSettings>) -> Vec<UpstreamEndpointModel> {
    input
        .and_then(|settings| settings.templates.as_ref())
        .into_iter()
        .flatten()
        .map(|template| UpstreamEndpointModel {
            category_pattern: split_pattern(template.category_pattern.as_deref()),
            event_pattern: split_pattern(template.event_pattern.as_deref()),
            hub_pattern: split_pattern(template.hub_pattern.as_deref()),
            url_template: template.url_template.clone(),
            user_assigned_identity_id: template
                .auth
                .as_ref()
                .and_then(UpstreamAuthSettings::identity_resource)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

fn flatten_cors(input: Option<&SignalRCorsSettings>) -> Vec<CorsModel> {
    input
        .map(|cors| CorsModel {
            allowed_origins: cors.allowed_origins.clone().unwrap_or_default(),
        })
        .into_iter()
        .collect()
}

fn flatten_live_trace(input: Option<&LiveTraceConfiguration>) -> Vec<LiveTraceModel> {
    let Some(config) = input else {
        return Vec::new();
    };

    let mut live_trace = LiveTraceModel {
        enabled: config
            .enabled
            .as_deref()
            .is_some_and(|enabled| enabled.eq_ignore_ascii_case("true")),
        ..Default::default()
    };
    for category in config.categories.iter().flatten() {
        match category.name.as_deref() {
            Some(CATEGORY_MESSAGING_LOGS) => live_trace.messaging_logs_enabled = category.is_enabled(),
            Some(CATEGORY_CONNECTIVITY_LOGS) => live_trace.connectivity_logs_enabled = category.is_enabled(),
            Some(CATEGORY_HTTP_REQUEST_LOGS) => live_trace.http_request_logs_enabled = category.is_enabled(),
            _ => {},
        }
    }
    vec![live_trace]
}

fn flatten_identity(input: Option<&ManagedIdentity>) -> Vec<IdentityModel> {
    let Some(identity) = input.filter(|i| !i.identity_type.eq_ignore_ascii_case("None")) else {
        return Vec::new();
    };

    let mut identity_ids: Vec<String> = identity
        .user_assigned_identities
        .iter()
        .flat_map(|ids| ids.keys().cloned())
        .collect();
    identity_ids.sort();

    vec![IdentityModel {
        identity_type: identity.identity_type.clone(),
        identity_ids,
        principal_id: identity.principal_id.clone(),
        tenant_id: identity.tenant_id.clone(),
    }]
}
