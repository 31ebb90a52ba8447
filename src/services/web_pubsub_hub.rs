//! `azurerm_web_pubsub_hub`.
//!
//! Hub mutations are serialized per parent Web PubSub service: the service
//! rejects concurrent writes to hubs of the same instance.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{decode, encode, state_id, ServiceContext};
use crate::client::SignalRClient;
use crate::error::{IdError, ProviderError};
use crate::locks::LockGuard;
use crate::migration::StateUpgrade;
use crate::models::{EventHandler, UpstreamAuthSettings, WebPubsubHub, WebPubsubHubProperties};
use crate::registration::{ResourceDefinition, ResourceKind};
use crate::resourceids::{ResourceId, WebPubsubHubId, WebPubsubId};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema, Validator};
use crate::validation;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "azurerm_web_pubsub_hub";

/// Lock namespace shared with the parent Web PubSub resource.
const WEB_PUBSUB_RESOURCE_NAME: &str = "azurerm_web_pubsub";

const SYSTEM_EVENTS: &[&str] = &["connect", "connected", "disconnected"];

const ALLOW: &str = "allow";
const DENY: &str = "deny";

/// Typed view of the resource state.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubModel {
    pub id: Option<String>,
    pub name: String,
    pub web_pubsub_id: String,
    pub event_handler: Vec<EventHandlerModel>,
    pub anonymous_connections_enabled: bool,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventHandlerModel {
    pub url_template: String,
    pub user_event_pattern: Option<String>,
    pub system_events: Vec<String>,
    pub auth: Vec<AuthModel>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthModel {
    pub managed_identity_id: String,
}

/// The registry entry for the resource.
pub fn resource() -> ResourceDefinition {
    ResourceDefinition::new(ResourceKind::WebPubsubHub, schema(), import)
        .with_upgrader(StateUpgrade::WebPubsubHubV0ToV1)
}

/// Seed state for importing `id`.
pub fn import(id: &str) -> Result<Value, IdError> {
    let id = WebPubsubHubId::parse(id)?;
    Ok(json!({
        "id": id.id(),
        "name": id.hub_name,
        "web_pubsub_id": id.web_pubsub_id().id(),
    }))
}

/// Schema version 1 of the resource.
pub fn schema() -> Schema {
    let auth = Block::new().with_attribute(
        "managed_identity_id",
        Attribute::required_string().with_validator(Validator::StringIsNotEmpty),
    );

    let event_handler = Block::new()
        .with_attribute(
            "url_template",
            Attribute::required_string().with_validator(Validator::UrlTemplate),
        )
        .with_attribute(
            "user_event_pattern",
            Attribute::optional_string().with_validator(Validator::StringIsNotEmpty),
        )
        .with_attribute(
            "system_events",
            Attribute::new(AttributeType::set(AttributeType::String), AttributeFlags::optional())
                .with_validator(Validator::StringInSlice {
                    values: SYSTEM_EVENTS,
                    ignore_case: false,
                }),
        )
        .with_block("auth", NestedBlock::list(auth).with_max_items(1));

    Schema::new(1)
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "name",
            Attribute::required_string()
                .with_force_new()
                .with_validator(Validator::StringIsNotEmpty),
        )
        .with_attribute(
            "web_pubsub_id",
            Attribute::required_string()
                .with_force_new()
                .with_validator(Validator::Func(validation::web_pubsub_id)),
        )
        .with_block("event_handler", NestedBlock::list(event_handler))
        .with_attribute(
            "anonymous_connections_enabled",
            Attribute::optional_bool().with_default(json!(false)),
        )
}

async fn lock_service<C: SignalRClient>(ctx: &ServiceContext<'_, C>, service: &WebPubsubId) -> LockGuard {
    ctx.locks
        .by_name(&service.web_pub_sub_name, WEB_PUBSUB_RESOURCE_NAME)
        .await
}

/// Create the hub described by `planned`.
pub async fn create<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    planned: Value,
) -> Result<Value, ProviderError> {
    let model: HubModel = decode(&schema(), &planned)?;
    let service = WebPubsubId::parse(&model.web_pubsub_id)?;
    let id = WebPubsubHubId::new(
        &service.subscription_id,
        &service.resource_group_name,
        &service.web_pub_sub_name,
        &model.name,
    );

    let _guard = lock_service(ctx, &service).await;

    let existing = ctx
        .client
        .get_hub(&id)
        .await
        .map_err(|e| e.context(format!("checking for presence of existing {}", id)))?;
    if existing.is_some() {
        return Err(ProviderError::import_as_exists(RESOURCE_TYPE, &id.id()));
    }

    ctx.client
        .create_or_update_hub(&id, expand_hub(&model))
        .await
        .map_err(|e| e.context(format!("creating {}", id)))?;
    info!(id = %id.id(), "created Web PubSub hub");

    read_existing(ctx, &id)
        .await?
        .ok_or_else(|| ProviderError::NotFound(format!("{} vanished after creation", id)))
}

/// Refresh `state`. Returns `Value::Null` when the hub no longer exists.
pub async fn read<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    state: Value,
) -> Result<Value, ProviderError> {
    let id = WebPubsubHubId::parse(state_id(&state)?)?;
    match read_existing(ctx, &id).await? {
        Some(state) => Ok(state),
        None => {
            debug!("{} was not found - removing from state", id);
            Ok(Value::Null)
        },
    }
}

/// Replace the hub's settings with `planned`.
pub async fn update<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    prior: Value,
    planned: Value,
) -> Result<Value, ProviderError> {
    let id = WebPubsubHubId::parse(state_id(&prior)?)?;
    let model: HubModel = decode(&schema(), &planned)?;

    let _guard = lock_service(ctx, &id.web_pubsub_id()).await;

    ctx.client
        .create_or_update_hub(&id, expand_hub(&model))
        .await
        .map_err(|e| e.context(format!("updating {}", id)))?;
    info!(id = %id.id(), "updated Web PubSub hub");

    read_existing(ctx, &id)
        .await?
        .ok_or_else(|| ProviderError::NotFound(format!("{} vanished during update", id)))
}

/// Delete the hub. A hub that is already gone counts as deleted.
pub async fn delete<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    state: Value,
) -> Result<(), ProviderError> {
    let id = WebPubsubHubId::parse(state_id(&state)?)?;
    let _guard = lock_service(ctx, &id.web_pubsub_id()).await;

    match ctx.client.delete_hub(&id).await {
        Ok(()) => info!(id = %id.id(), "deleted Web PubSub hub"),
        Err(err) if err.is_not_found() => debug!("{} was already gone", id),
        Err(err) => return Err(err.context(format!("deleting {}", id)).into()),
    }
    Ok(())
}

async fn read_existing<C: SignalRClient>(
    ctx: &ServiceContext<'_, C>,
    id: &WebPubsubHubId,
) -> Result<Option<Value>, ProviderError> {
    let hub = ctx
        .client
        .get_hub(id)
        .await
        .map_err(|e| e.context(format!("retrieving {}", id)))?;

    hub.map(|hub| encode(&flatten_hub(id, &hub))).transpose()
}

/// The hub sent on create and update.
pub fn expand_hub(model: &HubModel) -> WebPubsubHub {
    let event_handlers = model
        .event_handler
        .iter()
        .map(|handler| EventHandler {
            url_template: handler.url_template.clone(),
            user_event_pattern: handler.user_event_pattern.clone(),
            system_events: Some(handler.system_events.clone()),
            auth: handler
                .auth
                .first()
                .map(|auth| UpstreamAuthSettings::for_identity(&auth.managed_identity_id)),
        })
        .collect();

    let policy = if model.anonymous_connections_enabled { ALLOW } else { DENY };

    WebPubsubHub {
        properties: WebPubsubHubProperties {
            event_handlers: Some(event_handlers),
            anonymous_connect_policy: Some(policy.to_string()),
        },
        ..Default::default()
    }
}

/// State for `hub` as the service reports it.
pub fn flatten_hub(id: &WebPubsubHubId, hub: &WebPubsubHub) -> HubModel {
    let event_handler = hub
        .properties
        .event_handlers
        .iter()
        .flatten()
        .map(|handler| EventHandlerModel {
            url_template: handler.url_template.clone(),
            user_event_pattern: handler.user_event_pattern.clone(),
            system_events: handler.system_events.clone().unwrap_or_default(),
            auth: handler
                .auth
                .as_ref()
                .and_then(UpstreamAuthSettings::identity_resource)
                .map(|identity| AuthModel {
                    managed_identity_id: identity.to_string(),
                })
                .into_iter()
                .collect(),
        })
        .collect();

    HubModel {
        id: Some(id.id()),
        name: id.hub_name.clone(),
        web_pubsub_id: id.web_pubsub_id().id(),
        event_handler,
        anonymous_connections_enabled: hub
            .properties
            .anonymous_connect_policy
            .as_deref()
            .is_some_and(|policy| policy.eq_ignore_ascii_case(ALLOW)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth_type;

    const SERVICE_ID: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/rg/providers/Microsoft.SignalRService/webPubSub/wps";

    fn model() -> HubModel {
        decode(
            &schema(),
            &json!({
                "name": "hub",
                "web_pubsub_id": SERVICE_ID,
                "event_handler": [{
                    "url_template": "https://example.com/{hub}/{event}",
                    "user_event_pattern": "*",
                    "system_events": ["connect", "connected"],
                    "auth": [{"managed_identity_id": "00000000-0000-0000-0000-000000000001"}],
                }, {
                    "url_template": "https://example.com/plain",
                }],
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_schema_rejects_bad_parent_id() {
        let config = json!({
            "name": "hub",
            "web_pubsub_id": "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.SignalRService/WebPubSub/wps",
        });
        let diagnostics = validation::validate(&schema(), &config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("web_pubsub_id"));

        let config = json!({"name": "hub", "web_pubsub_id": SERVICE_ID});
        assert!(validation::is_valid(&schema(), &config));
    }

    #[test]
    fn test_expand_hub() {
        let hub = expand_hub(&model());
        assert_eq!(hub.properties.anonymous_connect_policy.as_deref(), Some("deny"));

        let handlers = hub.properties.event_handlers.unwrap();
        assert_eq!(handlers.len(), 2);
        assert_eq!(
            handlers[0].auth.as_ref().unwrap().auth_type.as_deref(),
            Some(auth_type::MANAGED_IDENTITY)
        );
        assert!(handlers[1].auth.is_none());
        assert_eq!(handlers[1].system_events, Some(vec![]));
    }

    #[test]
    fn test_flatten_round_trips_expand() {
        let model = model();
        let id = WebPubsubHubId::new("12345678-1234-9876-4563-123456789012", "rg", "wps", "hub");
        let flattened = flatten_hub(&id, &expand_hub(&model));

        assert_eq!(flattened.id.as_deref(), Some(id.id().as_str()));
        assert_eq!(flattened.web_pubsub_id, SERVICE_ID);
        assert_eq!(flattened.event_handler, model.event_handler);
        assert!(!flattened.anonymous_connections_enabled);
    }

    #[test]
    fn test_anonymous_policy_is_case_insensitive() {
        let id = WebPubsubHubId::new("sub", "rg", "wps", "hub");
        let hub = WebPubsubHub {
            properties: WebPubsubHubProperties {
                anonymous_connect_policy: Some("Allow".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(flatten_hub(&id, &hub).anonymous_connections_enabled);
    }

    #[test]
    fn test_import_seeds_parent() {
        let seed = import(&format!("{}/hubs/hub", SERVICE_ID)).unwrap();
        assert_eq!(seed["name"], "hub");
        assert_eq!(seed["web_pubsub_id"], SERVICE_ID);

        assert!(import(&format!("{}/Hubs/hub", SERVICE_ID)).is_err());
    }
}
