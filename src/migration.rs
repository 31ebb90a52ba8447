//! State upgrades for schema version bumps.
//!
//! Version 0 state may hold IDs with inconsistent casing in their literal
//! segments (`signalR`, `WebPubSub`). Upgrading re-parses those IDs
//! insensitively and writes back the canonical form.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::IdError;
use crate::resourceids::{ResourceId, SignalRId, WebPubsubHubId, WebPubsubId};
use crate::schema::{Attribute, AttributeType, AttributeFlags, Block, NestedBlock, Schema};

/// Raw state as stored by the host.
pub type RawState = Map<String, Value>;

/// A state upgrade from one schema version to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateUpgrade {
    /// `azurerm_signalr_service` version 0 to 1.
    ServiceV0ToV1,
    /// `azurerm_web_pubsub_hub` version 0 to 1.
    WebPubsubHubV0ToV1,
}

impl StateUpgrade {
    /// The schema version this upgrade reads.
    pub fn from_version(&self) -> u64 {
        0
    }

    /// The schema of the state this upgrade reads.
    pub fn schema(&self) -> Schema {
        match self {
            StateUpgrade::ServiceV0ToV1 => service_v0_schema(),
            StateUpgrade::WebPubsubHubV0ToV1 => web_pubsub_hub_v0_schema(),
        }
    }

    /// Rewrite `state` into the shape of the next schema version.
    pub fn upgrade(&self, mut state: RawState) -> Result<RawState, IdError> {
        match self {
            StateUpgrade::ServiceV0ToV1 => {
                normalize_id::<SignalRId>(&mut state, "id")?;
            },
            StateUpgrade::WebPubsubHubV0ToV1 => {
                normalize_id::<WebPubsubHubId>(&mut state, "id")?;
                normalize_id::<WebPubsubId>(&mut state, "web_pubsub_id")?;
            },
        }
        Ok(state)
    }
}

fn normalize_id<T: ResourceId>(state: &mut RawState, key: &str) -> Result<(), IdError> {
    let old = match state.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => return Ok(()),
        Some(_) => {
            return Err(IdError::TypeMismatch {
                key: key.to_string(),
            })
        },
    };

    let new = T::parse_insensitively(&old)?.id();
    if new != old {
        debug!(key, "updating ID from {:?} to {:?}", old, new);
    }
    state.insert(key.to_string(), Value::String(new));
    Ok(())
}

fn string_set() -> AttributeType {
    AttributeType::set(AttributeType::String)
}

fn service_v0_schema() -> Schema {
    let sku = Block::new()
        .with_attribute("name", Attribute::required_string())
        .with_attribute("capacity", Attribute::new(AttributeType::Int64, AttributeFlags::required()));

    let cors = Block::new().with_attribute(
        "allowed_origins",
        Attribute::new(string_set(), AttributeFlags::required()),
    );

    let upstream = Block::new()
        .with_attribute(
            "category_pattern",
            Attribute::new(AttributeType::list(AttributeType::String), AttributeFlags::required()),
        )
        .with_attribute(
            "event_pattern",
            Attribute::new(AttributeType::list(AttributeType::String), AttributeFlags::required()),
        )
        .with_attribute(
            "hub_pattern",
            Attribute::new(AttributeType::list(AttributeType::String), AttributeFlags::required()),
        )
        .with_attribute("url_template", Attribute::required_string());

    let features = Block::new()
        .with_attribute("flag", Attribute::required_string())
        .with_attribute("value", Attribute::required_string());

    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string())
        .with_attribute("location", Attribute::required_string())
        .with_attribute("resource_group_name", Attribute::required_string())
        .with_block("sku", NestedBlock::list(sku).with_min_items(1).with_max_items(1))
        .with_block("features", NestedBlock::set(features))
        .with_block("upstream_endpoint", NestedBlock::set(upstream))
        .with_block("cors", NestedBlock::list(cors).with_computed())
        .with_attribute("hostname", Attribute::computed_string())
        .with_attribute("ip_address", Attribute::computed_string())
        .with_attribute("public_port", Attribute::computed_int64())
        .with_attribute("server_port", Attribute::computed_int64())
        .with_attribute("primary_access_key", Attribute::computed_string().sensitive())
        .with_attribute("primary_connection_string", Attribute::computed_string().sensitive())
        .with_attribute("secondary_access_key", Attribute::computed_string().sensitive())
        .with_attribute("secondary_connection_string", Attribute::computed_string().sensitive())
        .with_attribute(
            "tags",
            Attribute::new(AttributeType::map(AttributeType::String), AttributeFlags::optional()),
        )
}

fn web_pubsub_hub_v0_schema() -> Schema {
    let auth = Block::new().with_attribute("managed_identity_id", Attribute::required_string());

    let event_handler = Block::new()
        .with_attribute("url_template", Attribute::required_string())
        .with_attribute("user_event_pattern", Attribute::optional_string())
        .with_attribute("system_events", Attribute::new(string_set(), AttributeFlags::optional()))
        .with_block("auth", NestedBlock::list(auth).with_max_items(1));

    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string())
        .with_attribute("web_pubsub_id", Attribute::required_string())
        .with_block("event_handler", NestedBlock::list(event_handler))
        .with_attribute("anonymous_connections_enabled", Attribute::optional_bool())
}
