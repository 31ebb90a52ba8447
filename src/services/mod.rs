//! Resource and data source implementations.
//!
//! Each service module owns its schema, the conversion between Terraform-style
//! state and the wire models (`expand_*` / `flatten_*`), and its CRUD handlers.

pub mod signalr_service;
pub mod web_pubsub_hub;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::SignalRClient;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::locks::ResourceLocks;
use crate::poll::StateChangeConf;
use crate::schema::Schema;

/// What a handler needs from the provider.
pub struct ServiceContext<'a, C: SignalRClient> {
    /// The resource-manager client.
    pub client: &'a C,
    /// The resolved provider configuration.
    pub config: &'a ProviderConfig,
    /// Locks shared by every handler.
    pub locks: &'a ResourceLocks,
}

impl<C: SignalRClient> ServiceContext<'_, C> {
    /// The subscription new resources are created in.
    pub fn subscription(&self) -> Result<&str, ProviderError> {
        self.config.subscription()
    }

    /// Provisioning-state polling using the configured cadence.
    pub fn provisioning(&self, timeout: Duration) -> StateChangeConf {
        StateChangeConf::provisioning(
            self.config.polling.interval(),
            timeout,
            self.config.polling.continuous_target_occurrence,
        )
    }
}

/// Decode state into a typed model after filling in schema defaults.
///
/// Nulls are dropped first so absent and null both take the model's default.
pub(crate) fn decode<T: DeserializeOwned>(schema: &Schema, state: &Value) -> Result<T, ProviderError> {
    let mut state = state.clone();
    schema.block.apply_defaults(&mut state);
    strip_nulls(&mut state);
    Ok(serde_json::from_value(state)?)
}

/// Encode a typed model back into state.
pub(crate) fn encode<T: Serialize>(model: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(model)?)
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        },
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {},
    }
}

/// The `id` attribute of `state`.
pub(crate) fn state_id(state: &Value) -> Result<&str, ProviderError> {
    state
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProviderError::Validation("state has no `id`".to_string()))
}

/// Lowercase a location and drop its spaces, so `West Europe` and
/// `westeurope` compare equal.
pub(crate) fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
