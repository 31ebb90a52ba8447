//! The resources and data sources this provider serves.
//!
//! [`Registration::new`] builds the table once from each service's factory
//! function; the provider only ever reads it afterwards.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{IdError, ProviderError};
use crate::migration::StateUpgrade;
use crate::schema::{ProviderSchema, Schema};
use crate::services::{signalr_service, web_pubsub_hub};

/// Which handler set serves a resource or data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `azurerm_signalr_service`.
    SignalRService,
    /// `azurerm_web_pubsub_hub`.
    WebPubsubHub,
}

/// Turns an import ID into the seed state passed to `read`.
pub type Importer = fn(&str) -> Result<Value, IdError>;

/// A managed resource type.
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    /// Handlers serving the resource.
    pub kind: ResourceKind,
    /// The current schema.
    pub schema: Schema,
    /// State upgraders keyed by the version they read.
    pub upgraders: BTreeMap<u64, StateUpgrade>,
    /// Builds seed state from an import ID.
    pub importer: Importer,
}

impl ResourceDefinition {
    /// Create a definition with no upgraders.
    pub fn new(kind: ResourceKind, schema: Schema, importer: Importer) -> Self {
        Self {
            kind,
            schema,
            upgraders: BTreeMap::new(),
            importer,
        }
    }

    /// Register an upgrader under the version it reads.
    pub fn with_upgrader(mut self, upgrade: StateUpgrade) -> Self {
        self.upgraders.insert(upgrade.from_version(), upgrade);
        self
    }

    /// Bring `state` from `version` up to the current schema version, one
    /// upgrader at a time.
    pub fn upgrade_state(&self, version: u64, state: Value) -> Result<Value, ProviderError> {
        let current = self.schema.version;
        if version > current {
            return Err(ProviderError::FailedPrecondition(format!(
                "state has schema version {} but the newest known version is {}",
                version, current
            )));
        }

        let mut raw = match state {
            Value::Object(map) => map,
            Value::Null => return Ok(Value::Null),
            other => {
                return Err(ProviderError::Validation(format!(
                    "expected state to be an object, got {}",
                    other
                )))
            },
        };

        for from in version..current {
            let upgrade = self.upgraders.get(&from).ok_or_else(|| {
                ProviderError::Unimplemented(format!("no state upgrade from schema version {}", from))
            })?;
            debug!(?upgrade, from, "upgrading state");
            raw = upgrade.upgrade(raw)?;
        }

        Ok(Value::Object(raw))
    }
}

/// A data source type.
#[derive(Debug, Clone)]
pub struct DataSourceDefinition {
    /// Handlers serving the data source.
    pub kind: ResourceKind,
    /// The data source schema.
    pub schema: Schema,
}

/// Immutable table of resource and data source definitions.
#[derive(Debug, Clone)]
pub struct Registration {
    resources: BTreeMap<&'static str, ResourceDefinition>,
    data_sources: BTreeMap<&'static str, DataSourceDefinition>,
}

impl Registration {
    /// Build the table.
    pub fn new() -> Self {
        let resources = BTreeMap::from([
            (signalr_service::RESOURCE_TYPE, signalr_service::resource()),
            (web_pubsub_hub::RESOURCE_TYPE, web_pubsub_hub::resource()),
        ]);
        let data_sources = BTreeMap::from([(
            signalr_service::RESOURCE_TYPE,
            signalr_service::data_source(),
        )]);

        Self {
            resources,
            data_sources,
        }
    }

    /// Look up a resource type.
    pub fn resource(&self, resource_type: &str) -> Result<&ResourceDefinition, ProviderError> {
        self.resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    /// Look up a data source type.
    pub fn data_source(&self, data_source_type: &str) -> Result<&DataSourceDefinition, ProviderError> {
        self.data_sources.get(data_source_type).ok_or_else(|| {
            ProviderError::UnknownResource(format!("Unknown data source type: {}", data_source_type))
        })
    }

    /// Registered resource type names, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        self.resources.keys().map(|name| name.to_string()).collect()
    }

    /// Registered data source type names, sorted.
    pub fn data_source_types(&self) -> Vec<String> {
        self.data_sources.keys().map(|name| name.to_string()).collect()
    }

    /// Every schema, with `provider` describing the provider block.
    pub fn provider_schema(&self, provider: Schema) -> ProviderSchema {
        let schema = self
            .resources
            .iter()
            .fold(ProviderSchema::new(), |schema, (name, def)| {
                schema.with_resource(*name, def.schema.clone())
            });
        self.data_sources
            .iter()
            .fold(schema, |schema, (name, def)| {
                schema.with_data_source(*name, def.schema.clone())
            })
            .with_provider_config(provider)
    }
}

impl Default for Registration {
    fn default() -> Self {
        Self::new()
    }
}
