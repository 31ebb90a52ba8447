//! Provider configuration.
//!
//! The host hands the provider block to `configure` as JSON. Every field has a
//! default, so `{}` is a valid configuration as long as `ARM_SUBSCRIPTION_ID`
//! is set.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema, Validator};

/// Environment variable consulted when `subscription_id` is not configured.
pub const SUBSCRIPTION_ID_ENV: &str = "ARM_SUBSCRIPTION_ID";

/// Configuration for the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderConfig {
    /// Subscription new resources are created in.
    pub subscription_id: Option<String>,
    /// Per-operation timeouts.
    #[serde(deserialize_with = "single_block")]
    pub timeouts: Timeouts,
    /// Provisioning-state polling.
    #[serde(deserialize_with = "single_block")]
    pub polling: Polling,
}

/// Accept a nested block either as an object or as the host's one-element list.
fn single_block<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrList<T> {
        One(T),
        List(Vec<T>),
    }

    match OneOrList::<T>::deserialize(deserializer)? {
        OneOrList::One(block) => Ok(block),
        OneOrList::List(mut blocks) => Ok(if blocks.is_empty() {
            T::default()
        } else {
            blocks.swap_remove(0)
        }),
    }
}

/// Operation timeouts, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Create timeout.
    pub create: u64,
    /// Read timeout.
    pub read: u64,
    /// Update timeout.
    pub update: u64,
    /// Delete timeout.
    pub delete: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: 30,
            read: 5,
            update: 30,
            delete: 30,
        }
    }
}

impl Timeouts {
    /// Create timeout as a duration.
    pub fn create(&self) -> Duration {
        minutes(self.create)
    }

    /// Read timeout as a duration.
    pub fn read(&self) -> Duration {
        minutes(self.read)
    }

    /// Update timeout as a duration.
    pub fn update(&self) -> Duration {
        minutes(self.update)
    }

    /// Delete timeout as a duration.
    pub fn delete(&self) -> Duration {
        minutes(self.delete)
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}

/// How often, and how persistently, provisioning state is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Polling {
    /// Delay between polls, in milliseconds.
    pub interval_ms: u64,
    /// Consecutive `Succeeded` observations required.
    pub continuous_target_occurrence: u32,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            continuous_target_occurrence: 20,
        }
    }
}

impl Polling {
    /// Delay between polls.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl ProviderConfig {
    /// Parse the provider block.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| ProviderError::Configuration(format!("parsing provider configuration: {}", e)))
    }

    /// Fill in the subscription from the process environment.
    pub fn resolve_from_env(self) -> Self {
        self.resolve_with_env(|key| std::env::var(key).ok())
    }

    /// Fill in the subscription using `lookup` in place of the environment.
    pub fn resolve_with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let configured = self
            .subscription_id
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if !configured {
            self.subscription_id = lookup(SUBSCRIPTION_ID_ENV).filter(|s| !s.trim().is_empty());
        }
        self
    }

    /// Check the resolved configuration.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if self.subscription_id.is_none() {
            diagnostics.push(
                Diagnostic::error("Missing subscription")
                    .with_detail(format!(
                        "set `subscription_id` in the provider block or the {} environment variable",
                        SUBSCRIPTION_ID_ENV
                    ))
                    .with_attribute("subscription_id"),
            );
        }

        let t = &self.timeouts;
        for (name, value) in [
            ("create", t.create),
            ("read", t.read),
            ("update", t.update),
            ("delete", t.delete),
        ] {
            if value == 0 {
                diagnostics.push(
                    Diagnostic::error(format!("Timeout `{}` must be at least one minute", name))
                        .with_attribute(format!("timeouts.0.{}", name)),
                );
            }
        }

        if self.polling.continuous_target_occurrence == 0 {
            diagnostics.push(
                Diagnostic::error("`continuous_target_occurrence` must be at least 1")
                    .with_attribute("polling.0.continuous_target_occurrence"),
            );
        }

        diagnostics
    }

    /// The configured subscription, or an error naming how to set it.
    pub fn subscription(&self) -> Result<&str, ProviderError> {
        self.subscription_id.as_deref().ok_or_else(|| {
            ProviderError::Configuration(format!(
                "no subscription configured; set `subscription_id` or {}",
                SUBSCRIPTION_ID_ENV
            ))
        })
    }

    /// Schema of the provider block.
    pub fn schema() -> Schema {
        let timeouts = Block::new()
            .with_attribute("create", Attribute::optional_int64().with_default(30.into()))
            .with_attribute("read", Attribute::optional_int64().with_default(5.into()))
            .with_attribute("update", Attribute::optional_int64().with_default(30.into()))
            .with_attribute("delete", Attribute::optional_int64().with_default(30.into()));

        let polling = Block::new()
            .with_attribute(
                "interval_ms",
                Attribute::optional_int64().with_default(10_000.into()),
            )
            .with_attribute(
                "continuous_target_occurrence",
                Attribute::optional_int64().with_default(20.into()),
            );

        Schema::v0()
            .with_attribute(
                "subscription_id",
                Attribute::optional_string()
                    .with_validator(Validator::IsUuid)
                    .with_description("Falls back to ARM_SUBSCRIPTION_ID"),
            )
            .with_block("timeouts", NestedBlock::list(timeouts).with_max_items(1))
            .with_block("polling", NestedBlock::list(polling).with_max_items(1))
    }
}
