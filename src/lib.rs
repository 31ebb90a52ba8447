//! Azure SignalR and Web PubSub provider
//!
//! Resources for `Microsoft.SignalRService`, built around a codec for Azure
//! Resource Manager IDs.
//!
//! # Overview
//!
//! - **Resource IDs**: typed IDs for SignalR and Web PubSub resources with a
//!   strict parser, a case-insensitive parser for legacy state, and a
//!   canonical formatter ([`resourceids`])
//! - **Validation**: schema checking plus ID validators for attributes ([`validation`])
//! - **State upgrades**: normalization of IDs stored with non-canonical casing ([`migration`])
//! - **Resources**: `azurerm_signalr_service` (also a data source) and
//!   `azurerm_web_pubsub_hub` ([`services`])
//! - **Provider**: [`AzureSignalRProvider`] composes the registry, configuration,
//!   locks and a [`client::SignalRClient`] behind [`ProviderService`]
//! - **Logging**: `tracing` setup writing to stderr ([`logging`])
//!
//! # Quick Start
//!
//! ```
//! use azurerm_signalr_provider::resourceids::{ResourceId, SignalRId};
//!
//! let id = SignalRId::parse_insensitively(
//!     "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/rg/providers/microsoft.signalrservice/signalr/chat",
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     id.id(),
//!     "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/rg/providers/Microsoft.SignalRService/SignalR/chat"
//! );
//! assert_eq!(
//!     id.to_string(),
//!     "SignalR Service: (Signal R Name \"chat\" / Resource Group \"rg\")"
//! );
//! assert!(SignalRId::parse(&id.id().to_lowercase()).is_err());
//! ```
//!
//! # Provider Protocol
//!
//! [`ProviderService`] mirrors the operations a host drives:
//!
//! - **Metadata / Schema**: resource and data source names and schemas
//! - **ValidateProviderConfig / Configure**: subscription, timeouts and polling
//! - **ValidateResourceConfig**: schema and attribute validators
//! - **UpgradeResourceState**: chained upgraders from the stored schema version
//! - **Plan**: defaults, carried computed attributes and replacement detection
//! - **Create/Read/Update/Delete**: CRUD under per-operation timeouts
//! - **ImportResourceState**: strict ID parse, then read
//! - **ValidateDataSourceConfig / ReadDataSource**: the `azurerm_signalr_service` data source

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod locks;
pub mod logging;
pub mod migration;
pub mod poll;
pub mod provider;
pub mod registration;
pub mod resourceids;
pub mod schema;
pub mod service;
pub mod services;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
pub mod models;

// Re-export main types at crate root
pub use client::{ClientError, SignalRClient};
pub use config::ProviderConfig;
pub use error::{IdError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::AzureSignalRProvider;
pub use registration::Registration;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
