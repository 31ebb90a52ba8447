//! Configuration validation.
//!
//! Two layers live here: a walker that checks a `serde_json::Value` against a
//! [`Schema`] (types, presence, block counts, attribute [`Validator`]s), and
//! the resource ID validators that schemas attach to ID-valued attributes.
//!
//! # Example
//!
//! ```
//! use azurerm_signalr_provider::schema::{Attribute, Schema, Validator};
//! use azurerm_signalr_provider::validation::{self, validate};
//! use serde_json::json;
//!
//! let schema = Schema::v0().with_attribute(
//!     "web_pubsub_id",
//!     Attribute::required_string().with_validator(Validator::Func(validation::web_pubsub_id)),
//! );
//!
//! let input = json!({"web_pubsub_id": "not-an-id"});
//! let diagnostics = validate(&schema, &input);
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("web_pubsub_id".to_string()));
//! ```

use serde_json::Value;
use tracing::warn;

use crate::error::IdError;
use crate::resourceids::{
    CustomCertificateId, CustomDomainId, ResourceId, SharedPrivateLinkResourceId, SignalRId,
    WebPubsubCustomCertificateId, WebPubsubCustomDomainId, WebPubsubHubId, WebPubsubId,
    WebPubsubSharedPrivateLinkResourceId,
};
use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedBlock, Schema};

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics. An empty list means the value is valid.
///
/// - Required attributes must be present and non-null
/// - Computed-only attributes are skipped (provider sets these)
/// - Attribute types must match the schema
/// - Attribute validators run on values that passed the type check
/// - Deprecated attributes that are set produce a warning
/// - Nested blocks are validated recursively with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Validate a JSON value against a schema, returning the error diagnostics on failure.
///
/// Warnings alone do not fail validation.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.iter().any(Diagnostic::is_error) {
        Err(diagnostics)
    } else {
        Ok(())
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate_result(schema, value).is_ok()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let diagnostic =
                Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(value)));
            diagnostics.push(if path.is_empty() {
                diagnostic
            } else {
                diagnostic.with_attribute(path)
            });
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested_block(nested, obj.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    let Some(value) = value.filter(|v| !v.is_null()) else {
        if attr.flags.required {
            diagnostics.push(
                Diagnostic::error(format!("Missing required attribute '{}'", path))
                    .with_detail("This attribute is required and must be provided")
                    .with_attribute(path),
            );
        }
        return;
    };

    if let Some(message) = &attr.deprecated {
        diagnostics.push(
            Diagnostic::warning(format!("Argument '{}' is deprecated", path))
                .with_detail(message.clone())
                .with_attribute(path),
        );
    }

    let before = diagnostics.len();
    validate_attribute_type(&attr.attr_type, value, path, diagnostics);
    if diagnostics.len() > before || attr.validators.is_empty() {
        return;
    }

    match (&attr.attr_type, value) {
        (AttributeType::List(_) | AttributeType::Set(_), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                run_validators(attr, item, &format!("{}.{}", path, i), diagnostics);
            }
        },
        _ => run_validators(attr, value, path, diagnostics),
    }
}

fn run_validators(attr: &Attribute, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    for validator in &attr.validators {
        let (warnings, errors) = validator.check(value, path);
        for message in warnings {
            diagnostics.push(Diagnostic::warning(message).with_attribute(path));
        }
        for message in errors {
            warn!(attribute = path, %message, "attribute failed validation");
            diagnostics.push(
                Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                    .with_detail(message)
                    .with_attribute(path),
            );
        }
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) | AttributeType::Set(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        Some(Value::Array(arr)) => {
            let len = arr.len() as u32;

            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // 0 means unlimited
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.as_f64().is_some_and(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}

/// Check that `input` is a string that strictly parses as a `T`.
///
/// Returns `(warnings, errors)`; an empty error list means the value is valid.
pub fn resource_id<T: ResourceId>(input: &Value, key: &str) -> (Vec<String>, Vec<IdError>) {
    let Some(v) = input.as_str() else {
        return (
            Vec::new(),
            vec![IdError::TypeMismatch {
                key: key.to_string(),
            }],
        );
    };

    match T::parse(v) {
        Ok(_) => (Vec::new(), Vec::new()),
        Err(err) => (Vec::new(), vec![err]),
    }
}

/// Validates a SignalR service ID.
pub fn service_id(input: &Value, key: &str) -> (Vec<String>, Vec<IdError>) {
    resource_id::<SignalRId>(input, key)
}

/// Validates a SignalR custom certificate ID.
pub fn custom_certificate_id(input: &Value, key: &str) -> (Vec<String>, Vec<IdError>) {
    resource_id::<CustomCertificateId>(input, key)
}

/// Validates a SignalR custom domain ID.
pub fn custom_domain_id(input: &Value, key: &str) -> (Vec<String>, Vec<IdError>) {
    resource_id::<CustomDomainId>(input, key)
}

/// Validates a SignalR shared private link resource ID.
pub fn shared_private_link_resource_id(input: &Value, key: &str) -> (Vec<String>, Vec<IdError>) {
    resource_id::<SharedPrivateLinkResourceId>(input, key)
}

/// Validates a Web PubSub service ID.
pub fn web_pubsub_id(input: &Value, key: &str) -> (Vec<String>, Vec<IdError>) {
    resource_id::<WebPubsubId>(input, key)
}

/// Validates a Web PubSub hub ID.
pub fn web_pubsub_hub_id(input: &Value, key: &str) -> (Vec<String>, Vec<IdError>) {
    resource_id::<WebPubsubHubId>(input, key)
}

/// Validates a Web PubSub custom certificate ID.
pub fn web_pubsub_custom_certificate_id(input: &Value, key: &str) -> (Vec<String>, Vec<IdError>) {
    resource_id::<WebPubsubCustomCertificateId>(input, key)
}

/// Validates a Web PubSub custom domain ID.
pub fn web_pubsub_custom_domain_id(input: &Value, key: &str) -> (Vec<String>, Vec<IdError>) {
    resource_id::<WebPubsubCustomDomainId>(input, key)
}

/// Validates a Web PubSub shared private link resource ID.
pub fn web_pubsub_shared_private_link_resource_id(
    input: &Value,
    key: &str,
) -> (Vec<String>, Vec<IdError>) {
    resource_id::<WebPubsubSharedPrivateLinkResourceId>(input, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DiagnosticSeverity, Validator};
    use serde_json::json;

    const SIGNALR_ID: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/resGroup1/providers/Microsoft.SignalRService/SignalR/signalR1";

    #[test]
    fn test_service_id() {
        let (warnings, errors) = service_id(&json!("not-a-valid-id"), "field");
        assert!(warnings.is_empty());
        assert!(!errors.is_empty());

        let (_, errors) = service_id(&json!(SIGNALR_ID), "field");
        assert!(errors.is_empty());

        let (_, errors) = service_id(&json!(42), "field");
        assert_eq!(
            errors,
            vec![IdError::TypeMismatch {
                key: "field".to_string()
            }]
        );
    }

    #[test]
    fn test_service_id_is_strict() {
        let (_, errors) = service_id(&json!(SIGNALR_ID.to_lowercase()), "field");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_missing());
    }

    #[test]
    fn test_web_pubsub_wrappers() {
        let hub = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.SignalRService/webPubSub/wps/hubs/hub";
        assert!(web_pubsub_hub_id(&json!(hub), "id").1.is_empty());
        assert_eq!(web_pubsub_id(&json!(hub), "id").1.len(), 1);

        let service = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.SignalRService/webPubSub/wps";
        assert!(web_pubsub_id(&json!(service), "id").1.is_empty());
        assert!(!web_pubsub_custom_domain_id(&json!(service), "id").1.is_empty());
        assert!(web_pubsub_custom_certificate_id(&json!(format!("{}/customCertificates/c", service)), "id")
            .1
            .is_empty());
        assert!(web_pubsub_shared_private_link_resource_id(
            &json!(format!("{}/sharedPrivateLinkResources/l", service)),
            "id"
        )
        .1
        .is_empty());
    }

    #[test]
    fn test_signalr_child_wrappers() {
        assert!(custom_domain_id(&json!(format!("{}/customDomains/d", SIGNALR_ID)), "id")
            .1
            .is_empty());
        assert!(custom_certificate_id(&json!(format!("{}/customCertificates/c", SIGNALR_ID)), "id")
            .1
            .is_empty());
        assert!(shared_private_link_resource_id(
            &json!(format!("{}/sharedPrivateLinkResources/l", SIGNALR_ID)),
            "id"
        )
        .1
        .is_empty());
        assert!(!custom_domain_id(&json!(SIGNALR_ID), "id").1.is_empty());
    }

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "test"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        assert_eq!(validate(&schema, &json!({"name": null})).len(), 1);

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("hostname", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"hostname": 123})).is_empty());
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute(
            "capacity",
            Attribute::new(AttributeType::Int64, crate::schema::AttributeFlags::required()),
        );

        assert!(validate(&schema, &json!({"capacity": 42})).is_empty());
        assert!(validate(&schema, &json!({"capacity": 42.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"capacity": 42.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"capacity": "42"})).len(), 1);
    }

    #[test]
    fn test_validate_runs_validators() {
        let schema = Schema::v0().with_attribute(
            "web_pubsub_id",
            Attribute::required_string().with_validator(Validator::Func(web_pubsub_id)),
        );

        let diagnostics = validate(&schema, &json!({"web_pubsub_id": SIGNALR_ID}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
        assert!(diagnostics[0]
            .detail
            .as_deref()
            .unwrap_or_default()
            .contains("webPubSub"));

        // validators are skipped once the type check has failed
        let diagnostics = validate(&schema, &json!({"web_pubsub_id": 1}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_list_element_validators() {
        let schema = Schema::v0().with_attribute(
            "hub_pattern",
            Attribute::new(
                AttributeType::list(AttributeType::String),
                crate::schema::AttributeFlags::required(),
            )
            .with_validator(Validator::StringIsNotEmpty),
        );

        assert!(validate(&schema, &json!({"hub_pattern": ["*"]})).is_empty());

        let diagnostics = validate(&schema, &json!({"hub_pattern": ["*", ""]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("hub_pattern.1".to_string()));
    }

    #[test]
    fn test_validate_deprecated_attribute() {
        let schema = Schema::v0().with_attribute(
            "live_trace_enabled",
            Attribute::optional_bool().with_deprecation("use `live_trace`"),
        );

        assert!(validate(&schema, &json!({})).is_empty());

        let diagnostics = validate(&schema, &json!({"live_trace_enabled": true}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Warning);
        assert!(is_valid(&schema, &json!({"live_trace_enabled": true})));
    }

    #[test]
    fn test_validate_nested_block_items() {
        let schema = Schema::v0().with_block(
            "sku",
            NestedBlock::list(
                Block::new()
                    .with_attribute("name", Attribute::required_string())
                    .with_attribute(
                        "capacity",
                        Attribute::new(AttributeType::Int64, crate::schema::AttributeFlags::required())
                            .with_validator(Validator::IntInSlice(&[1, 2, 5])),
                    ),
            )
            .with_min_items(1)
            .with_max_items(1),
        );

        assert!(is_valid(
            &schema,
            &json!({"sku": [{"name": "Standard_S1", "capacity": 1}]})
        ));

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("requires at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"sku": [{"name": "a", "capacity": 1}, {"name": "b", "capacity": 1}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 1"));

        let diagnostics = validate(&schema, &json!({"sku": [{"name": "Standard_S1", "capacity": 3}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("sku.0.capacity".to_string()));

        let diagnostics = validate(&schema, &json!({"sku": "Standard_S1"}));
        assert!(diagnostics[0].summary.contains("Expected list"));
    }

    #[test]
    fn test_validate_result_helper() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate_result(&schema, &json!({"name": "test"})).is_ok());
        let result = validate_result(&schema, &json!({}));
        assert_eq!(result.map_err(|d| d.len()), Err(1));
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
        assert_eq!(diagnostics[0].attribute, None);
    }
}
