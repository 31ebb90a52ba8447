//! End-to-end lifecycles against the in-memory client.

use azurerm_signalr_provider::config::{Polling, ProviderConfig};
use azurerm_signalr_provider::models::{
    ResourceSku, SignalRResource, WebPubsubHub, WebPubsubHubProperties,
};
use azurerm_signalr_provider::resourceids::{ResourceId, SignalRId, WebPubsubHubId};
use azurerm_signalr_provider::testing::{
    assert_error_at, assert_plan_changes_attribute, assert_plan_creates, assert_plan_destroys,
    assert_plan_does_not_change_attribute, assert_plan_no_changes, assert_plan_replaces,
    assert_plan_updates_in_place, InMemorySignalRClient, ProviderTester, TestError,
};
use azurerm_signalr_provider::{AzureSignalRProvider, ClientError, ProviderError};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

const SUBSCRIPTION: &str = "12345678-1234-9876-4563-123456789012";
const SERVICE: &str = "azurerm_signalr_service";
const HUB: &str = "azurerm_web_pubsub_hub";

type Tester = ProviderTester<AzureSignalRProvider<InMemorySignalRClient>>;

fn setup() -> (Tester, InMemorySignalRClient) {
    let client = InMemorySignalRClient::new();
    let config = ProviderConfig {
        subscription_id: Some(SUBSCRIPTION.to_string()),
        polling: Polling {
            interval_ms: 1,
            continuous_target_occurrence: 1,
        },
        ..Default::default()
    };
    let tester = ProviderTester::new(AzureSignalRProvider::with_config(client.clone(), config));
    (tester, client)
}

fn service_config(name: &str) -> Value {
    json!({
        "name": name,
        "location": "westeurope",
        "resource_group_name": "rg",
        "sku": [{"name": "Standard_S1", "capacity": 1}],
    })
}

fn service_id(name: &str) -> SignalRId {
    SignalRId::new(SUBSCRIPTION, "rg", name)
}

fn hub_config(name: &str) -> Value {
    json!({
        "name": name,
        "web_pubsub_id": format!(
            "/subscriptions/{}/resourceGroups/rg/providers/Microsoft.SignalRService/webPubSub/wps",
            SUBSCRIPTION
        ),
        "event_handler": [{
            "url_template": "https://example.com/api/{hub}/{event}",
            "user_event_pattern": "*",
            "system_events": ["connect", "disconnected"],
            "auth": [{"managed_identity_id": "00000000-0000-0000-0000-000000000001"}],
        }],
    })
}

// =========================================================================
// azurerm_signalr_service
// =========================================================================

#[tokio::test]
async fn test_service_crud() {
    let (tester, client) = setup();

    let mut updated = service_config("chat");
    updated["sku"] = json!([{"name": "Standard_S1", "capacity": 2}]);
    updated["connectivity_logs_enabled"] = json!(true);

    let state = assert_ok!(tester.lifecycle_crud(SERVICE, service_config("chat"), updated).await);
    assert_eq!(state["id"], service_id("chat").id());
    assert_eq!(state["sku"][0]["capacity"], 2);
    assert_eq!(state["connectivity_logs_enabled"], true);
    assert_eq!(state["hostname"], "chat.service.signalr.net");
    assert!(state["primary_connection_string"]
        .as_str()
        .unwrap()
        .starts_with("Endpoint=https://chat.service.signalr.net;"));

    let patches = client.patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].sku.as_ref().unwrap().capacity, Some(2));
    let props = patches[0].properties.as_ref().unwrap();
    assert!(props.cors.is_none());
    assert!(props.resource_log_configuration.is_some());

    assert!(client.service(&service_id("chat")).is_none());
}

#[tokio::test]
async fn test_service_create_reads_back_defaults() {
    let (tester, client) = setup();

    let state = assert_ok!(tester.lifecycle_create(SERVICE, service_config("defaults")).await);
    assert_eq!(state["service_mode"], "Default");
    assert_eq!(state["public_network_access_enabled"], true);
    assert_eq!(state["local_auth_enabled"], true);
    assert_eq!(state["aad_auth_enabled"], true);
    assert_eq!(state["tls_client_cert_enabled"], false);
    assert_eq!(state["serverless_connection_timeout_in_seconds"], 30);

    let stored = client.service(&service_id("defaults")).unwrap();
    assert_eq!(stored.location.as_deref(), Some("westeurope"));
    assert_eq!(client.calls("create_or_update"), 1);

    // a refresh of unchanged config plans nothing
    let plan = assert_ok!(tester.plan_update(SERVICE, state.clone(), service_config("defaults")).await);
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_service_create_rejects_existing() {
    let (tester, client) = setup();
    client.insert_service(&service_id("taken"), SignalRResource::default());

    let err = assert_err!(tester.create(SERVICE, service_config("taken")).await);
    assert!(matches!(err, ProviderError::AlreadyExists(ref msg) if msg.contains("needs to be imported")));
    assert_eq!(client.calls("create_or_update"), 0);
}

#[tokio::test]
async fn test_service_free_tier_rules() {
    let (tester, client) = setup();

    let mut config = service_config("free");
    config["sku"] = json!([{"name": "Free_F1", "capacity": 1}]);
    config["public_network_access_enabled"] = json!(false);
    let err = assert_err!(tester.create(SERVICE, config).await);
    assert!(matches!(err, ProviderError::Validation(ref msg) if msg.contains("public network access")));

    let mut config = service_config("free");
    config["sku"] = json!([{"name": "Free_F1", "capacity": 1}]);
    config["tls_client_cert_enabled"] = json!(true);
    let err = assert_err!(tester.create(SERVICE, config).await);
    assert!(matches!(err, ProviderError::Validation(ref msg) if msg.contains("tls client cert")));

    assert_eq!(client.calls("create_or_update"), 0);
}

#[tokio::test]
async fn test_service_upstream_requires_serverless() {
    let (tester, _) = setup();

    let mut config = service_config("upstream");
    config["upstream_endpoint"] = json!([{
        "category_pattern": ["*"],
        "event_pattern": ["*"],
        "hub_pattern": ["*"],
        "url_template": "https://example.com/upstream",
    }]);
    assert_err!(tester.create(SERVICE, config.clone()).await);

    config["service_mode"] = json!("Serverless");
    let state = assert_ok!(tester.create(SERVICE, config).await);
    assert_eq!(state["service_mode"], "Serverless");
    assert_eq!(state["upstream_endpoint"][0]["url_template"], "https://example.com/upstream");
}

#[tokio::test]
async fn test_service_update_waits_for_provisioning() {
    let (tester, client) = setup();
    let state = assert_ok!(tester.create(SERVICE, service_config("slow")).await);

    let mut updated = service_config("slow");
    updated["tags"] = json!({"env": "test"});
    let plan = assert_ok!(tester.plan_update(SERVICE, state.clone(), updated).await);
    assert_plan_updates_in_place(&plan);
    assert_plan_changes_attribute(&plan, "tags");
    assert_plan_does_not_change_attribute(&plan, "sku");

    let gets_before = client.calls("get");
    // scripted states apply to every get, starting with the SKU lookup
    client.script_provisioning_states(["Succeeded", "Updating", "Updating"]);
    let state = assert_ok!(tester.update(SERVICE, state, plan.planned_state).await);
    assert_eq!(state["tags"]["env"], "test");

    // SKU lookup, three polls, read back
    assert_eq!(client.calls("get") - gets_before, 5);
}

#[tokio::test]
async fn test_service_update_fails_on_failed_provisioning() {
    let (tester, client) = setup();
    let state = assert_ok!(tester.create(SERVICE, service_config("broken")).await);

    let mut updated = state.clone();
    updated["local_auth_enabled"] = json!(false);
    client.script_provisioning_states(["Succeeded", "Failed"]);

    let err = assert_err!(tester.update(SERVICE, state, updated).await);
    assert!(matches!(err, ProviderError::FailedPrecondition(ref msg) if msg.contains("Failed")));
}

#[tokio::test]
async fn test_service_rename_requires_replace() {
    let (tester, _) = setup();
    let state = assert_ok!(tester.lifecycle_create(SERVICE, service_config("before")).await);

    let plan = assert_ok!(tester.plan_update(SERVICE, state, service_config("after")).await);
    assert_plan_replaces(&plan);
    assert_plan_changes_attribute(&plan, "name");
    assert_plan_does_not_change_attribute(&plan, "resource_group_name");
}

#[tokio::test]
async fn test_service_plan_create_scale_and_destroy() {
    let (tester, _) = setup();

    let plan = assert_ok!(tester.plan_create(SERVICE, service_config("planned")).await);
    assert_plan_creates(&plan);
    assert_plan_changes_attribute(&plan, "sku");
    assert_eq!(plan.planned_state["public_network_access_enabled"], true);

    let state = assert_ok!(tester.create(SERVICE, plan.planned_state).await);

    let mut scaled = service_config("planned");
    scaled["sku"] = json!([{"name": "Standard_S1", "capacity": 2}]);
    let plan = assert_ok!(tester.plan_update(SERVICE, state.clone(), scaled).await);
    assert_plan_updates_in_place(&plan);
    assert_plan_changes_attribute(&plan, "sku");
    assert_plan_does_not_change_attribute(&plan, "name");

    let plan = assert_ok!(tester.plan_delete(SERVICE, state).await);
    assert_plan_destroys(&plan);
    assert_plan_changes_attribute(&plan, "id");
}

#[tokio::test]
async fn test_service_vanished_is_removed_from_state() {
    let (tester, client) = setup();
    let state = assert_ok!(tester.create(SERVICE, service_config("ghost")).await);

    client.remove_service(&service_id("ghost"));
    let refreshed = assert_ok!(tester.read(SERVICE, state.clone()).await);
    assert!(refreshed.is_null());

    // deleting something already gone is fine
    assert_ok!(tester.delete(SERVICE, state).await);
}

#[tokio::test]
async fn test_service_import() {
    let (tester, client) = setup();
    client.insert_service(
        &service_id("existing"),
        SignalRResource {
            location: Some("West Europe".to_string()),
            sku: Some(ResourceSku {
                name: "Premium_P1".to_string(),
                capacity: Some(10),
            }),
            ..Default::default()
        },
    );

    let id = service_id("existing").id();
    let state = assert_ok!(tester.import_one(SERVICE, &id).await);
    assert_eq!(state["name"], "existing");
    assert_eq!(state["resource_group_name"], "rg");
    assert_eq!(state["location"], "westeurope");
    assert_eq!(state["sku"][0]["name"], "Premium_P1");

    let err = assert_err!(tester.import_resource(SERVICE, &id.to_lowercase()).await);
    assert!(matches!(err, ProviderError::InvalidId(_)));

    let missing = service_id("missing").id();
    let err = assert_err!(tester.import_resource(SERVICE, &missing).await);
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn test_service_upgrade_normalizes_id() {
    let (tester, _) = setup();
    let legacy = json!({
        "id": format!(
            "/subscriptions/{}/resourcegroups/rg/providers/microsoft.signalrservice/signalr/chat",
            SUBSCRIPTION
        ),
        "name": "chat",
    });

    let upgraded = assert_ok!(tester.upgrade_resource_state(SERVICE, 0, legacy).await);
    assert_eq!(upgraded["id"], service_id("chat").id());
    assert_eq!(upgraded["name"], "chat");

    let err = assert_err!(tester.upgrade_resource_state(SERVICE, 7, json!({})).await);
    assert!(matches!(err, ProviderError::FailedPrecondition(_)));
}

#[tokio::test]
async fn test_service_data_source() {
    let (tester, _) = setup();
    assert_ok!(tester.create(SERVICE, service_config("lookup")).await);

    assert_ok!(
        tester
            .validate_data_source_config(SERVICE, json!({"name": "lookup", "resource_group_name": "rg"}))
            .await
    );
    let state = assert_ok!(
        tester
            .read_data_source(SERVICE, json!({"name": "lookup", "resource_group_name": "rg"}))
            .await
    );
    assert_eq!(state["id"], service_id("lookup").id());
    assert_eq!(state["hostname"], "lookup.service.signalr.net");

    let err = assert_err!(
        tester
            .read_data_source(SERVICE, json!({"name": "nope", "resource_group_name": "rg"}))
            .await
    );
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn test_service_client_errors_carry_context() {
    let (tester, client) = setup();
    client.fail_next(
        "create_or_update",
        ClientError::Status {
            code: 409,
            message: "conflict".to_string(),
        },
    );

    let err = assert_err!(tester.create(SERVICE, service_config("busy")).await);
    match err {
        ProviderError::Api(ClientError::Status { code, message }) => {
            assert_eq!(code, 409);
            assert!(message.starts_with("creating SignalR Service"));
        },
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_service_validation_diagnostics() {
    let (tester, _) = setup();

    let mut config = service_config("bad");
    config["sku"] = json!([{"name": "Standard_S1", "capacity": 15}]);
    config["service_mode"] = json!("Sometimes");
    match assert_err!(tester.validate_resource_config(SERVICE, config).await) {
        TestError::Diagnostics(diagnostics) => {
            assert_error_at(&diagnostics, "sku.0.capacity");
            assert_error_at(&diagnostics, "service_mode");
        },
        TestError::Provider(e) => panic!("unexpected provider error: {}", e),
    }

    // capacities between the listed units are rejected, listed ones pass
    let mut config = service_config("listed");
    config["sku"] = json!([{"name": "Standard_S1", "capacity": 3}]);
    assert_ok!(tester.validate_resource_config(SERVICE, config).await);

    assert_ok!(tester.validate_resource_config(SERVICE, service_config("good")).await);
}

// =========================================================================
// azurerm_web_pubsub_hub
// =========================================================================

#[tokio::test]
async fn test_hub_crud() {
    let (tester, client) = setup();

    let mut updated = hub_config("chat");
    updated["anonymous_connections_enabled"] = json!(true);
    updated["event_handler"][0]["auth"] = json!([]);

    let state = assert_ok!(tester.lifecycle_crud(HUB, hub_config("chat"), updated).await);
    assert_eq!(state["anonymous_connections_enabled"], true);
    assert_eq!(state["event_handler"][0]["system_events"], json!(["connect", "disconnected"]));
    assert_eq!(state["event_handler"][0]["auth"], json!([]));

    let id = WebPubsubHubId::new(SUBSCRIPTION, "rg", "wps", "chat");
    assert!(client.hub(&id).is_none());
}

#[tokio::test]
async fn test_hub_create_maps_wire_model() {
    let (tester, client) = setup();
    let state = assert_ok!(tester.lifecycle_create(HUB, hub_config("events")).await);

    let id = WebPubsubHubId::new(SUBSCRIPTION, "rg", "wps", "events");
    assert_eq!(state["id"], id.id());

    let hub = client.hub(&id).unwrap();
    assert_eq!(hub.properties.anonymous_connect_policy.as_deref(), Some("deny"));
    let handler = &hub.properties.event_handlers.as_ref().unwrap()[0];
    assert_eq!(handler.user_event_pattern.as_deref(), Some("*"));
    assert_eq!(
        handler.auth.as_ref().unwrap().identity_resource(),
        Some("00000000-0000-0000-0000-000000000001")
    );
}

#[tokio::test]
async fn test_hub_create_rejects_existing() {
    let (tester, client) = setup();
    assert_ok!(tester.create(HUB, hub_config("dup")).await);

    let err = assert_err!(tester.create(HUB, hub_config("dup")).await);
    assert!(matches!(err, ProviderError::AlreadyExists(_)));
    assert_eq!(client.calls("create_or_update_hub"), 1);
}

#[tokio::test]
async fn test_hub_create_rejects_non_canonical_parent() {
    let (tester, client) = setup();
    let mut config = hub_config("hub");
    config["web_pubsub_id"] = json!(format!(
        "/subscriptions/{}/resourceGroups/rg/providers/Microsoft.SignalRService/WebPubSub/wps",
        SUBSCRIPTION
    ));

    assert_err!(tester.validate_resource_config(HUB, config.clone()).await);
    let err = assert_err!(tester.create(HUB, config).await);
    assert!(matches!(err, ProviderError::InvalidId(_)));
    assert_eq!(client.calls("get_hub"), 0);
}

#[tokio::test]
async fn test_hub_import_and_upgrade() {
    let (tester, _) = setup();
    let created = assert_ok!(tester.create(HUB, hub_config("imported")).await);
    let id = created["id"].as_str().unwrap().to_string();

    let state = assert_ok!(tester.import_one(HUB, &id).await);
    assert_eq!(state, created);

    let legacy = json!({
        "id": id.replace("/webPubSub/", "/WebPubSub/").replace("/hubs/", "/Hubs/"),
        "web_pubsub_id": created["web_pubsub_id"]
            .as_str()
            .unwrap()
            .replace("/resourceGroups/", "/resourcegroups/")
            .replace("/webPubSub/", "/WebPubSub/"),
    });
    let upgraded = assert_ok!(tester.upgrade_resource_state(HUB, 0, legacy).await);
    assert_eq!(upgraded["id"], id);
    assert_eq!(upgraded["web_pubsub_id"], created["web_pubsub_id"]);
}

#[tokio::test]
async fn test_hub_import_created_elsewhere() {
    let (tester, client) = setup();
    let id = WebPubsubHubId::new(SUBSCRIPTION, "rg", "wps", "portal");
    client.insert_hub(
        &id,
        WebPubsubHub {
            properties: WebPubsubHubProperties {
                anonymous_connect_policy: Some("Allow".to_string()),
                ..Default::default()
            },
            ..Default::default()
        },
    );

    let state = assert_ok!(tester.import_one(HUB, &id.id()).await);
    assert_eq!(state["name"], "portal");
    assert_eq!(state["web_pubsub_id"], id.web_pubsub_id().id());
    assert_eq!(state["anonymous_connections_enabled"], true);
}

#[tokio::test]
async fn test_hub_vanished_and_delete() {
    let (tester, client) = setup();
    let state = assert_ok!(tester.create(HUB, hub_config("gone")).await);

    let id = WebPubsubHubId::new(SUBSCRIPTION, "rg", "wps", "gone");
    client.remove_hub(&id);
    assert!(assert_ok!(tester.read(HUB, state.clone()).await).is_null());
    assert_ok!(tester.delete(HUB, state).await);
}

#[tokio::test]
async fn test_hubs_of_one_service_serialize() {
    let (tester, client) = setup();

    let (a, b) = tokio::join!(tester.create(HUB, hub_config("a")), tester.create(HUB, hub_config("b")));
    assert_ok!(a);
    assert_ok!(b);
    assert_eq!(client.calls("create_or_update_hub"), 2);
}
