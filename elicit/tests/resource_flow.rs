//! Integration tests for the configuration → registry → resource pipeline.
//!
//! These tests use wiremock to stand in for remote APIs and check the
//! requests the crate sends and how responses come back.

use std::sync::Arc;

use elicit::resource::ActionPath;
use elicit::{
    Action, ConnectionRegistry, ElicitConfig, ElicitError, PathMap, Resource, RestMethod, Target,
};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, PartialEq, Deserialize)]
struct Widget {
    id: u64,
    name: String,
}

/// Builds a registry with one connection pointing at the mock server.
fn registry(server: &MockServer, extra: &str) -> Arc<ConnectionRegistry> {
    let yaml = format!(
        "default: shop\nconnections:\n  shop:\n    host: {}\n{}",
        server.uri(),
        extra
    );
    let config = ElicitConfig::from_yaml_str(&yaml).unwrap();
    Arc::new(ConnectionRegistry::new(config))
}

fn widgets(registry: Arc<ConnectionRegistry>) -> Resource {
    Resource::new("widgets", registry)
        .with_paths(PathMap::new().catch_all(ActionPath::path("/widgets/{id?}")))
}

/// Enveloped collections are unwrapped into records.
#[tokio::test]
async fn test_enveloped_index() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1, "name": "Bolt"}, {"id": 2, "name": "Nut"}],
            "meta": {"pagination": {"total": 2}}
        })))
        .mount(&server)
        .await;

    let resource = widgets(registry(&server, "    driver: fractal\n"));
    let records = resource.all().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["name"], "Bolt");
}

/// A single object from a show request becomes one record.
#[tokio::test]
async fn test_find_single_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "name": "Gear"})))
        .mount(&server)
        .await;

    let resource = widgets(registry(&server, ""));
    let record = resource.find(7).await.unwrap();

    assert_eq!(record, Some(json!({"id": 7, "name": "Gear"})));
}

/// A 404 is absence for `find` and an error for `find_or_fail`.
#[tokio::test]
async fn test_find_or_fail_on_missing_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resource = widgets(registry(&server, ""));

    assert_eq!(resource.find(999).await.unwrap(), None);

    let err = resource.find_or_fail(999).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "No query results for resource [widgets] with key [999]"
    );
}

/// Basic auth credentials from configuration reach the wire.
#[tokio::test]
async fn test_basic_auth_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let registry = registry(
        &server,
        "    auth: basic-auth\n    identifier: user\n    secret: pass\n",
    );
    let records = widgets(registry).all().await.unwrap();

    assert!(records.is_empty());
}

/// Rejected credentials name the connection.
#[tokio::test]
async fn test_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let registry = registry(&server, "    auth: bearer\n    token: expired\n");
    let err = widgets(registry).all().await.unwrap_err();

    assert!(err.is_invalid_credentials());
    assert_eq!(err.to_string(), "Invalid credentials for connection [shop]");
}

/// Create sends the attributes as a JSON body and unwraps the envelope.
#[tokio::test]
async fn test_create_sends_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/widgets"))
        .and(body_json(json!({"name": "Bolt", "stock": 12})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": 3, "name": "Bolt", "stock": 12},
            "meta": {}
        })))
        .mount(&server)
        .await;

    let resource = widgets(registry(&server, "    driver: enveloped\n"));
    let created = resource
        .create([("name", json!("Bolt")), ("stock", json!(12))])
        .await
        .unwrap();

    assert_eq!(created["id"], 3);
}

/// Update fills the key placeholder and sends the changes.
#[tokio::test]
async fn test_update_uses_key_in_path() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/widgets/3"))
        .and(body_json(json!({"name": "Big Bolt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "Big Bolt"})))
        .mount(&server)
        .await;

    let resource = widgets(registry(&server, ""));
    let updated = resource.update(3, [("name", "Big Bolt")]).await.unwrap();

    assert_eq!(updated["name"], "Big Bolt");
}

/// An empty delete response is success; a body is failure.
#[tokio::test]
async fn test_destroy_polarity() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/widgets/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/widgets/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": ""})))
        .mount(&server)
        .await;

    let resource = widgets(registry(&server, ""));

    assert!(resource.destroy(1).await.unwrap());
    assert!(!resource.destroy(2).await.unwrap());
}

/// Unconsumed filters, including multi-valued ones, become the query-string.
#[tokio::test]
async fn test_filters_become_query_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shops/north/widgets"))
        .and(query_param("color", "dark red"))
        .and(query_param("tag", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Bolt"}])))
        .mount(&server)
        .await;

    let registry = registry(&server, "");
    let connection = registry.default_connection().unwrap();

    let records: Vec<Widget> = connection
        .query()
        .from(Target::new(RestMethod::Get, "/shops/{shop}/widgets"))
        .dynamic_filter("whereShopAndColor", ["north", "dark red"])
        .unwrap()
        .filter("tag", json!(["metric", "steel"]))
        .get_as()
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![Widget {
            id: 1,
            name: "Bolt".to_string()
        }]
    );
}

/// Provider errors in a 200 body use the configured fields.
#[tokio::test]
async fn test_configured_provider_error_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fault": "rate limited",
            "fault_code": 4290
        })))
        .mount(&server)
        .await;

    let registry = registry(
        &server,
        "    response_error: fault\n    response_code: fault_code\n",
    );
    let err = widgets(registry).all().await.unwrap_err();

    match err {
        ElicitError::Provider(provider) => {
            assert_eq!(provider.message, "rate limited");
            assert_eq!(provider.code, 4290);
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

/// Declared JSON that does not parse is an error, undeclared text is kept.
#[tokio::test]
async fn test_response_content_types() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{oops", "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/motd"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("Hello", "text/plain"))
        .mount(&server)
        .await;

    let connection = registry(&server, "").default_connection().unwrap();

    let err = connection
        .query()
        .from(Target::get("/broken"))
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, ElicitError::Parse(_)));

    let records = connection
        .query()
        .from(Target::get("/motd"))
        .get()
        .await
        .unwrap();
    assert_eq!(records, vec![json!("Hello")]);
}

/// Actions without a path fail before any request is sent.
#[tokio::test]
async fn test_action_without_path() {
    let server = MockServer::start().await;
    let resource = Resource::new("widgets", registry(&server, ""));

    let err = resource.all().await.unwrap_err();

    assert!(matches!(err, ElicitError::Compile(_)));
    assert!(!resource.paths().has_path(Action::Index));
}
