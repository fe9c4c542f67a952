use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method as HttpMethod, StatusCode, Uri},
    response::{IntoResponse, Response as AxumResponse},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{domain::Bundle, error::ErrorCode};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    path: String,
    query: Option<String>,
    body: Option<Value>,
    authorization: Option<String>,
}

#[derive(Clone, Default)]
struct MockServerState {
    routes: Arc<Mutex<HashMap<(String, String), (u16, Value)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServerState {
    async fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.routes
            .lock()
            .await
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    async fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

async fn handle_any(
    State(state): State<MockServerState>,
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> AxumResponse {
    let path = uri.path().trim_start_matches("/nifi-api").to_string();
    state.requests.lock().await.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(ToString::to_string),
        body: serde_json::from_slice(&body).ok(),
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string),
    });

    let routes = state.routes.lock().await;
    let Some((status, body)) = routes.get(&(method.to_string(), path)).cloned() else {
        return (StatusCode::NOT_FOUND, "no such route").into_response();
    };
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match body {
        Value::String(text) => (status, text).into_response(),
        other => (status, Json(other)).into_response(),
    }
}

async fn spawn_flow_server() -> anyhow::Result<(String, MockServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = MockServerState::default();
    let app = Router::new()
        .fallback(handle_any)
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/nifi-api"), state))
}

#[tokio::test]
async fn root_group_id_is_read_from_flow_envelope() {
    let (base_url, server) = spawn_flow_server().await.expect("spawn server");
    server
        .respond(
            "GET",
            "/flow/process-groups/root",
            200,
            json!({ "processGroupFlow": { "id": "root-1", "flow": {} } }),
        )
        .await;
    let api = HttpFlowApi::new(&base_url).expect("api");

    let root = api.get_root_process_group_id().await.expect("root id");
    assert_eq!(root, ComponentId::from("root-1"));
}

#[tokio::test]
async fn listing_passes_ui_only_flag() {
    let (base_url, server) = spawn_flow_server().await.expect("spawn server");
    server
        .respond(
            "GET",
            "/flow/process-groups/root-1",
            200,
            json!({ "processGroupFlow": { "id": "root-1", "flow": { "processGroups": [{ "id": "g-1" }] } } }),
        )
        .await;
    let api = HttpFlowApi::new(&base_url).expect("api");

    let listing = api
        .fetch_flow_process_groups(&ComponentId::from("root-1"), true)
        .await
        .expect("listing");
    assert_eq!(listing.normalize().process_groups.len(), 1);

    let requests = server.recorded().await;
    assert_eq!(requests[0].query.as_deref(), Some("uiOnly=true"));
}

#[tokio::test]
async fn create_process_group_posts_initial_revision_and_position() {
    let (base_url, server) = spawn_flow_server().await.expect("spawn server");
    server
        .respond(
            "POST",
            "/process-groups/root-1/process-groups",
            201,
            json!({ "id": "g-new", "component": { "name": "Ingest" } }),
        )
        .await;
    let api = HttpFlowApi::new(&base_url).expect("api");

    let entity = api
        .create_process_group(
            &ComponentId::from("root-1"),
            "Ingest",
            Some("ctx-1"),
            Position::new(150.0, 150.0),
        )
        .await
        .expect("create");
    assert_eq!(entity.id.as_deref(), Some("g-new"));

    let requests = server.recorded().await;
    let body = requests[0].body.clone().expect("json body");
    assert_eq!(body["revision"]["version"], json!(0));
    assert_eq!(body["revision"]["clientId"], json!(api.client_id()));
    assert_eq!(body["component"]["name"], json!("Ingest"));
    assert_eq!(body["component"]["position"], json!({ "x": 150.0, "y": 150.0 }));
    assert_eq!(body["component"]["parameterContext"]["id"], json!("ctx-1"));
}

#[tokio::test]
async fn start_schedules_then_reads_back_the_group() {
    let (base_url, server) = spawn_flow_server().await.expect("spawn server");
    server
        .respond(
            "PUT",
            "/flow/process-groups/g-1",
            200,
            json!({ "id": "g-1", "state": "RUNNING" }),
        )
        .await;
    server
        .respond(
            "GET",
            "/process-groups/g-1",
            200,
            json!({ "id": "g-1", "runningCount": 4 }),
        )
        .await;
    let api = HttpFlowApi::new(&base_url).expect("api");

    let entity = api
        .start_process_group(&ComponentId::from("g-1"))
        .await
        .expect("start");
    assert_eq!(entity.running_count, Some(4));

    let requests = server.recorded().await;
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(
        requests[0].body,
        Some(json!({ "id": "g-1", "state": "RUNNING", "disconnectedNodeAcknowledged": false }))
    );
    assert_eq!(requests[1].method, "GET");
}

#[tokio::test]
async fn paste_sends_copy_response_with_parent_revision() {
    let (base_url, server) = spawn_flow_server().await.expect("spawn server");
    server
        .respond(
            "GET",
            "/process-groups/root-1",
            200,
            json!({ "id": "root-1", "revision": { "version": 7 } }),
        )
        .await;
    server
        .respond(
            "PUT",
            "/process-groups/root-1/paste",
            200,
            json!({ "flow": {} }),
        )
        .await;
    let api = HttpFlowApi::new(&base_url).expect("api");

    let buffer = CopyBuffer(json!({ "processGroups": [{ "identifier": "abc" }] }));
    api.paste_process_group(&ComponentId::from("root-1"), &buffer)
        .await
        .expect("paste");

    let requests = server.recorded().await;
    let body = requests[1].body.clone().expect("paste body");
    assert_eq!(body["copyResponse"], buffer.0);
    assert_eq!(body["revision"]["version"], json!(7));
}

#[tokio::test]
async fn delete_uses_current_revision_version() {
    let (base_url, server) = spawn_flow_server().await.expect("spawn server");
    server
        .respond(
            "GET",
            "/process-groups/g-1",
            200,
            json!({ "id": "g-1", "revision": { "version": 3 } }),
        )
        .await;
    server
        .respond("DELETE", "/process-groups/g-1", 200, json!({ "id": "g-1" }))
        .await;
    let api = HttpFlowApi::new(&base_url).expect("api");

    api.delete_process_group(&ComponentId::from("g-1"))
        .await
        .expect("delete");

    let requests = server.recorded().await;
    let query = requests[1].query.clone().expect("query");
    assert!(query.contains("version=3"), "unexpected query: {query}");
    assert!(query.contains(&format!("clientId={}", api.client_id())));
}

#[tokio::test]
async fn server_errors_surface_as_classified_api_errors() {
    let (base_url, server) = spawn_flow_server().await.expect("spawn server");
    server
        .respond(
            "POST",
            "/process-groups/root-1/copy",
            409,
            Value::String("revision conflict".to_string()),
        )
        .await;
    let api = HttpFlowApi::new(&base_url).expect("api");

    let err = api
        .copy_process_group(&ComponentId::from("root-1"), &[ComponentId::from("g-1")])
        .await
        .expect_err("conflict");
    let api_error = err.downcast_ref::<ApiError>().expect("api error");
    assert_eq!(api_error.code, ErrorCode::Conflict);
    assert!(api_error.message.contains("revision conflict"));
}

#[tokio::test]
async fn authenticate_attaches_bearer_token_to_later_calls() {
    let (base_url, server) = spawn_flow_server().await.expect("spawn server");
    server
        .respond(
            "POST",
            "/access/token",
            201,
            Value::String("token-123".to_string()),
        )
        .await;
    server
        .respond(
            "GET",
            "/flow/status",
            200,
            json!({ "controllerStatus": { "activeThreadCount": 2, "runningCount": 5 } }),
        )
        .await;
    let api = HttpFlowApi::new(&base_url)
        .expect("api")
        .with_credentials(Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        });

    api.authenticate().await.expect("authenticate");
    let status = api.get_flow_status().await.expect("status");
    assert_eq!(status.controller.running_count, 5);

    let requests = server.recorded().await;
    assert_eq!(requests[0].authorization, None);
    assert_eq!(
        requests[1].authorization.as_deref(),
        Some("Bearer token-123")
    );
}

#[tokio::test]
async fn create_processor_serializes_type_and_bundle() {
    let (base_url, server) = spawn_flow_server().await.expect("spawn server");
    server
        .respond(
            "POST",
            "/process-groups/g-1/processors",
            201,
            json!({ "id": "p-1" }),
        )
        .await;
    let api = HttpFlowApi::new(&base_url).expect("api");
    let spec = ProcessorSpec {
        processor_type: "org.apache.nifi.processors.standard.LogAttribute".to_string(),
        bundle: Bundle {
            group: "org.apache.nifi".to_string(),
            artifact: "nifi-standard-nar".to_string(),
            version: "2.0.0".to_string(),
        },
        name: None,
    };

    api.create_processor(&ComponentId::from("g-1"), &spec, Position::new(100.0, 100.0))
        .await
        .expect("create processor");

    let requests = server.recorded().await;
    let body = requests[0].body.clone().expect("body");
    assert_eq!(body["component"]["type"], json!(spec.processor_type));
    assert_eq!(body["component"]["bundle"]["artifact"], json!("nifi-standard-nar"));
    assert!(body["component"].get("name").is_none());
}

#[tokio::test]
async fn missing_backend_rejects_every_call() {
    let api = MissingFlowApi;
    assert!(api.get_root_process_group_id().await.is_err());
    assert!(api
        .start_process_group(&ComponentId::from("g-1"))
        .await
        .is_err());
}
