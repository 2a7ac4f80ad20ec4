//! End-to-end tests against an in-process stand-in for the Supabase REST and
//! Management APIs.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use supago_adapter::{
    FunctionProber, ProbeTier, Provisioner, SchemaResolver, SupabaseClient, SupabaseError,
};
use supago_core::{ColumnSchema, SupabaseConfig, TableSchemaResult};

const ACCESS_TOKEN: &str = "test-access-token";

#[derive(Default)]
struct FakeSupabase {
    views: Mutex<HashSet<String>>,
    functions: Mutex<HashSet<String>>,
    statements: Mutex<Vec<String>>,
}

impl FakeSupabase {
    fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

fn blogs_columns() -> Value {
    json!([
        {"column_name": "id", "data_type": "uuid", "is_nullable": false, "column_default": "gen_random_uuid()"},
        {"column_name": "title", "data_type": "text", "is_nullable": false, "column_default": ""}
    ])
}

fn not_found(message: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"code": "PGRST205", "message": message})),
    )
        .into_response()
}

async fn read_relation(
    State(state): State<Arc<FakeSupabase>>,
    Path(relation): Path<String>,
) -> Response {
    let Some(table) = relation.strip_suffix("_schema") else {
        return not_found(format!("Could not find the table 'public.{relation}'"));
    };
    if !state.views.lock().unwrap().contains(&relation) {
        return not_found(format!("Could not find the table 'public.{relation}' in the schema cache"));
    }
    match table {
        "blogs" => Json(blogs_columns()).into_response(),
        _ => Json(json!([])).into_response(),
    }
}

async fn call_function(
    State(state): State<Arc<FakeSupabase>>,
    Path(function): Path<String>,
    body: Bytes,
) -> Response {
    if !state.functions.lock().unwrap().contains(&function) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "code": "PGRST202",
                "message": format!("Could not find the function public.{function} in the schema cache")
            })),
        )
            .into_response();
    }
    match function.as_str() {
        "get_table_schema" => {
            let params: Value = serde_json::from_slice(&body).unwrap_or_default();
            let table = params["p_table_name"].as_str().unwrap_or_default();
            Json(json!({"table_name": table, "columns": blogs_columns()})).into_response()
        }
        // exec_sql returns void
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn database_query(
    State(state): State<Arc<FakeSupabase>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let bearer = format!("Bearer {ACCESS_TOKEN}");
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(bearer.as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))).into_response();
    }

    let query = body["query"].as_str().unwrap_or_default().to_string();
    state.statements.lock().unwrap().push(query.clone());

    if query.contains("CREATE OR REPLACE VIEW") {
        if let Some(view) = query.split('"').nth(1) {
            state.views.lock().unwrap().insert(view.to_string());
        }
    } else if query.contains("CREATE OR REPLACE FUNCTION get_table_schema") {
        state.functions.lock().unwrap().insert("get_table_schema".into());
    } else if query.contains("CREATE OR REPLACE FUNCTION exec_sql") {
        state.functions.lock().unwrap().insert("exec_sql".into());
    } else if query.contains("pg_catalog.pg_proc") {
        let rows: Vec<Value> = state
            .functions
            .lock()
            .unwrap()
            .iter()
            .map(|f| json!({"function_name": f}))
            .collect();
        return Json(Value::Array(rows)).into_response();
    }

    Json(json!([])).into_response()
}

/// Spawn the fake on an ephemeral port and return a config pointing at it.
async fn spawn_fake(state: Arc<FakeSupabase>) -> (SupabaseConfig, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/rest/v1/rpc/{function}", post(call_function))
        .route("/rest/v1/{relation}", get(read_relation))
        .route("/v1/projects/{project}/database/query", post(database_query))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = SupabaseConfig {
        project_id: "test-project".to_string(),
        service_key: "test-api-key".to_string(),
        anon_key: "test-anon-key".to_string(),
        access_token: ACCESS_TOKEN.to_string(),
        rest_url_override: Some(base.clone()),
        management_url_override: Some(format!("{base}/v1/projects/test-project")),
    };
    (config, handle)
}

#[tokio::test]
async fn view_is_created_on_first_request_only() {
    let fake = Arc::new(FakeSupabase::default());
    let (config, server) = spawn_fake(fake.clone()).await;
    let resolver = SchemaResolver::new(SupabaseClient::new(config));

    let expected = TableSchemaResult::new(
        "blogs",
        vec![
            ColumnSchema::new("id", "uuid", false, "gen_random_uuid()"),
            ColumnSchema::new("title", "text", false, ""),
        ],
    );

    assert_eq!(resolver.get_table_schema("blogs").await.unwrap(), expected);
    assert_eq!(resolver.get_table_schema("blogs").await.unwrap(), expected);

    let statements = fake.statements();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].contains("table_name = 'blogs'"));

    server.abort();
}

#[tokio::test]
async fn probe_falls_back_to_listing_until_exec_sql_exists() {
    let fake = Arc::new(FakeSupabase::default());
    let (config, server) = spawn_fake(fake.clone()).await;
    let client = SupabaseClient::new(config);
    let prober = FunctionProber::new(client.clone());

    let answer = prober.probe("get_table_schema").await.unwrap();
    assert!(!answer.exists);
    assert_eq!(answer.tier, ProbeTier::ManagementListing);

    let report = Provisioner::new(client.clone()).initialize().await.unwrap();
    assert_eq!(report.created.len(), 2);

    // exec_sql now answers with an empty body, so the listing still decides.
    let answer = prober.probe("get_table_schema").await.unwrap();
    assert!(answer.exists);
    assert_eq!(answer.tier, ProbeTier::ManagementListing);
    assert!(!prober.exists("get_all_table_schemas").await.unwrap());

    let rpc = SchemaResolver::new(client)
        .get_table_schema_via_rpc("blogs")
        .await
        .unwrap();
    assert_eq!(rpc.columns.len(), 2);

    server.abort();
}

#[tokio::test]
async fn rejected_access_token_surfaces_status() {
    let fake = Arc::new(FakeSupabase::default());
    let (mut config, server) = spawn_fake(fake.clone()).await;
    config.access_token = "wrong".to_string();
    let resolver = SchemaResolver::new(SupabaseClient::new(config));

    let err = resolver.get_table_schema("blogs").await.unwrap_err();

    assert!(matches!(err, SupabaseError::Resolve { .. }));
    assert_eq!(err.status(), Some(401));
    assert!(fake.statements().is_empty());

    server.abort();
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = SupabaseConfig {
        project_id: "test-project".to_string(),
        rest_url_override: Some(base),
        ..Default::default()
    };
    let resolver = SchemaResolver::new(SupabaseClient::new(config));

    let err = resolver.get_table_schema("blogs").await.unwrap_err();
    assert!(err.status().is_none());
    assert!(err.to_string().contains("checking schema view"));
}
