//! End-to-end HTTP flow against an in-memory store

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use edge_server::services::SeedData;
use edge_server::{Config, RedbStore, Server, ServerState};
use serde_json::{Value, json};
use tower::ServiceExt;

const SEED: &str = r#"{
    "menu": [
        {"id": "soup", "name": "Soup", "price": 5.5, "category": "KITCHEN"},
        {"id": "beer", "name": "Beer", "price": 4.0, "category": "BAR"}
    ],
    "staff": [
        {"id": "w1", "name": "Ana", "role": "WAITER", "pin": "1111"},
        {"id": "k1", "name": "Chef", "role": "KITCHEN", "pin": "2222"},
        {"id": "c1", "name": "Till", "role": "CASHIER", "pin": "3333"}
    ]
}"#;

fn test_app() -> Router {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_work_dir(dir.path().to_string_lossy());
    config.table_count = 4;
    config.seed_file = None;

    let store = Arc::new(RedbStore::open_in_memory().unwrap());
    let seed: SeedData = serde_json::from_str(SEED).unwrap();
    let catalog = edge_server::services::CatalogService::new();
    let staff = edge_server::services::StaffService::new();
    seed.apply_if_empty(store.as_ref(), &catalog, &staff).unwrap();

    let state = ServerState::with_store(config, store).unwrap();
    Server::router(state)
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &Router, pin: &str) -> String {
    let (status, body) = call(app, post("/api/auth/login", None, json!({ "pin": pin }))).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tables"], 4);
}

#[tokio::test]
async fn test_login_rejects_unknown_pin() {
    let app = test_app();
    let (status, _) = call(&app, post("/api/auth/login", None, json!({ "pin": "9999" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Request::get("/api/tables").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_order_flow_over_http() {
    let app = test_app();
    let waiter = login(&app, "1111").await;
    let kitchen = login(&app, "2222").await;

    let (status, body) = call(
        &app,
        post(
            "/api/orders/command",
            Some(&waiter),
            json!({
                "payload": {
                    "type": "CREATE_ORDER",
                    "table_id": 1,
                    "items": [{"menu_item_id": "soup", "quantity": 2}, {"menu_item_id": "beer"}]
                }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "{}", body);
    let order = &body["result"]["data"];
    let order_id = order["id"].as_str().unwrap().to_string();
    let soup = order["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["menu_item_id"] == "soup")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // kitchen starts the soup
    let transition = |version: u64| {
        json!({
            "payload": {
                "type": "TRANSITION_ITEM",
                "order_id": order_id,
                "item_id": soup,
                "target": "IN_PROGRESS",
                "expected_version": version
            }
        })
    };
    let (_, body) = call(&app, post("/api/orders/command", Some(&kitchen), transition(1))).await;
    assert_eq!(body["success"], true, "{}", body);
    assert_eq!(body["result"]["data"]["version"], 2);

    // replaying the same version is a conflict, reported in-band
    let (status, body) = call(&app, post("/api/orders/command", Some(&kitchen), transition(1))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VERSION_CONFLICT");

    // kitchen only sees the soup
    let (status, body) = call(&app, get("/api/orders/active", &kitchen)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["items"].as_array().unwrap().len(), 1);

    let (status, body) = call(&app, get("/api/tables/1", &waiter)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["item_count"], 3);

    let (status, _) = call(&app, get("/api/tables/9", &waiter)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_menu_lists_orderable_items() {
    let app = test_app();
    let waiter = login(&app, "1111").await;

    let (status, body) = call(&app, get("/api/menu", &waiter)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["beer", "soup"]);
    assert_eq!(body[1]["category"], "KITCHEN");

    let (status, _) = call(&app, Request::get("/api/menu").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_kitchen_snapshot_is_narrowed() {
    let app = test_app();
    let waiter = login(&app, "1111").await;
    let kitchen = login(&app, "2222").await;

    let (_, body) = call(
        &app,
        post(
            "/api/orders/command",
            Some(&waiter),
            json!({
                "payload": {
                    "type": "CREATE_ORDER",
                    "table_id": 2,
                    "items": [{"menu_item_id": "soup", "quantity": 2}, {"menu_item_id": "beer"}]
                }
            }),
        ),
    )
    .await;
    assert_eq!(body["success"], true, "{}", body);

    let (status, body) = call(&app, get("/api/sync/snapshot", &kitchen)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "KITCHEN");
    let order = &body["tables"]["2"]["order"];
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["menu_item_id"], "soup");
    assert_eq!(order["total"].as_f64(), Some(11.0));

    let (_, body) = call(&app, get("/api/sync/snapshot", &waiter)).await;
    assert_eq!(body["tables"]["2"]["order"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_sync_socket_rejects_bad_token() {
    let app = test_app();
    let request = Request::get("/api/sync/ws?token=bad")
        .header(header::CONNECTION, "upgrade")
        .header(header::UPGRADE, "websocket")
        .header(header::SEC_WEBSOCKET_VERSION, "13")
        .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
