use axum::http::StatusCode;
use http_body_util::BodyExt;
use pos_core::auth::MIN_HASH_COST;
use pos_core::config::Config;
use pos_core::db::Db;
use pos_core::kitchen::KitchenBoard;
use pos_core::types::{BusinessType, Role};
use pos_core::users::{self, NewUser};
use pos_core::{io, paths};
use pos_server::AppState;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PASSWORD: &str = "pass1234";

/// Initialize a store in `dir` with one user per role, all sharing `PASSWORD`.
fn init_store(dir: &TempDir, business_type: BusinessType) -> AppState {
    io::ensure_dir(&paths::pos_dir(dir.path())).unwrap();
    let config = Config::new("test-store", business_type);
    config.save(dir.path()).unwrap();

    let db = Db::open(&paths::db_path(dir.path())).unwrap();
    {
        let conn = db.conn().unwrap();
        for role in Role::all() {
            users::create_user(
                &conn,
                &NewUser {
                    username: role.as_str().to_string(),
                    password: PASSWORD.to_string(),
                    display_name: None,
                    role: *role,
                    business_type,
                },
                MIN_HASH_COST,
            )
            .unwrap();
        }
    }

    let mut state = AppState::from_parts(dir.path().to_path_buf(), config, db, KitchenBoard::new());
    state.hash_cost = MIN_HASH_COST;
    state
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&b).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = pos_server::build_router(state.clone())
        .oneshot(req)
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, headers, json)
}

async fn get(state: &AppState, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, json) = send(state, "GET", uri, Some(token), None).await;
    (status, json)
}

async fn post_json(
    state: &AppState,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let (status, _, json) = send(state, "POST", uri, Some(token), Some(body)).await;
    (status, json)
}

async fn login(state: &AppState, username: &str) -> String {
    let (status, _, json) = send(
        state,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login {username}: {json}");
    json["token"].as_str().unwrap().to_string()
}

async fn create_product(state: &AppState, token: &str, sku: &str, stock: i64) -> String {
    let (status, json) = post_json(
        state,
        "/api/products",
        token,
        json!({ "sku": sku, "name": format!("Item {sku}"), "price_cents": 999, "stock": stock }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Health and auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_public() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let (status, _, json) = send(&state, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["business_type"], "retail");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let (status, _, json) = send(
        &state,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].as_str().unwrap().contains("invalid username or password"));
}

#[tokio::test]
async fn login_returns_token_and_me_echoes_user() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Pharmacy);
    let token = login(&state, "manager").await;

    let (status, json) = get(&state, "/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["username"], "manager");
    assert_eq!(json["claims"]["role"], "manager");
    assert_eq!(json["claims"]["business_type"], "pharmacy");
    assert!(json["user"]["last_login"].is_string());
    assert!(json["permissions"]
        .as_array()
        .unwrap()
        .contains(&json!("manage_inventory")));
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let (status, _, json) = send(&state, "GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].is_string());

    let (status, _, _) = send(&state, "GET", "/api/products", Some("forged.token.here"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[tokio::test]
async fn config_follows_callers_vertical() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Restaurant);
    let token = login(&state, "cashier").await;

    let (status, json) = get(&state, "/api/config", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["business_type"], "restaurant");
    assert_eq!(
        json["workflows"],
        json!(["recipe_deduction", "kitchen_ticket_routing", "waste_tracking"])
    );

    let (status, json) = get(&state, "/api/config/pharmacy", &token).await;
    assert_eq!(status, StatusCode::OK);
    let workflows = json["workflows"].as_array().unwrap();
    for required in ["expiry_alerts", "deduct_stock_by_batch", "controlled_substance_logs"] {
        assert!(workflows.contains(&json!(required)), "{required}");
    }

    let (status, _) = get(&state, "/api/config/bakery", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Products and customers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cashier_cannot_create_products() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let token = login(&state, "cashier").await;
    let (status, _) = post_json(
        &state,
        "/api/products",
        &token,
        json!({ "sku": "TEE-M", "name": "T-shirt", "price_cents": 1500 }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn product_crud_roundtrip() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let token = login(&state, "manager").await;

    let id = create_product(&state, &token, "TEE-M", 12).await;
    let (status, json) = get(&state, &format!("/api/products/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sku"], "TEE-M");
    assert_eq!(json["price_cents"], 999);
    assert_eq!(json["business_type"], "retail");

    let (status, _, json) = send(
        &state,
        "PUT",
        &format!("/api/products/{id}"),
        Some(&token),
        Some(json!({ "price_cents": 1299, "category": "Apparel" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["price_cents"], 1299);
    assert_eq!(json["category"], "Apparel");
    assert_eq!(json["stock"], 12);

    let (status, _, _) = send(&state, "DELETE", &format!("/api/products/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&state, &format!("/api/products/{id}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_sku_is_conflict() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let token = login(&state, "admin").await;
    create_product(&state, &token, "MUG", 1).await;
    let (status, _) = post_json(
        &state,
        "/api/products",
        &token,
        json!({ "sku": "MUG", "name": "Mug again", "price_cents": 500 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn customers_are_open_to_every_role() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let token = login(&state, "cashier").await;

    let (status, json) = post_json(
        &state,
        "/api/customers",
        &token,
        json!({ "name": "Ada Lovelace", "email": "ada@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["id"].as_str().unwrap().to_string();

    let (status, _, json) = send(
        &state,
        "PUT",
        &format!("/api/customers/{id}"),
        Some(&token),
        Some(json!({ "loyalty_points": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["loyalty_points"], 40);

    let (status, json) = get(&state, "/api/customers?q=ada", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Users, analytics, permissions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_admin_manages_users() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let manager = login(&state, "manager").await;
    let (status, _) = get(&state, "/api/users", &manager).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = login(&state, "admin").await;
    let (status, json) = post_json(
        &state,
        "/api/users",
        &admin,
        json!({
            "username": "temp",
            "password": "temp-pass",
            "role": "cashier",
            "business_type": "retail"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json.get("password_hash").is_none());
    let id = json["id"].as_str().unwrap().to_string();

    let (status, json) = get(&state, "/api/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 5);

    let (status, _, json) = send(&state, "DELETE", &format!("/api/users/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["active"], false);

    let (status, _, _) = send(
        &state,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "temp", "password": "temp-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn analytics_and_templates_are_for_managers() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Restaurant);
    let kitchen = login(&state, "kitchen").await;
    let (status, _) = get(&state, "/api/analytics/realtime", &kitchen).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get(&state, "/api/permissions/templates", &kitchen).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let manager = login(&state, "manager").await;
    let (status, json) = get(&state, "/api/analytics/realtime", &manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["store"]["users"], 4);
    assert_eq!(json["kitchen"]["open_orders"], 0);

    let (status, json) = get(&state, "/api/permissions/templates", &manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inventory_runs_vertical_workflows() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Pharmacy);
    let token = login(&state, "cashier").await;
    let (status, headers, json) = send(&state, "GET", "/api/inventory", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.is_array());
    assert_eq!(
        headers["x-pos-workflows"],
        "expiry_alerts,deduct_stock_by_batch,controlled_substance_logs,prescription_validation"
    );

    // Non-inventory routes do not run the chain.
    let (_, headers, _) = send(&state, "GET", "/api/products", Some(&token), None).await;
    assert!(headers.get("x-pos-workflows").is_none());
}

#[tokio::test]
async fn adjust_stock_and_low_stock() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let token = login(&state, "manager").await;
    let id = create_product(&state, &token, "SOAP", 10).await;

    let (status, json) = post_json(
        &state,
        "/api/inventory/adjust",
        &token,
        json!({ "product_id": id, "delta": -7, "reason": "sale" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["product"]["stock"], 3);
    assert_eq!(json["movement"]["delta"], -7);

    let (status, json) = get(&state, "/api/inventory/low-stock", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["sku"], "SOAP");

    let (status, json) = post_json(
        &state,
        "/api/inventory/adjust",
        &token,
        json!({ "product_id": id, "delta": -5, "reason": "sale" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("insufficient stock"));
}

#[tokio::test]
async fn batches_deduct_first_expiry_first() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Pharmacy);
    let manager = login(&state, "manager").await;
    let id = create_product(&state, &manager, "AMOX-500", 0).await;

    let soon = (chrono::Utc::now().date_naive() + chrono::Duration::days(10))
        .format("%Y-%m-%d")
        .to_string();
    let later = (chrono::Utc::now().date_naive() + chrono::Duration::days(200))
        .format("%Y-%m-%d")
        .to_string();
    for (number, qty, expiry) in [("LATE", 20, &later), ("SOON", 5, &soon)] {
        let (status, _) = post_json(
            &state,
            "/api/inventory/batches",
            &manager,
            json!({ "product_id": id, "batch_number": number, "quantity": qty, "expiry_date": expiry }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = get(&state, "/api/inventory/expiring?days=30", &manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["batches"].as_array().unwrap().len(), 1);
    assert_eq!(json["batches"][0]["batch_number"], "SOON");

    let cashier = login(&state, "cashier").await;
    let (status, json) = post_json(
        &state,
        "/api/inventory/batches/deduct",
        &cashier,
        json!({ "product_id": id, "quantity": 8 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["batches"][0]["batch_number"], "SOON");
    assert_eq!(json["batches"][0]["quantity"], 5);
    assert_eq!(json["batches"][1]["quantity"], 3);

    let (_, json) = get(&state, &format!("/api/products/{id}"), &manager).await;
    assert_eq!(json["stock"], 17);
}

// ---------------------------------------------------------------------------
// Kitchen
// ---------------------------------------------------------------------------

#[tokio::test]
async fn kitchen_order_lifecycle() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Restaurant);
    let token = login(&state, "kitchen").await;
    let mut rx = state.event_tx.subscribe();

    let (status, json) = post_json(
        &state,
        "/api/kitchen/orders",
        &token,
        json!({ "table_number": "12", "items": [{ "name": "Burger" }, { "name": "Fries", "quantity": 2 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["order"]["status"], "active");
    let order = json["order"]["id"].as_str().unwrap().to_string();
    let burger = json["order"]["items"][0]["id"].as_str().unwrap().to_string();
    let fries = json["order"]["items"][1]["id"].as_str().unwrap().to_string();
    assert_eq!(rx.recv().await.unwrap().kind, "order_created");

    let base = format!("/api/kitchen/orders/{order}/items");
    let (status, json) = post_json(
        &state,
        &format!("{base}/{burger}/assign"),
        &token,
        json!({ "cook": "ana", "station": "grill" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order"]["items"][0]["status"], "assigned");

    let (_, json) = get(&state, "/api/kitchen/workload", &token).await;
    assert_eq!(json["cooks"]["ana"], 1);
    let (_, json) = get(&state, "/api/kitchen/queue", &token).await;
    assert_eq!(json[0]["item_id"], fries.as_str());

    let (status, json) = post_json(&state, &format!("{base}/{burger}/start"), &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order"]["status"], "being_prepared");
    assert!(json["order"]["items"][0]["start_time"].is_string());

    let (status, _) = post_json(
        &state,
        &format!("{base}/{burger}/status"),
        &token,
        json!({ "status": "ready" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post_json(
        &state,
        &format!("{base}/{burger}/status"),
        &token,
        json!({ "status": "assigned" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("invalid transition"));

    // Fries are not ready, so the ticket cannot close yet.
    let (status, _) = post_json(&state, &format!("/api/kitchen/orders/{order}/complete"), &token, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post_json(
        &state,
        &format!("{base}/{fries}/status"),
        &token,
        json!({ "status": "cancelled" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = post_json(&state, &format!("/api/kitchen/orders/{order}/complete"), &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order"]["status"], "completed");

    let (_, json) = get(&state, "/api/kitchen/orders", &token).await;
    assert!(json.as_array().unwrap().is_empty());
    let (_, json) = get(&state, "/api/kitchen/orders?all=true", &token).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let saved = KitchenBoard::load(&paths::kitchen_path(dir.path())).unwrap();
    assert_eq!(saved.get_order(&order).unwrap().status.as_str(), "completed");
}

#[tokio::test]
async fn kitchen_rejects_bad_requests() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Restaurant);
    let token = login(&state, "cashier").await;

    let (status, _) = post_json(
        &state,
        "/api/kitchen/orders",
        &token,
        json!({ "order_type": "drive_thru", "items": [{ "name": "Shake" }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&state, "/api/kitchen/orders/missing", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = post_json(
        &state,
        "/api/kitchen/orders",
        &token,
        json!({ "items": [{ "name": "Soup" }], "courses": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order = json["order"]["id"].as_str().unwrap().to_string();
    let item = json["order"]["items"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = post_json(
        &state,
        &format!("/api/kitchen/orders/{order}/items/{item}/status"),
        &token,
        json!({ "status": "teleported" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = post_json(
        &state,
        &format!("/api/kitchen/orders/{order}/advance-course"),
        &token,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order"]["course_progress"]["current"], 2);

    let (status, _) = post_json(&state, &format!("/api/kitchen/orders/{order}/cancel"), &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_json(&state, &format!("/api/kitchen/orders/{order}/cancel"), &token, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn urgent_uses_threshold_override() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Restaurant);
    let token = login(&state, "kitchen").await;
    post_json(
        &state,
        "/api/kitchen/orders",
        &token,
        json!({ "items": [{ "name": "Soup" }] }),
    )
    .await;

    let (status, json) = get(&state, "/api/kitchen/urgent", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["minutes"], 15);
    assert!(json["orders"].as_array().unwrap().is_empty());

    let (_, json) = get(&state, "/api/kitchen/urgent?minutes=-1", &token).await;
    assert_eq!(json["orders"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Revocation, range checks and persistence failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deactivated_user_token_stops_working_everywhere() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Retail);
    let admin = login(&state, "admin").await;
    let (status, json) = post_json(
        &state,
        "/api/users",
        &admin,
        json!({
            "username": "floor",
            "password": PASSWORD,
            "role": "manager",
            "business_type": "retail"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["id"].as_str().unwrap().to_string();
    let floor = login(&state, "floor").await;
    create_product(&state, &floor, "MUG", 3).await;

    let (status, _, _) = send(&state, "DELETE", &format!("/api/users/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post_json(
        &state,
        "/api/products",
        &floor,
        json!({ "sku": "CUP", "name": "Cup", "price_cents": 100, "stock": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].as_str().unwrap().contains("deactivated"));
    for uri in ["/api/analytics/realtime", "/api/auth/me", "/api/inventory"] {
        let (status, _) = get(&state, uri, &floor).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    let (status, _) = get(&state, "/api/analytics/realtime", &admin).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn out_of_range_numbers_are_bad_requests() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Pharmacy);
    let token = login(&state, "manager").await;
    let id = create_product(&state, &token, "AMOX", 10).await;

    for uri in [
        "/api/inventory/expiring?days=1000000000",
        "/api/inventory/expiring?days=9223372036854775807",
        "/api/inventory/expiring?days=-1",
    ] {
        let (status, json) = get(&state, uri, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {json}");
    }
    let (status, _) = get(&state, "/api/inventory/expiring?days=30", &token).await;
    assert_eq!(status, StatusCode::OK);

    for delta in [i64::MAX, i64::MIN] {
        let (status, json) = post_json(
            &state,
            "/api/inventory/adjust",
            &token,
            json!({ "product_id": id, "delta": delta, "reason": "recount" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{delta}: {json}");
    }
    let (status, json) = post_json(
        &state,
        "/api/inventory/adjust",
        &token,
        json!({ "product_id": id, "delta": -2, "reason": "sale" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["product"]["stock"], 8);

    for minutes in ["9223372036854775807", "-9223372036854775808", "20000"] {
        let (status, _) = get(&state, &format!("/api/kitchen/urgent?minutes={minutes}"), &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{minutes}");
    }
    let (status, _) = get(&state, "/api/kitchen/urgent?minutes=30", &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn failed_kitchen_save_rolls_back_the_change() {
    let dir = TempDir::new().unwrap();
    let state = init_store(&dir, BusinessType::Restaurant);
    let token = login(&state, "kitchen").await;
    let (status, json) = post_json(
        &state,
        "/api/kitchen/orders",
        &token,
        json!({ "items": [{ "name": "Stew" }] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order = json["order"]["id"].as_str().unwrap().to_string();

    // A directory where the board file belongs makes every save fail.
    let board_path = paths::kitchen_path(dir.path());
    std::fs::remove_file(&board_path).unwrap();
    std::fs::create_dir(&board_path).unwrap();

    let (status, _) = post_json(&state, &format!("/api/kitchen/orders/{order}/cancel"), &token, json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (status, _) = post_json(
        &state,
        "/api/kitchen/orders",
        &token,
        json!({ "items": [{ "name": "Bread" }] }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, json) = get(&state, "/api/kitchen/orders", &token).await;
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order.as_str());
    assert_eq!(orders[0]["status"], "active");

    std::fs::remove_dir(&board_path).unwrap();
    let (status, json) = post_json(&state, &format!("/api/kitchen/orders/{order}/cancel"), &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order"]["status"], "cancelled");
    let saved = KitchenBoard::load(&board_path).unwrap();
    assert_eq!(saved.orders().len(), 1);
}
