pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
pub mod workflow;

use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/events", get(routes::events::sse_events))
        .route("/ws", get(routes::ws::ws_handler));

    // Inventory: the vertical's workflow chain runs before every handler.
    let inventory = Router::new()
        .route("/api/inventory", get(routes::inventory::list_inventory))
        .route("/api/inventory/adjust", post(routes::inventory::adjust))
        .route("/api/inventory/low-stock", get(routes::inventory::low_stock))
        .route("/api/inventory/expiring", get(routes::inventory::expiring))
        .route("/api/inventory/batches", post(routes::inventory::add_batch))
        .route(
            "/api/inventory/batches/deduct",
            post(routes::inventory::deduct_batches),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            workflow::run_workflows,
        ));

    let protected = Router::new()
        // Auth
        .route("/api/auth/me", get(routes::auth::me))
        // Config
        .route("/api/config", get(routes::config::get_config))
        .route(
            "/api/config/{business_type}",
            get(routes::config::get_business_config),
        )
        // Products
        .route(
            "/api/products",
            get(routes::products::list_products).post(routes::products::create_product),
        )
        .route(
            "/api/products/{id}",
            get(routes::products::get_product)
                .put(routes::products::update_product)
                .delete(routes::products::delete_product),
        )
        // Customers
        .route(
            "/api/customers",
            get(routes::customers::list_customers).post(routes::customers::create_customer),
        )
        .route(
            "/api/customers/{id}",
            get(routes::customers::get_customer).put(routes::customers::update_customer),
        )
        // Users
        .route(
            "/api/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/users/{id}",
            delete(routes::users::deactivate_user),
        )
        // Reporting
        .route("/api/analytics/realtime", get(routes::analytics::realtime))
        .route(
            "/api/permissions/templates",
            get(routes::permissions::list_templates),
        )
        // Kitchen
        .route(
            "/api/kitchen/orders",
            get(routes::kitchen::list_orders).post(routes::kitchen::create_order),
        )
        .route("/api/kitchen/orders/{id}", get(routes::kitchen::get_order))
        .route(
            "/api/kitchen/orders/{id}/prepare",
            post(routes::kitchen::prepare_order),
        )
        .route(
            "/api/kitchen/orders/{id}/complete",
            post(routes::kitchen::complete_order),
        )
        .route(
            "/api/kitchen/orders/{id}/cancel",
            post(routes::kitchen::cancel_order),
        )
        .route(
            "/api/kitchen/orders/{id}/advance-course",
            post(routes::kitchen::advance_course),
        )
        .route(
            "/api/kitchen/orders/{id}/items/{item}/assign",
            post(routes::kitchen::assign_item),
        )
        .route(
            "/api/kitchen/orders/{id}/items/{item}/start",
            post(routes::kitchen::start_item),
        )
        .route(
            "/api/kitchen/orders/{id}/items/{item}/status",
            post(routes::kitchen::set_item_status),
        )
        .route("/api/kitchen/urgent", get(routes::kitchen::urgent))
        .route("/api/kitchen/workload", get(routes::kitchen::workload))
        .route("/api/kitchen/queue", get(routes::kitchen::queue))
        .merge(inventory)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the POS server on `0.0.0.0:{port}`.
pub async fn serve(root: PathBuf, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener, open_browser).await
}

/// Start the POS server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app_state = AppState::load(root)?;
    let kitchen_orders = app_state.kitchen.lock().await.orders().len();
    tracing::info!(
        store = %app_state.config.store.name,
        business_type = %app_state.config.store.business_type,
        kitchen_orders,
        "state loaded"
    );
    let app = build_router(app_state);

    tracing::info!("POS server listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/health");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
