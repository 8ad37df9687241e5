use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::auth_middleware;
use crate::config::Config;
use crate::db::DbPool;
use crate::handlers::{
    admin as admin_handlers, apps as app_handlers, auth as auth_handlers,
    groups as group_handlers, pages as page_handlers, public as public_handlers,
    variables as variable_handlers,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
}

pub fn create_router(db: DbPool, config: Config) -> Router {
    let state = AppState { db, config };

    // Public auth routes (no middleware)
    let public_auth_routes = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
        .route("/refresh", post(auth_handlers::refresh));

    // Protected auth routes (need auth)
    let protected_auth_routes = Router::new()
        .route("/logout", post(auth_handlers::logout))
        .route("/me", get(auth_handlers::me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let auth_routes = Router::new()
        .merge(public_auth_routes)
        .merge(protected_auth_routes);

    // Page routes (all protected); saves are upserts keyed by path-like slug
    let page_routes = Router::new()
        .route("/", get(page_handlers::list_pages))
        .route("/*slug", get(page_handlers::get_page))
        .route("/*slug", put(page_handlers::save_page))
        .route("/*slug", delete(page_handlers::delete_page));

    // App routes; delete cascades to the app's pages, sync pulls from the
    // app's source template
    let app_routes = Router::new()
        .route("/", post(app_handlers::create_app))
        .route("/", get(app_handlers::list_apps))
        .route("/:id", get(app_handlers::get_app))
        .route("/:id", patch(app_handlers::update_app))
        .route("/:id", delete(app_handlers::delete_app))
        .route("/:id/sync", post(app_handlers::sync_template));

    // Group routes
    let group_routes = Router::new()
        .route("/", get(group_handlers::list_groups))
        .route("/", put(group_handlers::save_group))
        .route("/offers", get(group_handlers::list_offers))
        .route("/:id", delete(group_handlers::delete_group))
        .route("/:id/accept", post(group_handlers::accept_group))
        .route("/:id/decline", post(group_handlers::decline_group));

    // Variable routes
    let variable_routes = Router::new()
        .route("/", get(variable_handlers::list_variables))
        .route("/", put(variable_handlers::save_variable))
        .route("/:key", delete(variable_handlers::delete_variable));

    // Protected routes with auth middleware
    let protected_routes = Router::new()
        .nest("/pages", page_routes)
        .route("/publish", post(page_handlers::publish_page))
        .nest("/apps", app_routes)
        .nest("/groups", group_routes)
        .nest("/variables", variable_routes)
        .route("/admin/overview", get(admin_handlers::overview))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public page reads stay outside the auth middleware
    let public_routes = Router::new()
        .route("/u/:username", get(public_handlers::profile_home))
        .route("/u/:username/*slug", get(public_handlers::page));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1", protected_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
