//! API router
//!
//! Everything lives under `/api`. Content reads are public and writes need
//! an admin session; `/api/admin/*` is gated as a whole by middleware.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::{handlers as auth_handlers, middleware::mw_require_admin};
use crate::config::AppState;
use crate::cors::cors_layer;
use crate::handlers::{
    contacts, content, health_check, method_not_allowed, newsletter, route_not_found, settings,
};
use crate::models::{Entity, Experience, MediaItem, Post, Project, Service, Subscriber};

/// `GET/POST /{path}` and `GET/PUT/DELETE /{path}/{id}` for one content type
fn content_routes<T: Entity>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, get(content::list::<T>).post(content::create::<T>))
        .route(
            &format!("{}/{{id}}", path),
            get(content::get_one::<T>)
                .put(content::update::<T>)
                .delete(content::delete::<T>),
        )
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth_handlers::signup))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/auth/me", get(auth_handlers::me))
        .route("/auth/change-password", post(auth_handlers::change_password))
        .route("/auth/create-admin", post(auth_handlers::create_admin))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/subscribers", get(content::list::<Subscriber>))
        .route(
            "/subscribers/{id}",
            get(content::get_one::<Subscriber>)
                .put(newsletter::update_subscriber)
                .delete(content::delete::<Subscriber>),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), mw_require_admin))
}

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(content_routes::<Post>("/blog"))
        .merge(content_routes::<Service>("/services"))
        .merge(content_routes::<Project>("/projects"))
        .merge(content_routes::<MediaItem>("/media"))
        .merge(content_routes::<Experience>("/experience"))
        .route("/contacts", get(contacts::list).post(contacts::submit))
        .route(
            "/contacts/{id}",
            get(contacts::get_one)
                .put(contacts::update)
                .delete(contacts::delete),
        )
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route(
            "/newsletter/subscribe",
            get(newsletter::subscription_status).post(newsletter::subscribe),
        )
        .route(
            "/newsletter/unsubscribe",
            get(newsletter::unsubscribe_via_link).post(newsletter::unsubscribe),
        )
        .nest("/admin", admin_routes(state))
        .route("/health", get(health_check))
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

/// The full application router
pub fn router(state: AppState) -> Router {
    let api = api_routes(&state).layer(cors_layer(&state.config.allowed_origins));

    Router::new()
        .nest("/api", api)
        .fallback(route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
