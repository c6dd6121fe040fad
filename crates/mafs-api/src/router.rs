//! Route definitions for the MAFS HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` router with every domain's routes.
pub fn build_router() -> Router<AppState> {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(ticket_routes())
        .merge(dashboard_routes())
        .merge(hierarchy_routes())
        .merge(admin_routes())
        .merge(public_routes());

    Router::new().nest("/api", api_routes)
}

/// Auth endpoints: login, LINE login, logout, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/line-login", post(handlers::auth::line_login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// User self-service and administration
fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/me",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route("/users/me/password", put(handlers::user::change_password))
        .route("/users/me/line", put(handlers::user::link_line))
        .route("/users/me/avatar", post(handlers::user::upload_avatar))
        .route("/users/engineers", get(handlers::admin::users::engineers))
        .route(
            "/users",
            get(handlers::admin::users::list).post(handlers::admin::users::create),
        )
        .route("/users/{id}", put(handlers::admin::users::update))
}

/// Tickets, workflow actions, comments and attachments
fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tickets",
            get(handlers::ticket::list).post(handlers::ticket::create),
        )
        .route(
            "/tickets/{id}",
            get(handlers::ticket::get).put(handlers::ticket::update),
        )
        .route(
            "/tickets/{id}/comments",
            get(handlers::ticket::comments).post(handlers::ticket::add_comment),
        )
        .route("/tickets/{id}/history", get(handlers::ticket::history))
        .route(
            "/tickets/{id}/attachments",
            post(handlers::attachment::upload),
        )
        .route("/tickets/{id}/{action}", post(handlers::ticket::perform))
        .route("/attachments/{id}", delete(handlers::attachment::delete))
}

/// KPI dashboard
fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/summary", get(handlers::dashboard::summary))
        .route("/dashboard/trend", get(handlers::dashboard::trend))
        .route(
            "/dashboard/top-reporters",
            get(handlers::dashboard::top_reporters),
        )
}

/// Plant hierarchy lookups
fn hierarchy_routes() -> Router<AppState> {
    Router::new()
        .route("/hierarchy/plants", get(handlers::hierarchy::plants))
        .route("/hierarchy/plants/{id}/areas", get(handlers::hierarchy::areas))
        .route("/hierarchy/areas/{id}/lines", get(handlers::hierarchy::lines))
        .route(
            "/hierarchy/lines/{id}/machines",
            get(handlers::hierarchy::machines),
        )
        .route(
            "/hierarchy/pu",
            get(handlers::hierarchy::search_units).post(handlers::hierarchy::create_unit),
        )
        .route("/hierarchy/pu/{pucode}", get(handlers::hierarchy::unit_by_code))
}

/// Admin: notification schedules and form permissions (ADMIN group)
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/notification-schedules",
            get(handlers::admin::schedules::list),
        )
        .route(
            "/admin/notification-schedules/{type}",
            put(handlers::admin::schedules::update),
        )
        .route(
            "/admin/notification-schedules/{type}/run",
            post(handlers::admin::schedules::run),
        )
        .route(
            "/admin/form-permissions",
            get(handlers::admin::permissions::list).put(handlers::admin::permissions::update),
        )
}

/// Unauthenticated endpoints
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/config/public", get(handlers::health::public_config))
        .route("/line/webhook", post(handlers::line::webhook))
}
