//! Router assembly

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::error::clear_ended_sessions;
use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let auth_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/logout-all", post(handlers::logout_all))
        .route("/auth/password", post(handlers::change_password))
        .route("/auth/me", get(handlers::me))
        .route("/auth/sessions", get(handlers::sessions));

    let access_routes = Router::new()
        .route("/lessons/{lesson_id}/access", get(handlers::lesson_access))
        .route("/courses/{course_id}/access", get(handlers::course_access))
        .route("/institutions/claim", post(handlers::claim));

    let admin_routes = Router::new()
        .route("/orgs/{org_id}/roster", post(handlers::upload_roster))
        .route(
            "/orgs/{org_id}/courses/{course_id}",
            put(handlers::grant_org_course).delete(handlers::revoke_org_course),
        )
        .route(
            "/orgs/{org_id}/batches/{batch_id}/courses/{course_id}",
            put(handlers::grant_batch_course).delete(handlers::revoke_batch_course),
        )
        .route(
            "/admin/users/{user_id}/subscription",
            post(handlers::activate_subscription),
        );

    let api_v1 = auth_routes
        .merge(access_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clear_ended_sessions,
        ));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready));

    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Order matters - outermost first
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}
