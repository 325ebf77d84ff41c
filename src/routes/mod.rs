// Route modules
pub mod dashboard;
pub mod profile;

use crate::{
    app_state::AppState,
    middleware::{create_rate_limiter, jwt_auth_middleware, logging_middleware},
};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes(state.clone()))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: AppState) -> Router<AppState> {
    // Payment-initiating routes: authentication plus rate limiting
    let rate_limiter = create_rate_limiter(state.redis.clone());
    let payment_routes = Router::new()
        .route("/profile/subscribe", post(profile::subscribe))
        .route("/profile/subscribe-free", post(profile::subscribe_free))
        .route(
            "/profile/unlock-special-content",
            post(profile::unlock_special_content),
        )
        .route("/profile/posts/{id}/tip", post(profile::tip_post))
        .route("/profile/tip-creator/{id}", post(profile::tip_creator))
        .route_layer(middleware::from_fn(rate_limiter))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // Auth-only routes (no rate limiting, require JWT)
    let auth_only_routes = Router::new()
        .route("/profile/posts/{id}", get(profile::get_post))
        .route(
            "/dashboard/bundles",
            get(dashboard::list_bundles).post(dashboard::create_bundle),
        )
        .route("/dashboard/bundles/{id}", delete(dashboard::delete_bundle))
        .route("/dashboard/free-mode", post(dashboard::set_free_mode))
        .route("/dashboard/withdraw", post(dashboard::withdraw))
        .route("/dashboard/bank-details", post(dashboard::set_bank_details))
        .route("/dashboard/earnings", get(dashboard::earnings))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // Public routes: provider redirects land here without our JWT; the
    // webhook authenticates itself with the signature header.
    let public_routes = Router::new()
        .route("/profile/verify-payment", get(profile::verify_payment))
        .route(
            "/profile/verify-special-payment",
            get(profile::verify_special_payment),
        )
        .route(
            "/profile/verify-tip-payment",
            get(profile::verify_tip_payment),
        )
        .route("/profile/webhook", post(profile::webhook));

    // Combine all routes with request logging
    Router::new()
        .merge(payment_routes)
        .merge(auth_only_routes)
        .merge(public_routes)
        .layer(middleware::from_fn(logging_middleware))
}
