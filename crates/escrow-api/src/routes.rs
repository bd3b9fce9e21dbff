use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the full HTTP surface (spec §6). Grounded on the teacher RPC
/// server's permissive-CORS + tracing middleware stack, adapted from a
/// single jsonrpsee module to axum's per-route `Router`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth", post(handlers::auth))
        .route("/api/channels", get(handlers::list_channels).post(handlers::create_channel))
        .route(
            "/api/channel/:id/admins",
            get(handlers::list_channel_admins).post(handlers::add_channel_admin),
        )
        .route("/api/channel/:id/admins/:user_id", delete(handlers::remove_channel_admin))
        .route("/api/channel/:id/verify", post(handlers::verify_channel))
        .route("/api/permission/check", post(handlers::permission_check))
        .route("/api/campaign/create", post(handlers::create_campaign))
        .route("/api/deals", get(handlers::list_deals).post(handlers::create_deal))
        .route("/api/deal/create", post(handlers::create_deal))
        .route("/api/deal/:id", get(handlers::get_deal))
        .route("/api/deal/:id/status", post(handlers::deal_status))
        .route("/api/deal/:id/transition", post(handlers::deal_transition))
        .route("/api/deal/:id/accept", post(handlers::deal_accept))
        .route("/api/deal/:id/post", post(handlers::deal_post))
        .route("/api/deal/:id/release", post(handlers::deal_release))
        .route("/api/deal/:id/escrow/create", post(handlers::escrow_create))
        .route("/api/deal/:id/escrow/status", get(handlers::escrow_status))
        .route("/api/deal/:id/escrow/verify", post(handlers::escrow_verify))
        .route("/api/deal/:id/escrow/release", post(handlers::escrow_release))
        .route("/api/deal/:id/escrow/refund", post(handlers::escrow_refund))
        .route("/api/deal/:id/escrow/transactions", get(handlers::escrow_transactions))
        .route("/api/deal/:id/post/schedule", post(handlers::post_schedule))
        .route("/api/deal/:id/post/now", post(handlers::post_now))
        .route("/api/deal/:id/post/cancel", post(handlers::post_cancel))
        .route("/api/deal/:id/post/verify", get(handlers::post_verify))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}
