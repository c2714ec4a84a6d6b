//! Route definitions for the Divino Alimento composition API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/cycles", cycle_routes())
        .nest("/migrations", migration_routes())
}

/// Cycle, catalog and stage routes
fn cycle_routes() -> Router<AppState> {
    Router::new()
        .route("/:cycle_id", get(handlers::get_cycle))
        .route("/:cycle_id/offers", get(handlers::list_product_groups))
        .route("/:cycle_id/stages", get(handlers::list_stages))
        .route("/:cycle_id/stages/active", get(handlers::get_active_stage))
        .route(
            "/:cycle_id/stages/:stage_id/publish-check",
            get(handlers::publish_check),
        )
        .route(
            "/:cycle_id/stages/:stage_id/publish",
            post(handlers::publish_direct_sale),
        )
        .route(
            "/:cycle_id/stages/:stage_id/complete",
            post(handlers::complete_stage),
        )
        .nest("/:cycle_id/markets/:market_id/compositions", composition_routes())
}

/// Composition draft routes, one draft per cycle, market and sale type
fn composition_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:sale_type",
            get(handlers::get_draft)
                .put(handlers::save_draft)
                .delete(handlers::delete_draft),
        )
        .route(
            "/:sale_type/summary",
            get(handlers::get_summary),
        )
}

/// Leftover migration routes
fn migration_routes() -> Router<AppState> {
    Router::new().route("/leftovers", post(handlers::aggregate_leftovers))
}
