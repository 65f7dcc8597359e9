pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::recognition::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Period winners
        .route(
            "/api/v1/recognition/monthly",
            get(handlers::handle_list_monthly),
        )
        .route(
            "/api/v1/recognition/monthly/select",
            post(handlers::handle_select_monthly),
        )
        .route(
            "/api/v1/recognition/quarterly",
            get(handlers::handle_list_quarterly),
        )
        .route(
            "/api/v1/recognition/quarterly/select",
            post(handlers::handle_select_quarterly),
        )
        .route(
            "/api/v1/recognition/ties/complete",
            post(handlers::handle_complete_tie),
        )
        .route(
            "/api/v1/recognition/fiscal",
            get(handlers::handle_fiscal_period),
        )
        // Weekly recognition
        .route(
            "/api/v1/recognition/weekly",
            get(handlers::handle_list_weeks),
        )
        .route(
            "/api/v1/recognition/weekly/evaluate",
            post(handlers::handle_evaluate_week),
        )
        .route(
            "/api/v1/recognition/weekly/:date",
            put(handlers::handle_save_week),
        )
        .with_state(state)
}
