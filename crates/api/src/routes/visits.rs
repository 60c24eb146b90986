use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/visits/:visit_id/reschedule",
            get(handlers::visits::reschedule_details).post(handlers::visits::reschedule_visit),
        )
        .route(
            "/api/visits/:visit_id/cancel",
            get(handlers::visits::cancel_details).post(handlers::visits::cancel_visit),
        )
}
