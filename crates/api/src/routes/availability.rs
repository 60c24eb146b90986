use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/availability/slots",
            get(handlers::availability::list_slots),
        )
        .route(
            "/api/availability/month",
            get(handlers::availability::month_availability),
        )
        .route(
            "/api/availability/day",
            get(handlers::availability::day_availability),
        )
}
