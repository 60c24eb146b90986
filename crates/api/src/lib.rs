//! # Dentiro API
//!
//! The API crate provides the web server behind the clinic's booking pages,
//! intake form, patient links and staff dashboard.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Map domain errors onto HTTP responses
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework. It keeps no storage of its own:
//! every record is read from and written to the automation webhooks through
//! a [`WebhookGateway`](dentiro_webhooks::WebhookGateway).

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    http::{HeaderValue, Method, StatusCode, header},
};
use dentiro_webhooks::Gateway;
use eyre::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
///
/// # Example
///
/// ```no_run
/// use std::{sync::Arc, time::Duration};
/// use dentiro_api::ApiState;
/// use dentiro_webhooks::{WebhookEndpoints, create_client};
///
/// # fn main() -> eyre::Result<()> {
/// let endpoints = WebhookEndpoints::with_base_url("http://localhost:5678/webhook");
/// let webhooks = create_client(endpoints, Duration::from_secs(15))?;
/// let state = Arc::new(ApiState { webhooks });
/// let app = dentiro_api::build_router(state);
/// # Ok(())
/// # }
/// ```
pub struct ApiState {
    /// Gateway to the automation webhooks
    pub webhooks: Gateway,
}

/// Builds the application router with every route and the shared state
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Booking calendar endpoints
        .merge(routes::availability::routes())
        // Intake form and dashboard endpoints
        .merge(routes::leads::routes())
        // Patient reschedule and cancel links
        .merge(routes::visits::routes())
        // Receptionist chatbot
        .merge(routes::chat::routes())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(origins)
        .allow_credentials(true)
}

/// Starts the API server with the provided configuration and webhook gateway
///
/// Initializes logging, configures routes, CORS and the request timeout,
/// then serves until the process is stopped.
///
/// # Example
///
/// ```no_run
/// use dentiro_api::{config::ApiConfig, start_server};
/// use dentiro_webhooks::create_client;
///
/// # async fn run() -> eyre::Result<()> {
/// let config = ApiConfig::from_env()?;
/// let webhooks = create_client(config.webhooks.clone(), config.webhook_timeout)?;
/// start_server(config, webhooks).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server(config: config::ApiConfig, webhooks: Gateway) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(ApiState { webhooks });
    let app = build_router(state).layer(TraceLayer::new_for_http());

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    // Add request timeout middleware
    let app = app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: BoxError| async {
                StatusCode::REQUEST_TIMEOUT
            }))
            .timeout(Duration::from_secs(config.request_timeout)),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
