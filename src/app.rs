//! Pivot server API

use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::error::PivotError;
use crate::models;
use crate::pipeline;
use crate::validated_json::ValidatedJson;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tower::{Layer, ServiceBuilder};
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

impl IntoResponse for models::Response {
    /// Serialise the pivot table as JSON.
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Initialise the application
pub fn init(args: &CommandLineArgs) {
    if args.use_rayon {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(thread_limit) = args.thread_limit {
            builder = builder.num_threads(thread_limit.get());
        }
        if let Err(err) = builder.build_global() {
            tracing::warn!("failed to initialise rayon thread pool: {}", err);
        }
    }
}

/// Returns a [axum::Router] for the pivot API
///
/// The router is populated with the pivot route, and layers for tracing and CORS. Any origin
/// may call the API, with credentials.
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/", post(pivot))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            id = %uuid::Uuid::new_v4(),
                            method = %request.method(),
                            uri = %request.uri(),
                        )
                    }),
                )
                .layer(CorsLayer::very_permissive()),
        )
        .with_state(state)
}

/// Pivot server Service type alias
///
/// This type implements [tower::Service].
pub type Service = NormalizePath<Router>;

/// Returns a [crate::app::Service] for the pivot API
///
/// The service is populated with a [crate::app::router] that has been wrapped in layers.
///
/// * a [tower_http::normalize_path::NormalizePath] layer which strips trailing slashes
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn service(args: &CommandLineArgs) -> Service {
    let state = Arc::new(AppState::new(args));
    service_with_state(state)
}

/// Returns a [crate::app::Service] using the given application state.
pub fn service_with_state(state: SharedAppState) -> Service {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Handler for pivot requests
///
/// Loads the source table (from the cache if possible), then filters, pivots and shapes it.
/// The CPU-bound part runs on the Rayon thread pool if enabled.
///
/// # Arguments
///
/// * `state`: Shared application state
/// * `request_data`: Pivot request data
#[tracing::instrument(level = "DEBUG", skip(state))]
async fn pivot(
    State(state): State<SharedAppState>,
    ValidatedJson(request_data): ValidatedJson<models::RequestData>,
) -> Result<models::Response, PivotError> {
    let table = state
        .loader
        .load(&request_data.url, &state.resource_manager)
        .await?;
    // Acquire a task permit to be freed via drop when this function returns.
    let _task_permit = state.resource_manager.task().await?;
    if state.args.use_rayon {
        tokio_rayon::spawn(move || pipeline::run(&request_data, &table)).await
    } else {
        pipeline::run(&request_data, &table)
    }
}
