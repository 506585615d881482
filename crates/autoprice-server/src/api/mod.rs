mod reconcile;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use autoprice_core::Catalog;
use autoprice_scraper::Engine;

use crate::middleware::{
    assign_request_id, limit_reconciliations, require_api_key, ApiKeys, ReconcileLimiter,
    RequestId,
};

/// Reconcile requests allowed in flight at once.
const MAX_CONCURRENT_RECONCILIATIONS: usize = 4;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub catalog: Arc<Catalog>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    condition: String,
    catalog_models: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(keys: ApiKeys, limiter: ReconcileLimiter) -> Router<AppState> {
    Router::new()
        .route("/api/v1/reconcile/trim", post(reconcile::reconcile_trim))
        .route("/api/v1/reconcile/batch", post(reconcile::reconcile_batch))
        .route(
            "/api/v1/catalog/{brand}/{model}/reconcile",
            get(reconcile::reconcile_catalog_model),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(keys, require_api_key))
                .layer(axum::middleware::from_fn_with_state(
                    limiter,
                    limit_reconciliations,
                )),
        )
}

pub fn build_app(state: AppState, keys: ApiKeys, limiter: ReconcileLimiter) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(keys, limiter))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(assign_request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let catalog_models = state.catalog.brands.iter().map(|b| b.models.len()).sum();
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            condition: state.engine.condition().to_string(),
            catalog_models,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

pub fn default_reconcile_limiter() -> ReconcileLimiter {
    ReconcileLimiter::new(MAX_CONCURRENT_RECONCILIATIONS)
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
