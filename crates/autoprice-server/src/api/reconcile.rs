use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use autoprice_core::{BatchSummary, ReconciliationResult, Trim};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Upper bound on trims per batch request. Each trim costs at least two
/// outbound page fetches plus the inter-trim pause.
const MAX_BATCH_TRIMS: usize = 100;

#[derive(Debug, Deserialize)]
pub(super) struct TrimRequest {
    brand: String,
    model: String,
    trim: Trim,
}

#[derive(Debug, Deserialize)]
pub(super) struct BatchRequest {
    brand: String,
    model: String,
    #[serde(default)]
    trims: Vec<Trim>,
}

#[derive(Debug, Serialize)]
pub(super) struct BatchData {
    brand: String,
    model: String,
    results: Vec<ReconciliationResult>,
    summary: BatchSummary,
}

fn validate_names(request_id: &str, brand: &str, model: &str) -> Result<(), ApiError> {
    if brand.trim().is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "brand must not be blank",
        ));
    }
    if model.trim().is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "model must not be blank",
        ));
    }
    Ok(())
}

pub(super) async fn reconcile_trim(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<TrimRequest>,
) -> Result<Json<ApiResponse<ReconciliationResult>>, ApiError> {
    validate_names(&req_id.0, &body.brand, &body.model)?;

    let result = state
        .engine
        .reconcile_trim(body.brand.trim(), body.model.trim(), &body.trim)
        .await;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn reconcile_batch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BatchRequest>,
) -> Result<Json<ApiResponse<BatchData>>, ApiError> {
    validate_names(&req_id.0, &body.brand, &body.model)?;
    if body.trims.len() > MAX_BATCH_TRIMS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("at most {MAX_BATCH_TRIMS} trims per batch"),
        ));
    }

    let brand = body.brand.trim().to_owned();
    let model = body.model.trim().to_owned();
    let (results, summary) = state.engine.reconcile_batch(&brand, &model, &body.trims).await;

    Ok(Json(ApiResponse {
        data: BatchData {
            brand,
            model,
            results,
            summary,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn reconcile_catalog_model(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((brand, model)): Path<(String, String)>,
) -> Result<Json<ApiResponse<BatchData>>, ApiError> {
    validate_names(&req_id.0, &brand, &model)?;

    let Some((brand_entry, model_entry)) = state.catalog.find_model(&brand, &model) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("model '{brand} {model}' is not in the catalog"),
        ));
    };

    let (results, summary) = state
        .engine
        .reconcile_batch(&brand_entry.name, &model_entry.name, &model_entry.trims)
        .await;

    Ok(Json(ApiResponse {
        data: BatchData {
            brand: brand_entry.name.clone(),
            model: model_entry.name.clone(),
            results,
            summary,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
