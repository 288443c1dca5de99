use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::info;

use super::domain::PredictionRequest;
use super::engine::PredictionEngine;
use crate::reference::ReferenceSummary;

#[derive(Debug, Clone)]
pub struct PredictionState {
    pub engine: Arc<PredictionEngine>,
    pub reference: Arc<ReferenceSummary>,
}

/// Router builder exposing the prediction and reference-data endpoints.
pub fn prediction_router(engine: Arc<PredictionEngine>, reference: ReferenceSummary) -> Router {
    Router::new()
        .route("/api/v1/predict", post(predict_handler))
        .route("/api/v1/reference", get(reference_handler))
        .with_state(PredictionState {
            engine,
            reference: Arc::new(reference),
        })
}

pub(crate) async fn predict_handler(
    State(state): State<PredictionState>,
    axum::Json(request): axum::Json<PredictionRequest>,
) -> Response {
    match state.engine.predict(&request) {
        Ok(result) => {
            info!(
                rank = result.rank,
                category = result.category.code(),
                matches = result.colleges.len(),
                "prediction served"
            );
            (StatusCode::OK, axum::Json(result)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn reference_handler(State(state): State<PredictionState>) -> Response {
    (StatusCode::OK, axum::Json(state.reference.as_ref())).into_response()
}
