//! HTTP adapter: `POST /predict` over axum.
//!
//! The body is read as raw bytes and parsed by the pipeline so that every
//! failure, malformed JSON included, produces the same
//! `400 {"error": "..."}` response. The error kind only reaches the logs.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use crate::application::PredictionService;
use crate::ports::{Model, Scaler};

/// Path of the single prediction route.
pub const PREDICT_PATH: &str = "/predict";

/// Build the router around a shared prediction service.
pub fn router<M, S>(service: Arc<PredictionService<M, S>>) -> Router
where
    M: Model + 'static,
    S: Scaler + 'static,
{
    Router::new()
        .route(PREDICT_PATH, post(predict::<M, S>))
        .with_state(service)
}

async fn predict<M, S>(
    State(service): State<Arc<PredictionService<M, S>>>,
    body: Bytes,
) -> Response
where
    M: Model + 'static,
    S: Scaler + 'static,
{
    match service.predict_json(&body) {
        Ok(prediction) => (StatusCode::OK, Json(prediction)).into_response(),
        Err(e) => {
            tracing::warn!(kind = %e.kind(), "Prediction request rejected: {e}");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
