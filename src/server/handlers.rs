use axum::{
    extract::{Multipart, State},
    Form, Json,
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

use crate::error::{ApiError, PredictError};
use crate::model::{ModelInfo, Prediction};
use crate::server::types::{AppState, Base64Form, ImageUrlRequest, PredictionResponse};

/// Ceiling on uploaded image payloads.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub async fn health_check() -> &'static str {
    "OK"
}

/// POST /slc/predict — multipart file upload.
pub async fn predict_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<PredictionResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        tracing::info!(
            filename = field.file_name().unwrap_or("-"),
            "received file prediction request"
        );

        // Reject before reading the body: no decoding on non-images.
        let is_image = field
            .content_type()
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(ApiError::InvalidContentType);
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Multipart(e.to_string()))?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::PayloadTooLarge);
        }

        let result = state.predictor.predict_bytes(&bytes);
        return Ok(respond(result));
    }

    Err(ApiError::MissingField("file"))
}

/// POST /slc/predict/url — JSON body `{"image_url": ...}`.
///
/// Download failures come back as domain results with `success: false`,
/// not as transport errors.
pub async fn predict_url(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImageUrlRequest>,
) -> Json<PredictionResponse> {
    tracing::info!(url = %request.image_url, "received url prediction request");

    let result = state.predictor.predict_url(&request.image_url).await;
    respond(result)
}

/// POST /slc/predict/base64 — form field `image_data`, optionally carrying
/// a `data:...;base64,` header which is stripped before decoding.
pub async fn predict_base64(
    State(state): State<Arc<AppState>>,
    Form(form): Form<Base64Form>,
) -> Result<Json<PredictionResponse>, ApiError> {
    tracing::info!("received base64 prediction request");

    let encoded = match form.image_data.split_once(',') {
        Some((_, data)) => data.to_owned(),
        None => form.image_data,
    };

    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| ApiError::InvalidBase64)?;

    let result = state.predictor.predict_bytes(&bytes);
    Ok(respond(result))
}

/// GET /slc/model/info
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfo> {
    Json(state.predictor.model_info())
}

fn respond(result: Result<Prediction, PredictError>) -> Json<PredictionResponse> {
    if let Err(error) = &result {
        tracing::error!(%error, "prediction failed");
    }
    Json(PredictionResponse::from_result(result))
}
