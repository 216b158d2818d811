use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ndarray::ShapeError;
use serde_json::json;
use thiserror::Error;

/// Configuration problems. All of these abort startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("settings file {path} could not be read: {source}")]
    Settings {
        path: String,
        #[source]
        source: dotenvy::Error,
    },

    #[error("missing required setting: {0}")]
    MissingKey(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Model-load problems. The service cannot serve predictions without a
/// model, so these also abort startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Model not found at path: {0}")]
    ModelNotFound(String),

    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Domain failures from the ingestion entry points. A closed set: every
/// failure between receiving an image and ranking the output maps onto one
/// of these kinds and rides a 200 response with `success: false`.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Failed to process image: {0}")]
    Decode(String),

    #[error("Failed to download image: {0}")]
    Download(String),

    #[error("Image preprocessing failed: {0}")]
    Preprocess(String),

    #[error("Prediction failed: {0}")]
    Inference(String),
}

impl From<ort::Error> for PredictError {
    fn from(e: ort::Error) -> Self {
        PredictError::Inference(e.to_string())
    }
}

impl From<ShapeError> for PredictError {
    fn from(e: ShapeError) -> Self {
        PredictError::Preprocess(e.to_string())
    }
}

/// Request-validation failures. Unlike [`PredictError`] these are transport
/// faults and surface as 4xx/5xx with a JSON error body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid file type. Please upload an image file.")]
    InvalidContentType,

    #[error("File size exceeds 10MB limit.")]
    PayloadTooLarge,

    #[error("Invalid base64 image data.")]
    InvalidBase64,

    #[error("Missing multipart field: {0}")]
    MissingField(&'static str),

    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::InvalidContentType
            | ApiError::PayloadTooLarge
            | ApiError::InvalidBase64
            | ApiError::MissingField(_)
            | ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_error_messages() {
        let decode = PredictError::Decode("bad magic bytes".to_string());
        assert_eq!(decode.to_string(), "Failed to process image: bad magic bytes");

        let download = PredictError::Download("connection timed out".to_string());
        assert_eq!(
            download.to_string(),
            "Failed to download image: connection timed out"
        );

        let preprocess = PredictError::Preprocess("shape mismatch".to_string());
        assert_eq!(
            preprocess.to_string(),
            "Image preprocessing failed: shape mismatch"
        );

        let inference = PredictError::Inference("session closed".to_string());
        assert_eq!(inference.to_string(), "Prediction failed: session closed");
    }

    #[test]
    fn test_shape_error_maps_to_preprocess() {
        let shape_error = ShapeError::from_kind(ndarray::ErrorKind::OutOfBounds);
        let predict_error = PredictError::from(shape_error);
        match predict_error {
            PredictError::Preprocess(_) => {} // Expected
            other => panic!("Expected Preprocess, got {other:?}"),
        }
    }

    #[test]
    fn test_ort_error_maps_to_inference() {
        let ort_error = ort::Error::new("test error");
        let predict_error = PredictError::from(ort_error);
        match predict_error {
            PredictError::Inference(_) => {} // Expected
            other => panic!("Expected Inference, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        for error in [
            ApiError::InvalidContentType,
            ApiError::PayloadTooLarge,
            ApiError::InvalidBase64,
            ApiError::MissingField("file"),
            ApiError::Multipart("truncated body".to_string()),
        ] {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let error = ApiError::Internal("lock poisoned".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_config_error_messages() {
        let missing = ConfigError::MissingKey("MODEL_PATH");
        assert_eq!(missing.to_string(), "missing required setting: MODEL_PATH");

        let invalid = ConfigError::Invalid {
            key: "PORT",
            value: "80 80".to_string(),
        };
        assert_eq!(invalid.to_string(), "invalid value for PORT: 80 80");
    }

    #[test]
    fn test_load_error_model_not_found() {
        let error = LoadError::ModelNotFound("models/slc.onnx".to_string());
        assert_eq!(error.to_string(), "Model not found at path: models/slc.onnx");
    }
}
