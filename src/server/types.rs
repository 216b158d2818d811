use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::model::{Prediction, Predictor, RankedLabel};

/// Shared Application State
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn Predictor>,
}

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize)]
pub struct ImageUrlRequest {
    pub image_url: String,
}

/// Form body of `POST /slc/predict/base64`.
#[derive(Deserialize)]
pub struct Base64Form {
    pub image_data: String,
}

/// Wire shape shared by all three prediction endpoints.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top3: Option<Vec<RankedLabel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResponse {
    /// Domain failures ride a 200: the transport worked, the prediction
    /// did not.
    pub fn from_result(result: Result<Prediction, PredictError>) -> Self {
        match result {
            Ok(prediction) => Self {
                success: true,
                letter: Some(prediction.letter),
                confidence: Some(prediction.confidence),
                top3: Some(prediction.top3),
                error: None,
            },
            Err(error) => Self {
                success: false,
                letter: None,
                confidence: None,
                top3: None,
                error: Some(error.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let response = PredictionResponse::from_result(Ok(Prediction {
            letter: 'W',
            confidence: 88.5,
            top3: vec![RankedLabel {
                letter: 'W',
                confidence: 88.5,
            }],
        }));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], serde_json::Value::Bool(true));
        assert_eq!(json["letter"], "W");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_shape() {
        let response =
            PredictionResponse::from_result(Err(PredictError::Download("timed out".to_string())));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], serde_json::Value::Bool(false));
        assert_eq!(json["error"], "Failed to download image: timed out");
        assert!(json.get("letter").is_none());
        assert!(json.get("top3").is_none());
    }
}
