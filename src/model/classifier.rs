use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ndarray::{Array4, ArrayViewD, Axis};
use ort::session::Session;
use ort::value::{Value, ValueType};
use serde::Serialize;

use crate::error::{LoadError, PredictError};
use crate::model::{labels, loader};
use crate::preprocessing;

// Bound on remote image downloads; a stuck origin reports a download
// failure instead of holding the request open.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// One entry of the top-3 ranked list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedLabel {
    pub letter: char,
    pub confidence: f32,
}

/// Outcome of a successful classification.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub letter: char,
    /// Percentage in [0, 100], rounded to two decimals.
    pub confidence: f32,
    /// The three highest-scoring letters, descending.
    pub top3: Vec<RankedLabel>,
}

/// Static and session-derived metadata served by `GET /slc/model/info`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_classes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<char>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_parameters: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelInfo {
    pub fn not_loaded(error: impl Into<String>) -> Self {
        Self {
            loaded: false,
            model_path: None,
            input_shape: None,
            output_shape: None,
            num_classes: None,
            labels: None,
            total_parameters: None,
            error: Some(error.into()),
        }
    }
}

/// Seam between the HTTP layer and the model wrapper. Route handlers only
/// see this trait, so request validation is testable without a session.
#[async_trait]
pub trait Predictor: Send + Sync {
    fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction, PredictError>;
    async fn predict_url(&self, url: &str) -> Result<Prediction, PredictError>;
    fn model_info(&self) -> ModelInfo;
}

/// Wraps the single loaded ONNX session for ASL letter classification.
///
/// Loaded once at startup; inference does not mutate it. The session sits
/// behind a mutex because `run` needs exclusive access; the lock is held
/// only for the duration of one inference call.
pub struct SignClassifier {
    session: Mutex<Session>,
    model_path: PathBuf,
    http: reqwest::Client,
}

impl SignClassifier {
    /// Loads the classifier. Errors here are fatal: the process must not
    /// reach a ready state without a usable model.
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let model_path = model_path.as_ref().to_path_buf();
        let session = loader::load_session(&model_path)?;
        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;

        Ok(Self {
            session: Mutex::new(session),
            model_path,
            http,
        })
    }

    /// Runs inference on a preprocessed tensor and ranks the output.
    pub fn predict_tensor(&self, tensor: Array4<f32>) -> Result<Prediction, PredictError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| PredictError::Inference("model session is unavailable".to_string()))?;

        let input_name = session
            .inputs
            .first()
            .ok_or_else(|| PredictError::Inference("model declares no inputs".to_string()))?
            .name
            .clone();

        let shape = tensor.shape().to_vec();
        let data = tensor.into_raw_vec().into_boxed_slice();
        let input_value = Value::from_array((shape, data))?;
        let outputs = session.run(ort::inputs![input_name => input_value])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        if dims.is_empty() || dims[0] == 0 {
            return Err(PredictError::Inference(
                "model returned an empty output".to_string(),
            ));
        }

        let output = ArrayViewD::from_shape(dims.as_slice(), data)
            .map_err(|e| PredictError::Inference(e.to_string()))?;
        let scores: Vec<f32> = if dims.len() == 1 {
            output.iter().copied().collect()
        } else {
            output.index_axis(Axis(0), 0).iter().copied().collect()
        };

        let prediction = rank(&scores)?;
        tracing::info!(
            letter = %prediction.letter,
            confidence = prediction.confidence,
            "prediction"
        );
        Ok(prediction)
    }

    /// Predicts from raw image bytes: decode -> preprocess -> predict.
    pub fn predict_from_bytes(&self, bytes: &[u8]) -> Result<Prediction, PredictError> {
        let tensor = preprocessing::image::tensor_from_bytes(bytes)?;
        self.predict_tensor(tensor)
    }

    /// Predicts from a remote image URL. Network and HTTP errors are
    /// reported as download failures, never propagated as panics, and the
    /// download is not retried.
    pub async fn predict_from_url(&self, url: &str) -> Result<Prediction, PredictError> {
        tracing::info!(%url, "downloading image");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PredictError::Download(e.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|e| PredictError::Download(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PredictError::Download(e.to_string()))?;

        self.predict_from_bytes(&bytes)
    }

    /// Predicts from a local image file.
    pub fn predict_from_path(&self, path: impl AsRef<Path>) -> Result<Prediction, PredictError> {
        let tensor = preprocessing::image::tensor_from_path(path)?;
        self.predict_tensor(tensor)
    }

    /// Metadata about the loaded model. Never runs inference.
    pub fn model_info(&self) -> ModelInfo {
        let session = match self.session.lock() {
            Ok(guard) => guard,
            Err(_) => return ModelInfo::not_loaded("Model not loaded"),
        };

        let input_shape = session.inputs.first().map(|i| shape_string(&i.input_type));
        let output_shape = session
            .outputs
            .first()
            .map(|o| shape_string(&o.output_type));
        // ONNX Runtime does not enumerate weight tensors; the exporter may
        // record the count as custom metadata.
        let total_parameters = session
            .metadata()
            .ok()
            .and_then(|m| m.custom("total_parameters").ok().flatten())
            .and_then(|v| v.parse().ok());

        ModelInfo {
            loaded: true,
            model_path: Some(self.model_path.display().to_string()),
            input_shape,
            output_shape,
            num_classes: Some(labels::LABELS.len()),
            labels: Some(labels::LABELS.to_vec()),
            total_parameters,
            error: None,
        }
    }
}

#[async_trait]
impl Predictor for SignClassifier {
    fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction, PredictError> {
        self.predict_from_bytes(bytes)
    }

    async fn predict_url(&self, url: &str) -> Result<Prediction, PredictError> {
        self.predict_from_url(url).await
    }

    fn model_info(&self) -> ModelInfo {
        SignClassifier::model_info(self)
    }
}

/// Softmaxes raw scores and ranks them: arg-max letter, confidence as the
/// max probability x 100 (two decimals), plus the top-3 list descending.
fn rank(scores: &[f32]) -> Result<Prediction, PredictError> {
    if scores.is_empty() {
        return Err(PredictError::Inference(
            "model returned an empty output vector".to_string(),
        ));
    }

    let probabilities = softmax(scores);
    let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (top_index, top_probability) = ranked[0];
    let letter = labels::letter(top_index).ok_or_else(|| {
        PredictError::Inference(format!("class index {top_index} is outside the label set"))
    })?;

    let top3 = ranked
        .iter()
        .take(3)
        .filter_map(|&(index, probability)| {
            labels::letter(index).map(|letter| RankedLabel {
                letter,
                confidence: probability * 100.0,
            })
        })
        .collect();

    Ok(Prediction {
        letter,
        confidence: round2(top_probability * 100.0),
        top3,
    })
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Renders a session value type as a compact shape string, e.g. "[1, 28, 28, 1]".
fn shape_string(value_type: &ValueType) -> String {
    match value_type {
        ValueType::Tensor { shape, .. } => {
            let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
            format!("[{}]", dims.join(", "))
        }
        other => format!("{other:?}"),
    }
}
