use crate::error::LoadError;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

// Initialize the global environment for ORT (only needed once)
pub fn init_ort() -> Result<(), LoadError> {
    ort::init().with_name("slc-serve").commit()?;
    Ok(())
}

/// Loads the ONNX classifier from disk and creates an inference session.
///
/// # Arguments
/// * `model_path` - Path to the .onnx file
pub fn load_session(model_path: impl AsRef<Path>) -> Result<Session, LoadError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(LoadError::ModelNotFound(path.display().to_string()));
    }

    // Configure Session
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)? // Parallelism within an op
        .commit_from_file(path)?;

    tracing::info!(model = %path.display(), "loaded model");
    for (i, input) in session.inputs.iter().enumerate() {
        tracing::debug!("input {}: {} ({:?})", i, input.name, input.input_type);
    }

    Ok(session)
}
