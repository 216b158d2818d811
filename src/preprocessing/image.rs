use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::{Array, Array4, Axis};

use crate::error::PredictError;

/// Spatial resolution the classifier was trained at.
pub const INPUT_SIZE: u32 = 28;

/// Decodes an image from raw bytes, guessing the format.
pub fn decode(buffer: &[u8]) -> Result<DynamicImage, PredictError> {
    image::load_from_memory(buffer).map_err(|e| PredictError::Decode(e.to_string()))
}

/// Converts a decoded image into the model's input tensor.
///
/// Collapses RGB/RGBA inputs to a single luma channel, resizes to 28x28,
/// scales pixel values to [0, 1] and shapes the result as [1, 28, 28, 1]
/// (channel-last, as the model expects).
pub fn to_tensor(img: &DynamicImage) -> Result<Array4<f32>, PredictError> {
    let gray = img.to_luma8();
    let resized = image::imageops::resize(&gray, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let mut scaled = Vec::with_capacity((INPUT_SIZE * INPUT_SIZE) as usize);
    for pixel in resized.pixels() {
        scaled.push(pixel[0] as f32 / 255.0);
    }

    // [H, W] -> [1, H, W, 1]
    let array = Array::from_shape_vec((INPUT_SIZE as usize, INPUT_SIZE as usize), scaled)
        .map_err(|e| PredictError::Preprocess(e.to_string()))?;
    let array = array.insert_axis(Axis(0)).insert_axis(Axis(3));

    Ok(array)
}

/// Full bytes -> tensor pipeline.
pub fn tensor_from_bytes(buffer: &[u8]) -> Result<Array4<f32>, PredictError> {
    let img = decode(buffer)?;
    to_tensor(&img)
}

/// Reads and preprocesses a local image file.
pub fn tensor_from_path(path: impl AsRef<Path>) -> Result<Array4<f32>, PredictError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| PredictError::Decode(format!("{}: {e}", path.display())))?;
    tensor_from_bytes(&bytes)
}
