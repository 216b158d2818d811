pub mod classifier;
pub mod labels;
pub mod loader;

pub use classifier::{ModelInfo, Prediction, Predictor, RankedLabel, SignClassifier};
