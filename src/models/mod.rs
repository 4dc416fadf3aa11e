//! ML model inference components

pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod pipeline;
pub mod preprocess;

pub use inference::InferenceEngine;
pub use loader::ModelLoader;
pub use pipeline::{FraudPipeline, LinearPipeline};
