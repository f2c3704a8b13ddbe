//! Inference boundary.
//!
//! The face detector treats model execution as an opaque, synchronous call:
//! a fixed-size NCHW tensor goes in, a flat output buffer comes out. The
//! output layout is declared in [`DecoderConfig`](crate::config::DecoderConfig),
//! never sniffed from the buffer.

use crate::error::VisionResult;

/// Synchronous model execution.
pub trait InferenceBackend: Send {
    /// Run one forward pass on a `[1, 3, H, W]` tensor.
    fn infer(&mut self, input: &[f32], shape: [usize; 4]) -> VisionResult<Vec<f32>>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(feature = "onnx")]
pub use ort_backend::OrtBackend;

#[cfg(feature = "onnx")]
mod ort_backend {
    use std::path::Path;

    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::{Tensor, Value};
    use tracing::{debug, info};

    use super::InferenceBackend;
    use crate::error::{VisionError, VisionResult};

    /// ONNX Runtime backend for anchor-based face detectors.
    pub struct OrtBackend {
        session: Session,
        output_name: String,
    }

    impl OrtBackend {
        /// Load a model file.
        ///
        /// A missing file is [`VisionError::ModelNotFound`]; callers treat it
        /// as "no detector" rather than aborting the control loop.
        pub fn new(model_path: &Path, output_name: impl Into<String>) -> VisionResult<Self> {
            if !model_path.exists() {
                return Err(VisionError::model_not_found(model_path));
            }

            let session = create_session(model_path)?;
            let output_name = output_name.into();
            info!(
                model_path = %model_path.display(),
                output = %output_name,
                "Face detector model loaded"
            );

            Ok(Self {
                session,
                output_name,
            })
        }
    }

    impl InferenceBackend for OrtBackend {
        fn infer(&mut self, input: &[f32], shape: [usize; 4]) -> VisionResult<Vec<f32>> {
            let tensor = Tensor::from_array((shape.to_vec(), input.to_vec().into_boxed_slice()))
                .map(Value::from)
                .map_err(|e| VisionError::inference_failed(format!("Failed to create tensor: {}", e)))?;

            let outputs = self
                .session
                .run(ort::inputs![tensor])
                .map_err(|e| VisionError::inference_failed(format!("ONNX inference failed: {}", e)))?;

            let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
                VisionError::inference_failed(format!("Missing {} tensor", self.output_name))
            })?;

            let extracted = output
                .try_extract_tensor::<f32>()
                .map_err(|e| VisionError::inference_failed(format!("Failed to extract tensor: {}", e)))?;

            Ok(extracted.1.to_vec())
        }

        fn name(&self) -> &'static str {
            "onnxruntime"
        }
    }

    /// Create a single-threaded ONNX Runtime session on the CPU provider.
    fn create_session(model_path: &Path) -> VisionResult<Session> {
        let model_bytes = std::fs::read(model_path)?;

        let builder = Session::builder()
            .map_err(|e| VisionError::internal(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| VisionError::internal(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(1)
            .map_err(|e| VisionError::internal(format!("Failed to set thread count: {}", e)))?;

        debug!("Using CPU execution provider for face detection");
        builder
            .commit_from_memory(&model_bytes)
            .map_err(|e| VisionError::internal(format!("Failed to load ONNX model: {}", e)))
    }
}
