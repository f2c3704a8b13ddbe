//! Face detector: preprocessing, inference and decoding for one frame.

use tracing::{debug, warn};
use turncue_models::Detection;

use super::backend::InferenceBackend;
use super::decoder::DetectorDecoder;
use super::preprocess::{Frame, Preprocessor};
use crate::config::DecoderConfig;
use crate::error::VisionResult;
use crate::metrics;

/// Runs the full frame → detections path.
///
/// Every failure on the per-frame path degrades to "no faces this frame";
/// only construction can fail.
pub struct FaceDetector {
    backend: Box<dyn InferenceBackend>,
    preprocessor: Preprocessor,
    decoder: DetectorDecoder,
    failing: bool,
}

impl FaceDetector {
    /// Create a detector around an inference backend.
    pub fn new(backend: Box<dyn InferenceBackend>, config: DecoderConfig) -> VisionResult<Self> {
        let preprocessor = Preprocessor::new(
            config.input_width,
            config.input_height,
            config.preprocess.clone(),
        );
        let decoder = DetectorDecoder::new(config)?;
        debug!(backend = backend.name(), "Face detector ready");
        Ok(Self {
            backend,
            preprocessor,
            decoder,
            failing: false,
        })
    }

    /// Detect faces in a camera frame.
    pub fn detect(&mut self, frame: &Frame) -> Vec<Detection> {
        let input = match self.preprocessor.prepare(frame) {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "Dropping unusable camera frame");
                return Vec::new();
            }
        };

        let raw = match self.backend.infer(&input, self.preprocessor.input_shape()) {
            Ok(raw) => {
                if self.failing {
                    self.failing = false;
                    debug!("Face detector inference recovered");
                }
                raw
            }
            Err(e) => {
                metrics::record_inference_failure();
                if !self.failing {
                    self.failing = true;
                    warn!(error = %e, backend = self.backend.name(), "Face detector inference failed");
                }
                return Vec::new();
            }
        };

        self.decoder.decode(&raw, frame.width, frame.height)
    }

    pub fn decoder(&self) -> &DetectorDecoder {
        &self.decoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PriorLevel;
    use crate::detection::decoder::VALUES_PER_ANCHOR;
    use crate::error::VisionError;

    /// Backend replaying a canned output buffer.
    struct CannedBackend {
        output: VisionResult<Vec<f32>>,
    }

    impl InferenceBackend for CannedBackend {
        fn infer(&mut self, input: &[f32], shape: [usize; 4]) -> VisionResult<Vec<f32>> {
            assert_eq!(input.len(), shape.iter().product::<usize>());
            match &self.output {
                Ok(v) => Ok(v.clone()),
                Err(_) => Err(VisionError::inference_failed("canned failure")),
            }
        }

        fn name(&self) -> &'static str {
            "canned"
        }
    }

    fn config() -> DecoderConfig {
        DecoderConfig {
            input_width: 64,
            input_height: 64,
            prior_levels: vec![PriorLevel::new(32, &[32.0])],
            conf_threshold: 0.5,
            min_face_side_px: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_detects_from_backend_output() {
        let mut output = vec![0.0; 4 * VALUES_PER_ANCHOR];
        output[4] = 0.9; // first anchor confidence
        let backend = CannedBackend {
            output: Ok(output),
        };
        let mut detector = FaceDetector::new(Box::new(backend), config()).unwrap();

        let frame = Frame::solid(128, 96, [0, 0, 0]);
        let faces = detector.detect(&frame);
        assert_eq!(faces.len(), 1);
        assert!((faces[0].rect.width - 64.0).abs() < 1e-3);
        assert!((faces[0].rect.height - 48.0).abs() < 1e-3);
    }

    #[test]
    fn test_backend_failure_yields_no_faces() {
        let backend = CannedBackend {
            output: Err(VisionError::inference_failed("x")),
        };
        let mut detector = FaceDetector::new(Box::new(backend), config()).unwrap();
        let frame = Frame::solid(64, 64, [0, 0, 0]);
        assert!(detector.detect(&frame).is_empty());
        assert!(detector.detect(&frame).is_empty());
        assert!(detector.failing);
    }

    #[test]
    fn test_wrong_output_length_yields_no_faces() {
        let backend = CannedBackend {
            output: Ok(vec![0.5; 13]),
        };
        let mut detector = FaceDetector::new(Box::new(backend), config()).unwrap();
        assert!(detector.detect(&Frame::solid(64, 64, [1, 2, 3])).is_empty());
    }
}
