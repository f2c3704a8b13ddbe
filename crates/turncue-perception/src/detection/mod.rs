//! Face detection: priors, decoding, NMS and the inference boundary.

mod backend;
mod decoder;
mod detector;
mod nms;
mod preprocess;
mod priors;

pub use backend::InferenceBackend;
#[cfg(feature = "onnx")]
pub use backend::OrtBackend;
pub use decoder::{decode, DetectorDecoder, VALUES_PER_ANCHOR};
pub use detector::FaceDetector;
pub use nms::non_maximum_suppression;
pub use preprocess::{Frame, Preprocessor};
pub use priors::{Prior, PriorBox};
