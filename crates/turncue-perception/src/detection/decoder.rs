//! Anchor output decoding.
//!
//! Each prior owns one 15-value record in the detector output:
//! `[dx, dy, dw, dh, conf, l0x, l0y, .., l4x, l4y]`. Records are laid out
//! either anchor-major (`[anchor][15]`) or channel-major (`[15][anchor]`)
//! depending on the configured [`OutputLayout`].

use ndarray::ArrayView2;
use tracing::{debug, warn};
use turncue_models::{Detection, Landmarks, Point2, Rect};

use super::nms::non_maximum_suppression;
use super::priors::{Prior, PriorBox};
use crate::config::{DecoderConfig, OutputLayout, ScoreActivation};
use crate::error::{VisionError, VisionResult};
use crate::metrics;

/// Values per anchor record.
pub const VALUES_PER_ANCHOR: usize = 15;

const CONF: usize = 4;
const LANDMARKS: usize = 5;

/// Decode a raw output buffer into NMS-filtered detections.
///
/// Coordinates are mapped to a `frame_width x frame_height` pixel space.
/// Returns [`VisionError::OutputShape`] if the buffer does not hold exactly
/// one record per prior.
pub fn decode(
    raw: &[f32],
    priors: &[Prior],
    config: &DecoderConfig,
    frame_width: f32,
    frame_height: f32,
) -> VisionResult<Vec<Detection>> {
    let expected = priors.len() * VALUES_PER_ANCHOR;
    if raw.len() != expected {
        return Err(VisionError::OutputShape {
            expected,
            got: raw.len(),
        });
    }

    // View as [anchor, channel] regardless of storage order
    let records = match config.layout {
        OutputLayout::AnchorMajor => ArrayView2::from_shape((priors.len(), VALUES_PER_ANCHOR), raw)
            .map_err(|e| VisionError::internal(format!("Failed to reshape output: {}", e)))?,
        OutputLayout::ChannelMajor => ArrayView2::from_shape((VALUES_PER_ANCHOR, priors.len()), raw)
            .map_err(|e| VisionError::internal(format!("Failed to reshape output: {}", e)))?
            .reversed_axes(),
    };

    let cv = config.center_variance;
    let sv = config.size_variance;
    let mut candidates = Vec::new();

    for (i, prior) in priors.iter().enumerate() {
        let score = activate(records[[i, CONF]], config.score_activation);
        if !(score >= config.conf_threshold) {
            continue;
        }

        let cx = prior.cx + records[[i, 0]] * cv * prior.width;
        let cy = prior.cy + records[[i, 1]] * cv * prior.height;
        let w = prior.width * (records[[i, 2]] * sv).exp();
        let h = prior.height * (records[[i, 3]] * sv).exp();

        let rect = Rect::from_corners(
            (cx - w / 2.0) * frame_width,
            (cy - h / 2.0) * frame_height,
            (cx + w / 2.0) * frame_width,
            (cy + h / 2.0) * frame_height,
        );

        if !rect.min_side().is_finite() || rect.min_side() < config.min_face_side_px {
            continue;
        }

        let mut points = [Point2::default(); LANDMARKS];
        for (k, point) in points.iter_mut().enumerate() {
            let ox = records[[i, CONF + 1 + 2 * k]];
            let oy = records[[i, CONF + 2 + 2 * k]];
            *point = Point2::new(
                (prior.cx + ox * cv * prior.width) * frame_width,
                (prior.cy + oy * cv * prior.height) * frame_height,
            );
        }

        candidates.push(Detection::new(rect, score, Landmarks(points)));
    }

    Ok(non_maximum_suppression(
        candidates,
        config.iou_threshold,
        config.max_detections,
    ))
}

/// Map a raw confidence value to [0, 1]. NaN stays NaN and is rejected
/// by the threshold comparison.
fn activate(raw: f32, activation: ScoreActivation) -> f32 {
    let p = match activation {
        ScoreActivation::Identity => raw,
        ScoreActivation::Sigmoid => 1.0 / (1.0 + (-raw).exp()),
    };
    if p.is_nan() {
        p
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Stateful decoder owning the priors for one detector configuration.
///
/// Malformed buffers are reported once per decoder and then treated as
/// frames without faces.
pub struct DetectorDecoder {
    config: DecoderConfig,
    priors: PriorBox,
    warned_malformed: bool,
}

impl DetectorDecoder {
    /// Create a decoder, generating priors from the configuration.
    pub fn new(config: DecoderConfig) -> VisionResult<Self> {
        config.validate()?;
        let priors = PriorBox::new(&config);
        debug!(
            priors = priors.len(),
            input_width = config.input_width,
            input_height = config.input_height,
            layout = ?config.layout,
            "Detector decoder initialized"
        );
        Ok(Self {
            config,
            priors,
            warned_malformed: false,
        })
    }

    /// Decode one frame of detector output.
    ///
    /// Never fails: a malformed buffer yields zero detections.
    pub fn decode(&mut self, raw: &[f32], frame_width: u32, frame_height: u32) -> Vec<Detection> {
        match decode(
            raw,
            self.priors.priors(),
            &self.config,
            frame_width as f32,
            frame_height as f32,
        ) {
            Ok(detections) => {
                metrics::record_faces_per_frame(detections.len());
                detections
            }
            Err(e) => {
                metrics::record_malformed_frame();
                if !self.warned_malformed {
                    self.warned_malformed = true;
                    warn!(error = %e, "Malformed detector output, treating as no faces");
                }
                Vec::new()
            }
        }
    }

    /// Number of values the detector must emit per frame.
    pub fn expected_output_len(&self) -> usize {
        self.priors.len() * VALUES_PER_ANCHOR
    }

    pub fn priors(&self) -> &[Prior] {
        self.priors.priors()
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}
