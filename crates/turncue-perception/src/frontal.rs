//! Geometric frontal-face test on eye and nose landmarks.
//!
//! A face counts as frontal when its eye line is close to horizontal (roll)
//! and the nose sits near the eye midpoint once the roll is removed (a proxy
//! for yaw). Two threshold sets give geometric hysteresis: the tracker uses
//! the stricter `enter` set to start looking and the looser `exit` set to
//! keep looking.

use turncue_models::Point2;

use crate::config::{FrontalConfig, FrontalThresholds};

/// Result of one frontal test.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrontalMeasurement {
    pub frontal: bool,
    /// Eye-line roll folded into [0, 90] degrees
    pub roll_deg: f32,
    /// Nose offset from the eye midpoint over eye spacing, after de-rotation
    pub nose_asym_x: f32,
}

/// Stateless frontal classifier.
#[derive(Debug, Clone)]
pub struct FrontalClassifier {
    config: FrontalConfig,
}

impl FrontalClassifier {
    pub fn new(config: FrontalConfig) -> Self {
        Self { config }
    }

    /// Threshold set for a face that currently is (or is not) looked.
    pub fn thresholds(&self, looked: bool) -> &FrontalThresholds {
        if looked {
            &self.config.exit
        } else {
            &self.config.enter
        }
    }

    /// Classify one face.
    ///
    /// `right_eye` is the subject's right eye, which appears on the image
    /// left. Measurements computed before a rejection are still reported.
    pub fn classify(
        &self,
        right_eye: Point2,
        left_eye: Point2,
        nose: Point2,
        face_width: f32,
        thresholds: &FrontalThresholds,
    ) -> FrontalMeasurement {
        let inter = right_eye.distance(&left_eye);
        let min_inter = (self.config.min_inter_frac * face_width).max(self.config.min_inter_abs_px);
        if !(inter >= min_inter) || inter <= f32::EPSILON {
            return FrontalMeasurement::default();
        }

        let angle = (left_eye.y - right_eye.y).atan2(left_eye.x - right_eye.x);
        let roll_deg = fold_roll(angle.to_degrees());
        if roll_deg > thresholds.max_roll_deg {
            return FrontalMeasurement {
                frontal: false,
                roll_deg,
                nose_asym_x: 0.0,
            };
        }

        // Level the eye line, then compare the nose against the midpoint
        let mid = right_eye.midpoint(&left_eye);
        let nose = nose.rotated_about(&mid, -angle);
        let right = right_eye.rotated_about(&mid, -angle);
        let left = left_eye.rotated_about(&mid, -angle);
        let spacing = (left.x - right.x).abs().max(f32::EPSILON);
        let nose_asym_x = (nose.x - mid.x).abs() / spacing;

        FrontalMeasurement {
            frontal: nose_asym_x <= thresholds.max_nose_asym,
            roll_deg,
            nose_asym_x,
        }
    }
}

/// Fold a signed angle in degrees into [0, 90].
fn fold_roll(deg: f32) -> f32 {
    let r = deg.abs() % 180.0;
    if r > 90.0 {
        180.0 - r
    } else {
        r
    }
}
