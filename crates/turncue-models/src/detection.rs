//! Decoded face detections.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, Rect};

/// Five-point facial keypoint index.
///
/// "Right" and "left" are the subject's own sides, so the right eye
/// appears on the image's left for a face looking at the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    RightEye = 0,
    LeftEye = 1,
    NoseTip = 2,
    MouthRight = 3,
    MouthLeft = 4,
}

impl Landmark {
    /// All keypoints in buffer order.
    pub const ALL: [Landmark; 5] = [
        Landmark::RightEye,
        Landmark::LeftEye,
        Landmark::NoseTip,
        Landmark::MouthRight,
        Landmark::MouthLeft,
    ];
}

/// The five ordered keypoints of a face.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmarks(pub [Point2; 5]);

impl Landmarks {
    /// Point for a specific keypoint.
    #[inline]
    pub fn get(&self, landmark: Landmark) -> Point2 {
        self.0[landmark as usize]
    }

    #[inline]
    pub fn right_eye(&self) -> Point2 {
        self.get(Landmark::RightEye)
    }

    #[inline]
    pub fn left_eye(&self) -> Point2 {
        self.get(Landmark::LeftEye)
    }

    #[inline]
    pub fn nose(&self) -> Point2 {
        self.get(Landmark::NoseTip)
    }
}

/// A face candidate produced by the decoder for one frame.
///
/// Detections live for a single tick: the tracker maps them onto tracks
/// and drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Face box in frame pixels
    pub rect: Rect,
    /// Detection confidence (0.0-1.0)
    pub score: f32,
    /// Ordered five-point landmarks in frame pixels
    pub landmarks: Landmarks,
}

impl Detection {
    /// Create a new detection.
    pub fn new(rect: Rect, score: f32, landmarks: Landmarks) -> Self {
        Self {
            rect,
            score,
            landmarks,
        }
    }

    /// Convenience constructor for a face with a synthetic frontal layout,
    /// eyes level at 40% height and the nose on the vertical centre line.
    pub fn frontal(rect: Rect, score: f32) -> Self {
        let eye_y = rect.y + rect.height * 0.4;
        let landmarks = Landmarks([
            Point2::new(rect.x + rect.width * 0.3, eye_y),
            Point2::new(rect.x + rect.width * 0.7, eye_y),
            Point2::new(rect.cx(), rect.y + rect.height * 0.6),
            Point2::new(rect.x + rect.width * 0.35, rect.y + rect.height * 0.8),
            Point2::new(rect.x + rect.width * 0.65, rect.y + rect.height * 0.8),
        ]);
        Self::new(rect, score, landmarks)
    }
}
