//! Read-only view of a tracked face.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Track identifier, unique within one tracker instance.
pub type TrackId = u32;

/// Per-tick snapshot of a tracked face.
///
/// The tracker keeps the live track (filters, dwell timers) private and
/// hands this copy downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: TrackId,
    /// Smoothed face box
    pub rect: Rect,
    /// Stable "looking at the wearer" state after dwell hysteresis
    pub looked: bool,
    /// Raw per-frame frontal classification from the last observation
    pub frontal: bool,
    /// Eye-line roll in degrees, wrapped to [0, 90]
    pub roll_deg: f32,
    /// Normalized horizontal nose offset from the eye midpoint
    pub nose_asym_x: f32,
    /// Seconds since this track was last matched to a detection
    pub seconds_since_seen: f32,
}
