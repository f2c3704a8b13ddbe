//! Greedy non-maximum suppression.

use turncue_models::Detection;

/// Apply Non-Maximum Suppression to remove overlapping detections.
///
/// Sorts by score descending, keeps the best remaining candidate and
/// suppresses every other candidate whose IoU with it exceeds
/// `iou_threshold`. Stops once `max_detections` are kept.
pub fn non_maximum_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    if detections.is_empty() || max_detections == 0 {
        return Vec::new();
    }

    // Sort by confidence (descending)
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<Detection> = Vec::with_capacity(max_detections.min(detections.len()));
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }

        keep.push(detections[i].clone());
        if keep.len() >= max_detections {
            break;
        }

        for j in (i + 1)..detections.len() {
            if suppressed[j] {
                continue;
            }

            if detections[i].rect.iou(&detections[j].rect) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}
