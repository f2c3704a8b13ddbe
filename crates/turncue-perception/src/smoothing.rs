//! One-Euro adaptive low-pass filtering.
//!
//! Cutoff rises with signal speed: slow movement is smoothed heavily,
//! fast movement is followed with little lag. Filters must be reset when the
//! identity behind the stream changes.

use std::f32::consts::PI;

use turncue_models::Point2;

use crate::config::SmoothingConfig;

/// Smoothing factor for a first-order low-pass at `cutoff` Hz.
#[inline]
fn alpha(cutoff: f32, dt: f32) -> f32 {
    let tau = 1.0 / (2.0 * PI * cutoff);
    1.0 / (1.0 + tau / dt)
}

#[inline]
fn lerp(from: f32, to: f32, a: f32) -> f32 {
    from + a * (to - from)
}

/// Scalar One-Euro filter.
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    config: SmoothingConfig,
    /// (last output, last smoothed derivative) once seeded
    state: Option<(f32, f32)>,
}

impl OneEuroFilter {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Filter one sample taken `dt` seconds after the previous one.
    ///
    /// The first sample after construction or [`reset`](Self::reset) is
    /// returned unchanged. A non-positive or non-finite `dt` returns the
    /// previous output without touching the state.
    pub fn filter(&mut self, x: f32, dt: f32) -> f32 {
        let Some((x_prev, dx_prev)) = self.state else {
            self.state = Some((x, 0.0));
            return x;
        };

        if !(dt > 0.0) || !dt.is_finite() {
            return x_prev;
        }

        let dx = (x - x_prev) / dt;
        let dx_hat = lerp(dx_prev, dx, alpha(self.config.derivative_cutoff, dt));
        let cutoff = self.config.min_cutoff + self.config.beta * dx_hat.abs();
        let x_hat = lerp(x_prev, x, alpha(cutoff, dt));

        self.state = Some((x_hat, dx_hat));
        x_hat
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Last output, if any sample has been seen since the last reset.
    pub fn value(&self) -> Option<f32> {
        self.state.map(|(x, _)| x)
    }
}

/// One-Euro filter over a 2D point (independent per axis).
#[derive(Debug, Clone)]
pub struct OneEuroFilter2 {
    x: OneEuroFilter,
    y: OneEuroFilter,
}

impl OneEuroFilter2 {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            x: OneEuroFilter::new(config),
            y: OneEuroFilter::new(config),
        }
    }

    pub fn filter(&mut self, point: Point2, dt: f32) -> Point2 {
        Point2::new(self.x.filter(point.x, dt), self.y.filter(point.y, dt))
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }
}
