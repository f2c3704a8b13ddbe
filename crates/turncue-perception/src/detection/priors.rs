//! Prior (anchor) generation.
//!
//! Priors are generated once per decoder from the configured
//! (step, min sizes) levels and never change afterwards.

use crate::config::DecoderConfig;

/// Reference box in normalized input space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prior {
    pub cx: f32,
    pub cy: f32,
    pub width: f32,
    pub height: f32,
}

/// Prior generator for anchor-based face detectors.
///
/// For each level the feature map is `ceil(h / step) x ceil(w / step)`;
/// cells are visited row-major and every min size yields one prior.
#[derive(Debug, Clone)]
pub struct PriorBox {
    priors: Vec<Prior>,
}

impl PriorBox {
    /// Generate all priors for a decoder configuration.
    pub fn new(config: &DecoderConfig) -> Self {
        let input_w = config.input_width as f32;
        let input_h = config.input_height as f32;
        let mut priors = Vec::new();

        for level in &config.prior_levels {
            let step = level.step as f32;
            let rows = config.input_height.div_ceil(level.step);
            let cols = config.input_width.div_ceil(level.step);

            for i in 0..rows {
                for j in 0..cols {
                    let cx = (j as f32 + 0.5) * step / input_w;
                    let cy = (i as f32 + 0.5) * step / input_h;
                    for &min_size in &level.min_sizes {
                        priors.push(Prior {
                            cx,
                            cy,
                            width: min_size / input_w,
                            height: min_size / input_h,
                        });
                    }
                }
            }
        }

        Self { priors }
    }

    /// Generated priors in output-buffer order.
    pub fn priors(&self) -> &[Prior] {
        &self.priors
    }

    /// Number of priors.
    pub fn len(&self) -> usize {
        self.priors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }
}
