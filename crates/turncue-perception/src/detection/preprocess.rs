//! Camera frame to network input conversion.

use image::{imageops::FilterType, ImageBuffer, Rgb, RgbImage};

use crate::config::{ChannelOrder, PreprocessConfig};
use crate::error::{VisionError, VisionResult};

/// A camera frame: tightly packed RGB8 pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major RGB
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame, checking the buffer length against the resolution.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> VisionResult<Self> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected || width == 0 || height == 0 {
            return Err(VisionError::invalid_frame(format!(
                "Invalid image data length: expected {} for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame filled with a single colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Resizes frames to the network input and lays them out as NCHW floats.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    input_width: u32,
    input_height: u32,
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(input_width: u32, input_height: u32, config: PreprocessConfig) -> Self {
        Self {
            input_width,
            input_height,
            config,
        }
    }

    /// Tensor shape produced by [`Preprocessor::prepare`].
    pub fn input_shape(&self) -> [usize; 4] {
        [1, 3, self.input_height as usize, self.input_width as usize]
    }

    /// Convert a frame into a `[1, 3, H, W]` tensor buffer.
    ///
    /// The frame is stretched to the input size, so decoded normalized
    /// coordinates map back by scaling with the frame resolution.
    pub fn prepare(&self, frame: &Frame) -> VisionResult<Vec<f32>> {
        let img: RgbImage =
            ImageBuffer::<Rgb<u8>, _>::from_raw(frame.width, frame.height, frame.pixels.clone())
                .ok_or_else(|| VisionError::invalid_frame("Failed to create image buffer"))?;

        let resized = if frame.width == self.input_width && frame.height == self.input_height {
            img
        } else {
            image::imageops::resize(
                &img,
                self.input_width,
                self.input_height,
                FilterType::Triangle,
            )
        };

        let (w, h) = (self.input_width as usize, self.input_height as usize);
        let channels: [usize; 3] = match self.config.channel_order {
            ChannelOrder::Rgb => [0, 1, 2],
            ChannelOrder::Bgr => [2, 1, 0],
        };

        // HWC -> CHW with mean/scale normalization
        let mut chw: Vec<f32> = Vec::with_capacity(3 * h * w);
        for (c, &source) in channels.iter().enumerate() {
            let mean = self.config.mean[c];
            for y in 0..h {
                for x in 0..w {
                    let pixel = resized.get_pixel(x as u32, y as u32);
                    chw.push((pixel[source] as f32 - mean) * self.config.scale);
                }
            }
        }

        Ok(chw)
    }
}
