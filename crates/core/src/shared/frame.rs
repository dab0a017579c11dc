use ndarray::ArrayView3;

use crate::shared::error::VitalsError;

/// Rec.601 luma weights, the same conversion camera pipelines use for
/// grayscale detection input.
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// A single camera frame: contiguous RGB(A) or grayscale bytes in row-major order.
///
/// Decoding happens at I/O boundaries only; the pipeline borrows a frame for
/// one call and never retains it.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Checks that the frame is non-empty, consistently sized and carries at
    /// least `min_channels` color channels.
    pub fn validate(&self, min_channels: u8) -> Result<(), VitalsError> {
        if self.width == 0 || self.height == 0 || self.data.is_empty() {
            return Err(VitalsError::InvalidInput(format!(
                "empty frame {} ({}x{})",
                self.index, self.width, self.height
            )));
        }
        let expected = self.pixel_count() * self.channels as usize;
        if self.data.len() != expected {
            return Err(VitalsError::InvalidInput(format!(
                "frame {} has {} bytes, expected {expected}",
                self.index,
                self.data.len()
            )));
        }
        if self.channels < min_channels {
            return Err(VitalsError::InvalidInput(format!(
                "frame {} has {} channel(s), need at least {min_channels}",
                self.index, self.channels
            )));
        }
        Ok(())
    }

    /// Single-channel luma frame used as detector input.
    ///
    /// Grayscale frames are returned as a copy; color frames ignore any
    /// channel past the third.
    pub fn to_grayscale(&self) -> Frame {
        if self.channels < 3 {
            let luma = self
                .data
                .chunks_exact(self.channels.max(1) as usize)
                .map(|px| px[0])
                .collect();
            return Frame::new(luma, self.width, self.height, 1, self.index);
        }
        let luma = self
            .data
            .chunks_exact(self.channels as usize)
            .map(|px| {
                let y = LUMA_WEIGHTS[0] * px[0] as f64
                    + LUMA_WEIGHTS[1] * px[1] as f64
                    + LUMA_WEIGHTS[2] * px[2] as f64;
                y.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        Frame::new(luma, self.width, self.height, 1, self.index)
    }

    /// Normalizes grayscale and RGBA frames to three-channel RGB.
    pub fn to_rgb(&self) -> Result<Frame, VitalsError> {
        let rgb = match self.channels {
            3 => return Ok(self.clone()),
            1 => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            n => {
                return Err(VitalsError::InvalidInput(format!(
                    "unsupported channel count {n}"
                )))
            }
        };
        Ok(Frame::new(rgb, self.width, self.height, 3, self.index))
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
