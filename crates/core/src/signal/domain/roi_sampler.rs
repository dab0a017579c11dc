use ndarray::s;
use serde::Serialize;

use crate::shared::clock::Clock;
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::signal::domain::signal_buffer::Sample;

/// Forehead band as fractions of the face region: x, y offsets then width, height.
const FOREHEAD_X: f64 = 0.3;
const FOREHEAD_Y: f64 = 0.1;
const FOREHEAD_W: f64 = 0.4;
const FOREHEAD_H: f64 = 0.3;

/// Mean intensity of each color channel over a region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChannelMeans {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// The forehead sub-rectangle of `face`, clipped to the frame.
///
/// `None` when the band has no area, e.g. for tiny faces or faces hanging
/// off the frame edge.
pub fn forehead(face: &Region, frame_w: u32, frame_h: u32) -> Option<Region> {
    face.sub_region(FOREHEAD_X, FOREHEAD_Y, FOREHEAD_W, FOREHEAD_H)
        .clip(frame_w, frame_h)
}

/// Per-channel means over the part of `roi` inside the frame.
///
/// `None` when that part is empty or the frame has fewer than three channels.
pub fn channel_means(frame: &Frame, roi: &Region) -> Option<ChannelMeans> {
    if frame.channels() < 3 {
        return None;
    }
    let roi = roi.clip(frame.width(), frame.height())?;
    let pixels = frame.as_ndarray();
    let (x0, y0) = (roi.x as usize, roi.y as usize);
    let (x1, y1) = (x0 + roi.width as usize, y0 + roi.height as usize);
    let count = roi.area() as f64;
    let mean = |c: usize| {
        let sum: u64 = pixels
            .slice(s![y0..y1, x0..x1, c])
            .iter()
            .map(|&v| v as u64)
            .sum();
        sum as f64 / count
    };
    Some(ChannelMeans {
        red: mean(0),
        green: mean(1),
        blue: mean(2),
    })
}

/// Reduces a face region to one green-channel sample per frame.
pub struct RoiSampler;

impl RoiSampler {
    pub fn new() -> Self {
        Self
    }

    /// Samples the forehead band of `face`, stamped with the clock's reading.
    ///
    /// The clock is only read when a sample is produced.
    pub fn sample(&self, frame: &Frame, face: &Region, clock: &mut dyn Clock) -> Option<Sample> {
        let roi = forehead(face, frame.width(), frame.height())?;
        let green = channel_means(frame, &roi)?.green;
        Some(Sample::new(green, clock.now()))
    }
}

impl Default for RoiSampler {
    fn default() -> Self {
        Self::new()
    }
}
