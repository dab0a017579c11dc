use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in frame pixel coordinates.
///
/// Regions handed out by the locator and sampler are always clipped to the
/// frame and have positive width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        self.width as i64 * self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Sub-rectangle placed at fractional offsets of this region's size.
    ///
    /// Fractions are truncated toward zero, so a small region can yield an
    /// empty sub-rectangle.
    pub fn sub_region(&self, fx: f64, fy: f64, fw: f64, fh: f64) -> Region {
        let w = self.width as f64;
        let h = self.height as f64;
        Region {
            x: self.x + (w * fx) as i32,
            y: self.y + (h * fy) as i32,
            width: (w * fw) as i32,
            height: (h * fh) as i32,
        }
    }

    /// Intersection with the `frame_w` x `frame_h` frame, or `None` when
    /// nothing of the region is visible.
    pub fn clip(&self, frame_w: u32, frame_h: u32) -> Option<Region> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.x.saturating_add(self.width)).min(frame_w as i32);
        let y2 = (self.y.saturating_add(self.height)).min(frame_h as i32);
        let clipped = Region::new(x1, y1, x2 - x1, y2 - y1);
        if clipped.is_empty() {
            None
        } else {
            Some(clipped)
        }
    }
}
