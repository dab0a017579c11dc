use std::path::PathBuf;

use serde::Serialize;

/// Shape and timing of a frame source.
///
/// Single images report `fps = 0` and one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl SourceMetadata {
    /// Duration of the source in seconds, `None` for still images.
    pub fn duration_secs(&self) -> Option<f64> {
        (self.fps > 0.0).then(|| self.total_frames as f64 / self.fps)
    }
}
