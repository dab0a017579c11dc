use std::path::Path;

use crate::frames::domain::source_metadata::SourceMetadata;
use crate::shared::frame::Frame;

/// Reads frames from an image or image-sequence source.
///
/// Implementations handle decoding while the pipeline works with the
/// abstract `Frame` and `SourceMetadata` types.
pub trait FrameSource: Send {
    /// Opens the source and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
