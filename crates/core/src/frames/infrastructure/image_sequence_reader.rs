use std::path::{Path, PathBuf};

use crate::frames::domain::frame_source::FrameSource;
use crate::frames::domain::source_metadata::SourceMetadata;
use crate::frames::infrastructure::image_file_reader::load_rgb_frame;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Reads a directory of still frames as one recording.
///
/// Files with a known image extension are played back in file-name order at
/// the configured frame rate. Frames are decoded lazily and must all share the
/// dimensions of the first one.
pub struct ImageSequenceReader {
    fps: f64,
    paths: Vec<PathBuf>,
    metadata: Option<SourceMetadata>,
}

impl ImageSequenceReader {
    pub fn new(fps: f64) -> Self {
        Self {
            fps,
            paths: Vec::new(),
            metadata: None,
        }
    }

    pub fn metadata(&self) -> Option<&SourceMetadata> {
        self.metadata.as_ref()
    }
}

/// Whether `path` carries one of the supported image extensions.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn load_checked(
    path: &Path,
    index: usize,
    meta: &SourceMetadata,
) -> Result<Frame, Box<dyn std::error::Error>> {
    let frame = load_rgb_frame(path, index)?;
    if frame.width() != meta.width || frame.height() != meta.height {
        return Err(format!(
            "{} is {}x{}, expected {}x{}",
            path.display(),
            frame.width(),
            frame.height(),
            meta.width,
            meta.height
        )
        .into());
    }
    Ok(frame)
}

impl FrameSource for ImageSequenceReader {
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(format!("Frame rate must be positive, got {}", self.fps).into());
        }
        if !path.is_dir() {
            return Err(format!("Not a directory: {}", path.display()).into());
        }
        let paths = list_frames(path)?;
        let first = paths
            .first()
            .ok_or_else(|| format!("No image frames found in {}", path.display()))?;
        let (width, height) = image::image_dimensions(first)?;

        let metadata = SourceMetadata {
            width,
            height,
            fps: self.fps,
            total_frames: paths.len(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {} frames of {}x{} from {}",
            paths.len(),
            metadata.width,
            metadata.height,
            path.display()
        );
        self.paths = paths;
        self.metadata = Some(metadata.clone());
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(meta) = self.metadata.clone() else {
            return Box::new(std::iter::once(Err(
                "ImageSequenceReader: not opened".into()
            )));
        };
        Box::new(
            self.paths
                .iter()
                .enumerate()
                .map(move |(index, path)| load_checked(path, index, &meta)),
        )
    }

    fn close(&mut self) {
        self.paths.clear();
        self.metadata = None;
    }
}
