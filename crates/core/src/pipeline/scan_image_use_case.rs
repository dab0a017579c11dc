use std::path::Path;

use crate::frames::domain::frame_source::FrameSource;
use crate::vitals::domain::single_frame_estimator::SingleFrameEstimator;
use crate::vitals::domain::vitals_estimate::VitalsEstimate;

/// Estimates vitals from a single still image.
pub struct ScanImageUseCase {
    reader: Box<dyn FrameSource>,
    estimator: SingleFrameEstimator,
}

impl ScanImageUseCase {
    pub fn new(reader: Box<dyn FrameSource>, estimator: SingleFrameEstimator) -> Self {
        Self { reader, estimator }
    }

    pub fn execute(&mut self, input: &Path) -> Result<VitalsEstimate, Box<dyn std::error::Error>> {
        self.reader.open(input)?;
        let first = self.reader.frames().next();
        self.reader.close();
        let frame = first.ok_or("Image contains no frames")??;
        Ok(self.estimator.estimate_from_image(&frame)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::frames::infrastructure::image_file_reader::ImageFileReader;
    use crate::shared::frame::Frame;
    use crate::shared::region::Region;
    use crate::vitals::domain::vitals_estimate::SignalStatus;
    use crate::frames::domain::source_metadata::SourceMetadata;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StaticDetector(Vec<Region>);

    impl FaceDetector for StaticDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Ok(self.0.clone())
        }
    }

    fn write_image(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("portrait.png");
        image::RgbImage::from_pixel(120, 120, image::Rgb([140, 100, 90]))
            .save(&path)
            .unwrap();
        path
    }

    fn use_case(faces: Vec<Region>) -> ScanImageUseCase {
        ScanImageUseCase::new(
            Box::new(ImageFileReader::new()),
            SingleFrameEstimator::new(Box::new(StaticDetector(faces))),
        )
    }

    #[test]
    fn test_image_with_face() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path());
        let estimate = use_case(vec![Region::new(10, 10, 100, 100)])
            .execute(&path)
            .unwrap();
        assert_eq!(estimate.status, SignalStatus::Heuristic);
        assert_relative_eq!(estimate.heart_rate.unwrap(), 80.0);
    }

    #[test]
    fn test_image_without_face() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path());
        let estimate = use_case(vec![]).execute(&path).unwrap();
        assert!(!estimate.region_found);
        assert_eq!(estimate.heart_rate, None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(use_case(vec![])
            .execute(Path::new("/nonexistent/portrait.png"))
            .is_err());
    }

    /// Yields one scripted result and counts `close` calls.
    struct ScriptedSource {
        next: Option<Result<Frame, String>>,
        closes: Arc<AtomicUsize>,
    }

    impl FrameSource for ScriptedSource {
        fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
            Ok(SourceMetadata {
                width: 4,
                height: 4,
                fps: 0.0,
                total_frames: 1,
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(
                self.next
                    .take()
                    .into_iter()
                    .map(|r| r.map_err(Box::<dyn std::error::Error>::from)),
            )
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn scripted(next: Option<Result<Frame, String>>) -> (ScanImageUseCase, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let source = ScriptedSource {
            next,
            closes: closes.clone(),
        };
        let use_case = ScanImageUseCase::new(
            Box::new(source),
            SingleFrameEstimator::new(Box::new(StaticDetector(vec![]))),
        );
        (use_case, closes)
    }

    #[test]
    fn test_decode_error_still_closes_reader() {
        let (mut use_case, closes) = scripted(Some(Err("truncated image".to_string())));
        let err = use_case.execute(Path::new("portrait.png")).unwrap_err();
        assert!(err.to_string().contains("truncated image"));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_source_still_closes_reader() {
        let (mut use_case, closes) = scripted(None);
        assert!(use_case.execute(Path::new("portrait.png")).is_err());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
