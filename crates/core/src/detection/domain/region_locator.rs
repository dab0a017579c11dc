use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::DEFAULT_MAX_MISSED_FRAMES;
use crate::shared::error::VitalsError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Tracks the face region of one monitoring session.
///
/// Detection runs on the frame's luma plane. When several faces are found the
/// first candidate wins; the order is whatever the detector returns. After a
/// miss the previous region is reused for up to `max_missed_frames`
/// consecutive frames, after which tracking resets.
pub struct RegionLocator {
    detector: Box<dyn FaceDetector>,
    max_missed_frames: usize,
    last_region: Option<Region>,
    missed_frames: usize,
}

/// Outcome of one locate call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Located {
    Detected(Region),
    /// Detection failed; the previous region is reused.
    Stale(Region),
    Lost,
}

impl Located {
    pub fn region(&self) -> Option<Region> {
        match *self {
            Located::Detected(r) | Located::Stale(r) => Some(r),
            Located::Lost => None,
        }
    }
}

impl RegionLocator {
    pub fn new(detector: Box<dyn FaceDetector>, max_missed_frames: usize) -> Self {
        Self {
            detector,
            max_missed_frames,
            last_region: None,
            missed_frames: 0,
        }
    }

    pub fn with_detector(detector: Box<dyn FaceDetector>) -> Self {
        Self::new(detector, DEFAULT_MAX_MISSED_FRAMES)
    }

    /// Finds the face region for `frame`, falling back to the last known one.
    ///
    /// Detector failures leave the tracking state untouched.
    pub fn locate(&mut self, frame: &Frame) -> Result<Located, VitalsError> {
        let detected = detect_first(self.detector.as_mut(), frame)?;

        match detected {
            Some(region) => {
                self.last_region = Some(region);
                self.missed_frames = 0;
                Ok(Located::Detected(region))
            }
            None => match self.last_region {
                Some(region) if self.missed_frames < self.max_missed_frames => {
                    self.missed_frames += 1;
                    Ok(Located::Stale(region))
                }
                Some(_) => {
                    log::debug!(
                        "Face lost for {} frames, resetting region tracking",
                        self.missed_frames
                    );
                    self.reset();
                    Ok(Located::Lost)
                }
                None => Ok(Located::Lost),
            },
        }
    }

    pub fn last_region(&self) -> Option<Region> {
        self.last_region
    }

    pub fn missed_frames(&self) -> usize {
        self.missed_frames
    }

    pub fn reset(&mut self) {
        self.last_region = None;
        self.missed_frames = 0;
    }
}

/// Runs `detector` over the luma plane of `frame` and returns the first
/// candidate that is still visible after clipping.
pub fn detect_first(
    detector: &mut dyn FaceDetector,
    frame: &Frame,
) -> Result<Option<Region>, VitalsError> {
    let gray = frame.to_grayscale();
    let candidates = detector
        .detect(&gray)
        .map_err(|e| VitalsError::Detection(e.to_string()))?;
    Ok(candidates
        .first()
        .and_then(|r| r.clip(frame.width(), frame.height())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    /// Replays a script of detection results, one entry per call.
    struct ScriptedDetector {
        script: Vec<Option<Region>>,
        calls: usize,
        seen_channels: Arc<Mutex<Vec<u8>>>,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Option<Region>>) -> Self {
            Self {
                script,
                calls: 0,
                seen_channels: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            self.seen_channels.lock().unwrap().push(frame.channels());
            let result = self.script.get(self.calls).copied().flatten();
            self.calls += 1;
            Ok(result.into_iter().collect())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Err("model crashed".into())
        }
    }

    struct MultiFaceDetector;

    impl FaceDetector for MultiFaceDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Ok(vec![Region::new(5, 5, 10, 10), Region::new(40, 40, 50, 50)])
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0u8; 100 * 100 * 3], 100, 100, 3, 0)
    }

    fn face() -> Region {
        Region::new(20, 20, 50, 50)
    }

    /// One detection followed by `misses` empty frames.
    fn locator_after_misses(misses: usize, threshold: usize) -> (RegionLocator, Vec<Located>) {
        let mut script = vec![Some(face())];
        script.extend(std::iter::repeat(None).take(misses));
        let mut locator = RegionLocator::new(Box::new(ScriptedDetector::new(script)), threshold);
        let results = (0..=misses)
            .map(|_| locator.locate(&frame()).unwrap())
            .collect();
        (locator, results)
    }

    #[test]
    fn test_detection_stores_region() {
        let (locator, results) = locator_after_misses(0, 10);
        assert_eq!(results[0], Located::Detected(face()));
        assert_eq!(locator.last_region(), Some(face()));
        assert_eq!(locator.missed_frames(), 0);
    }

    #[test]
    fn test_detector_receives_grayscale() {
        let detector = ScriptedDetector::new(vec![Some(face())]);
        let seen = detector.seen_channels.clone();
        let mut locator = RegionLocator::with_detector(Box::new(detector));
        locator.locate(&frame()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_no_face_and_no_history_is_lost() {
        let mut locator = RegionLocator::with_detector(Box::new(ScriptedDetector::new(vec![])));
        assert_eq!(locator.locate(&frame()).unwrap(), Located::Lost);
    }

    #[test]
    fn test_tenth_miss_still_reuses_region() {
        let (locator, results) = locator_after_misses(10, 10);
        assert_eq!(results[10], Located::Stale(face()));
        assert_eq!(locator.missed_frames(), 10);
    }

    #[test]
    fn test_eleventh_miss_resets_tracking() {
        let (locator, results) = locator_after_misses(11, 10);
        assert_eq!(results[11], Located::Lost);
        assert_eq!(locator.last_region(), None);
        assert_eq!(locator.missed_frames(), 0);
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    fn test_threshold_is_configurable(#[case] threshold: usize) {
        let (_, results) = locator_after_misses(threshold + 1, threshold);
        assert_eq!(results[threshold + 1], Located::Lost);
        if threshold > 0 {
            assert_eq!(results[threshold], Located::Stale(face()));
        }
    }

    #[test]
    fn test_redetection_resets_miss_counter() {
        let script = vec![Some(face()), None, None, Some(Region::new(30, 30, 40, 40))];
        let mut locator = RegionLocator::with_detector(Box::new(ScriptedDetector::new(script)));
        for _ in 0..4 {
            locator.locate(&frame()).unwrap();
        }
        assert_eq!(locator.missed_frames(), 0);
        assert_eq!(locator.last_region(), Some(Region::new(30, 30, 40, 40)));
    }

    #[test]
    fn test_first_candidate_is_canonical() {
        let mut locator = RegionLocator::with_detector(Box::new(MultiFaceDetector));
        assert_eq!(
            locator.locate(&frame()).unwrap(),
            Located::Detected(Region::new(5, 5, 10, 10))
        );
    }

    #[test]
    fn test_candidate_is_clipped_to_frame() {
        let script = vec![Some(Region::new(80, 80, 50, 50))];
        let mut locator = RegionLocator::with_detector(Box::new(ScriptedDetector::new(script)));
        assert_eq!(
            locator.locate(&frame()).unwrap().region(),
            Some(Region::new(80, 80, 20, 20))
        );
    }

    #[test]
    fn test_detector_error_keeps_state() {
        let (mut locator, _) = locator_after_misses(2, 10);
        locator.detector = Box::new(FailingDetector);
        let result = locator.locate(&frame());
        assert!(matches!(result, Err(VitalsError::Detection(_))));
        assert_eq!(locator.last_region(), Some(face()));
        assert_eq!(locator.missed_frames(), 2);
    }
}
