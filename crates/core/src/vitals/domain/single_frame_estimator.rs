use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::region_locator::detect_first;
use crate::shared::error::VitalsError;
use crate::shared::frame::Frame;
use crate::signal::domain::roi_sampler::{channel_means, forehead, ChannelMeans};
use crate::vitals::domain::vitals_estimate::{BloodPressure, SignalStatus, VitalsEstimate};
use crate::vitals::domain::vitals_estimator::VitalsEstimator;

/// Guards the color ratios against a black forehead.
const RATIO_EPSILON: f64 = 1e-6;

/// Vital signs derived from forehead color ratios alone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeuristicVitals {
    pub heart_rate: f64,
    pub systolic: f64,
    pub diastolic: f64,
    pub oxygen_saturation: f64,
    pub stress_index: f64,
}

/// Coarse color heuristic over the forehead means. Not a calibrated model;
/// the coefficients are placeholders. Values are rounded to one decimal.
pub fn heuristic_vitals(means: ChannelMeans) -> HeuristicVitals {
    let r_g = means.red / (means.green + RATIO_EPSILON);
    let b_g = means.blue / (means.green + RATIO_EPSILON);

    let heart_rate = (60.0 + (r_g - 0.9) * 40.0).clamp(60.0, 100.0);
    let systolic = (110.0 + (r_g - 0.9) * 30.0).clamp(90.0, 140.0);
    let diastolic = (70.0 + (r_g - 0.9) * 20.0).clamp(60.0, 90.0);
    let oxygen_saturation = (98.0 - (b_g - 0.9) * 5.0).clamp(93.0, 99.0);
    let stress_index = (50.0 + (heart_rate - 70.0) * 1.5).clamp(10.0, 90.0);

    HeuristicVitals {
        heart_rate: round1(heart_rate),
        systolic: round1(systolic),
        diastolic: round1(diastolic),
        oxygen_saturation: round1(oxygen_saturation),
        stress_index: round1(stress_index),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Estimates vitals from one still image.
///
/// Uses the first detected face with no tracking history.
pub struct SingleFrameEstimator {
    detector: Box<dyn FaceDetector>,
}

impl SingleFrameEstimator {
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self { detector }
    }

    /// Grayscale and RGBA images are normalized to RGB first.
    pub fn estimate_from_image(&mut self, image: &Frame) -> Result<VitalsEstimate, VitalsError> {
        image.validate(1)?;
        let rgb = image.to_rgb()?;

        let Some(region) = detect_first(self.detector.as_mut(), &rgb)? else {
            log::info!("No face detected in image {}", image.index());
            return Ok(VitalsEstimate::not_found());
        };
        let Some(means) = forehead(&region, rgb.width(), rgb.height())
            .and_then(|roi| channel_means(&rgb, &roi))
        else {
            return Ok(VitalsEstimate::located(
                region,
                None,
                SignalStatus::DegenerateRoi,
                None,
            ));
        };

        let vitals = heuristic_vitals(means);
        log::debug!("Image {}: heuristic vitals {vitals:?}", image.index());
        Ok(VitalsEstimate {
            heart_rate: Some(vitals.heart_rate),
            blood_pressure: Some(BloodPressure {
                systolic: vitals.systolic,
                diastolic: vitals.diastolic,
            }),
            oxygen_saturation: Some(vitals.oxygen_saturation),
            stress_index: Some(vitals.stress_index),
            region_found: true,
            status: SignalStatus::Heuristic,
            region: Some(region),
            signal: None,
        })
    }
}

impl VitalsEstimator for SingleFrameEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<VitalsEstimate, VitalsError> {
        self.estimate_from_image(frame)
    }
}
