/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Runs on the luma frame produced by the region locator: the single channel
/// is replicated into the model's three input planes.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::DEFAULT_MIN_FACE_SIZE;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::math::{nms, ScoredBox};

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Letterbox fill value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Minimum detection confidence (0.0-1.0).
    pub confidence: f64,
    /// Faces narrower or shorter than this many pixels are ignored.
    pub min_face_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
        }
    }
}

/// YOLO face detector backed by an ONNX Runtime session.
///
/// Produces regions in descending confidence order, clipped to the frame.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    config: DetectorConfig,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(
        model_path: &Path,
        config: DetectorConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if !(0.0..=1.0).contains(&config.confidence) {
            return Err(format!(
                "confidence must be between 0.0 and 1.0, got {}",
                config.confidence
            )
            .into());
        }
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_execution_providers(platform_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!(
            "Loaded face model {} (input {input_size}px)",
            model_path.display()
        );

        Ok(Self {
            session,
            config,
            input_size,
        })
    }
}

/// Hardware acceleration where the platform build enables it; CPU otherwise.
fn platform_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let letterboxed = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(letterboxed.tensor.clone())?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let candidates = decode_candidates(data, &shape, self.config.confidence, &letterboxed)?;
        let kept = nms(candidates, NMS_IOU_THRESH);

        Ok(to_regions(
            &kept,
            self.config.min_face_size,
            frame.width(),
            frame.height(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

struct Letterboxed {
    tensor: ndarray::Array4<f32>,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

/// Letterbox-resize a frame to `target_size` x `target_size`, NCHW float32.
///
/// Single-channel frames are replicated into all three planes.
fn letterbox(frame: &Frame, target_size: u32) -> Letterboxed {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let size = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let src_c = frame.channels() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                let sc = if src_c >= 3 { c } else { 0 };
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, sc]] as f32 / 255.0;
            }
        }
    }

    Letterboxed {
        tensor,
        scale,
        pad_x,
        pad_y,
    }
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Parse raw YOLO output rows `[cx, cy, w, h, conf, ...]` into frame-space boxes.
///
/// Accepts both `[1, features, detections]` and `[1, detections, features]`.
fn decode_candidates(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    lb: &Letterboxed,
) -> Result<Vec<ScoredBox>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 {
        return Ok(Vec::new());
    }

    let value = |det: usize, feat: usize| -> f64 {
        let idx = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data.get(idx).copied().unwrap_or(0.0) as f64
    };

    let mut boxes = Vec::new();
    for i in 0..num_dets {
        let conf = value(i, 4);
        if conf < confidence {
            continue;
        }
        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        let unmap_x = |v: f64| (v - lb.pad_x as f64) / lb.scale;
        let unmap_y = |v: f64| (v - lb.pad_y as f64) / lb.scale;
        boxes.push(ScoredBox {
            bbox: [
                unmap_x(cx - w / 2.0),
                unmap_y(cy - h / 2.0),
                unmap_x(cx + w / 2.0),
                unmap_y(cy + h / 2.0),
            ],
            score: conf,
        });
    }
    Ok(boxes)
}

fn to_regions(boxes: &[ScoredBox], min_face_size: u32, frame_w: u32, frame_h: u32) -> Vec<Region> {
    let min = min_face_size as f64;
    boxes
        .iter()
        .filter(|b| b.width() >= min && b.height() >= min)
        .filter_map(|b| {
            Region::new(
                b.bbox[0].floor() as i32,
                b.bbox[1].floor() as i32,
                b.width().round() as i32,
                b.height().round() as i32,
            )
            .clip(frame_w, frame_h)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gray_frame(w: u32, h: u32, value: u8) -> Frame {
        Frame::new(vec![value; (w * h) as usize], w, h, 1, 0)
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 -> 640: scale 3.2, new 640x320, pad_y 160
        let lb = letterbox(&gray_frame(200, 100, 128), 640);
        assert_eq!(lb.tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_replicates_luma_into_all_planes() {
        let lb = letterbox(&gray_frame(100, 50, 255), 640);
        let y = lb.pad_y as usize + 1;
        for c in 0..3 {
            assert_relative_eq!(lb.tensor[[0, c, y, 1]], 1.0, epsilon = 0.01);
        }
        assert_relative_eq!(lb.tensor[[0, 0, 0, 0]], PAD_VALUE, epsilon = 0.01);
    }

    #[test]
    fn test_letterbox_reads_color_channels_separately() {
        let frame = Frame::new([10u8, 20, 30].repeat(4), 2, 2, 3, 0);
        let lb = letterbox(&frame, 4);
        assert_relative_eq!(lb.tensor[[0, 0, 0, 0]], 10.0 / 255.0);
        assert_relative_eq!(lb.tensor[[0, 2, 0, 0]], 30.0 / 255.0);
    }

    fn identity_letterbox() -> Letterboxed {
        Letterboxed {
            tensor: ndarray::Array4::zeros((1, 3, 1, 1)),
            scale: 1.0,
            pad_x: 0,
            pad_y: 0,
        }
    }

    #[test]
    fn test_decode_row_major_output() {
        // [1, 2 detections, 5 features]
        let data = [100.0, 100.0, 40.0, 60.0, 0.9, 10.0, 10.0, 4.0, 4.0, 0.1];
        let boxes = decode_candidates(&data, &[1, 2, 5], 0.5, &identity_letterbox()).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].bbox, [80.0, 70.0, 120.0, 130.0]);
    }

    #[test]
    fn test_decode_transposed_output() {
        // [1, 5 features, 6 detections], one feature row after another
        let data = [
            100.0, 10.0, 10.0, 10.0, 10.0, 10.0, // cx
            100.0, 10.0, 10.0, 10.0, 10.0, 10.0, // cy
            40.0, 4.0, 4.0, 4.0, 4.0, 4.0, // w
            60.0, 4.0, 4.0, 4.0, 4.0, 4.0, // h
            0.9, 0.1, 0.1, 0.2, 0.3, 0.4, // conf
        ];
        let boxes = decode_candidates(&data, &[1, 5, 6], 0.5, &identity_letterbox()).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_relative_eq!(boxes[0].score, 0.9f32 as f64);
        assert_eq!(boxes[0].bbox, [80.0, 70.0, 120.0, 130.0]);
    }

    #[test]
    fn test_decode_rejects_unexpected_shape() {
        assert!(decode_candidates(&[0.0; 5], &[5], 0.5, &identity_letterbox()).is_err());
    }

    #[test]
    fn test_decode_undoes_letterbox() {
        let lb = Letterboxed {
            tensor: ndarray::Array4::zeros((1, 3, 1, 1)),
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        let data = [100.0, 200.0, 40.0, 40.0, 0.9];
        let boxes = decode_candidates(&data, &[1, 1, 5], 0.5, &lb).unwrap();
        assert_eq!(boxes[0].bbox, [40.0, 40.0, 60.0, 60.0]);
    }

    #[test]
    fn test_to_regions_filters_small_faces_and_clips() {
        let boxes = vec![
            ScoredBox {
                bbox: [150.0, 150.0, 250.0, 260.0],
                score: 0.9,
            },
            ScoredBox {
                bbox: [0.0, 0.0, 40.0, 40.0],
                score: 0.8,
            },
        ];
        let regions = to_regions(&boxes, 80, 200, 200);
        assert_eq!(regions, vec![Region::new(150, 150, 50, 50)]);
    }

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_relative_eq!(config.confidence, 0.5);
        assert_eq!(config.min_face_size, 80);
    }
}
