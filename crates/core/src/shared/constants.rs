pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Default sample buffer length (~10 seconds at 30 fps).
pub const DEFAULT_BUFFER_CAPACITY: usize = 300;

pub const DEFAULT_SAMPLING_RATE: f64 = 30.0;

/// Seconds of signal required before the first spectral estimate.
pub const DEFAULT_MIN_WINDOW_SECS: f64 = 5.0;

/// Physiological heart-rate band in Hz (42-240 bpm).
pub const HEART_BAND_LOW_HZ: f64 = 0.7;
pub const HEART_BAND_HIGH_HZ: f64 = 4.0;

pub const DEFAULT_FILTER_ORDER: usize = 4;

/// Instantaneous estimates averaged by the rate smoother.
pub const DEFAULT_RATE_HISTORY: usize = 10;

/// Frames a lost face keeps its last region before tracking resets.
pub const DEFAULT_MAX_MISSED_FRAMES: usize = 10;

pub const DEFAULT_MIN_FACE_SIZE: u32 = 80;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
