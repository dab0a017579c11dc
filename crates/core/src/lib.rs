//! Camera-based heart-rate estimation.
//!
//! Frames flow through face location, forehead sampling and spectral
//! analysis into per-frame [`vitals::domain::vitals_estimate::VitalsEstimate`]s.

pub mod shared {
    pub mod clock;
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod model_resolver;
    pub mod region;
}

pub mod detection {
    pub mod domain {
        pub mod face_detector;
        pub mod region_locator;
    }
    pub mod infrastructure;
}

pub mod signal {
    pub mod domain {
        pub mod bandpass;
        pub mod rate_smoother;
        pub mod ring_buffer;
        pub mod roi_sampler;
        pub mod signal_buffer;
        pub mod spectral_estimator;
    }
}

pub mod vitals {
    pub mod domain {
        pub mod heart_rate_monitor;
        pub mod monitor_config;
        pub mod single_frame_estimator;
        pub mod vitals_estimate;
        pub mod vitals_estimator;
    }
}

pub mod frames {
    pub mod domain {
        pub mod frame_source;
        pub mod source_metadata;
    }
    pub mod infrastructure {
        pub mod image_file_reader;
        pub mod image_sequence_reader;
    }
}

pub mod pipeline {
    pub mod scan_executor;
    pub mod scan_image_use_case;
    pub mod scan_logger;
    pub mod scan_stream_use_case;
    pub mod infrastructure {
        pub mod threaded_scan_executor;
    }
}
