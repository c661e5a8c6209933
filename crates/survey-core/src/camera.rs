//! Pinhole camera geometry: altitude, footprint, line spacing and photo interval.

use serde::{Deserialize, Serialize};

use crate::models::{CameraSpec, MissionParams};

/// Derived photogrammetry values for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureGeometry {
    /// Flight altitude above ground that yields the requested GSD
    pub altitude_m: f64,
    /// Ground footprint across track
    pub footprint_width_m: f64,
    /// Ground footprint along track
    pub footprint_height_m: f64,
    /// Distance between adjacent flight lines
    pub line_spacing_m: f64,
    /// Distance between consecutive photos along a line
    pub photo_spacing_m: f64,
    /// Seconds between consecutive photos
    pub photo_interval_s: f64,
    /// True when the camera's minimum interval forced a longer interval
    pub interval_limited: bool,
}

impl CaptureGeometry {
    /// Compute capture geometry from camera and mission parameters.
    ///
    /// Inputs are expected to be validated already.
    pub fn compute(camera: &CameraSpec, params: &MissionParams) -> Self {
        let gsd_m = params.gsd_cm / 100.0;
        let altitude_m =
            gsd_m * camera.focal_length_mm * camera.image_width_px as f64 / camera.sensor_width_mm;
        let footprint_width_m = gsd_m * camera.image_width_px as f64;
        let footprint_height_m = gsd_m * camera.image_height_px as f64;

        let line_spacing_m = footprint_width_m * (1.0 - params.side_overlap_pct / 100.0);
        let mut photo_spacing_m = footprint_height_m * (1.0 - params.front_overlap_pct / 100.0);
        let mut photo_interval_s = photo_spacing_m / params.speed_mps;

        let interval_limited = photo_interval_s < camera.min_photo_interval_s;
        if interval_limited {
            photo_interval_s = camera.min_photo_interval_s;
            photo_spacing_m = photo_interval_s * params.speed_mps;
        }

        Self {
            altitude_m,
            footprint_width_m,
            footprint_height_m,
            line_spacing_m,
            photo_spacing_m,
            photo_interval_s,
            interval_limited,
        }
    }
}
