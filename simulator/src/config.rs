//! Detector and run configuration
//!
//! A single immutable [`DetectorConfig`] describes the fiber stack, the
//! epoxy coupling layer, the SiPM pixel grid and the run parameters. It is
//! read once from a JSON file (every field optional, with defaults matching
//! the reference tracker module) and validated before any simulation
//! component is built.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::distributions::tables::{ANGULAR_MAX_RADIUS_UM, PHOTON_YIELD_MAX_IMPACT_UM};
use crate::error::{Result, SimError};
use crate::units::meters_to_micrometers;

/// How the incidence angle of each simulated particle is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AngleMethod {
    /// θ uniform in [0, theta_max)
    #[default]
    Uniform,
}

/// Configuration for the fiber stack, SiPM array and run.
///
/// All lengths are in meters, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Number of fiber layers in the stack
    pub layers: usize,
    /// Number of fibers in each layer
    pub fibers_per_layer: usize,
    /// Fiber diameter
    pub fiber_diameter: f64,
    /// Gap between neighbouring fibers of the same layer
    pub fiber_gap: f64,
    /// Refractive index of the fiber core
    pub core_index: f64,
    /// Width of one SiPM channel
    pub channel_width: f64,
    /// Height of one SiPM channel
    pub channel_height: f64,
    /// Dead zone between channels
    pub dead_zone: f64,
    /// Thickness of the epoxy layer between fiber ends and the sensor
    pub epoxy_thickness: f64,
    /// Refractive index of the epoxy
    pub epoxy_index: f64,
    /// Pixel columns in one channel
    pub pixel_columns_per_channel: usize,
    /// Pixel rows (channel height in pixels)
    pub pixel_rows: usize,
    /// Photon detection efficiency, probability in [0, 1]
    pub pde: f64,
    /// Number of readout channels
    pub channel_count: usize,
    /// Maximum particle incidence angle in degrees
    pub theta_max_deg: f64,
    /// Channels kept free of signal on each side of the array
    pub spare_channels: usize,
    /// Number of events to simulate
    pub events: usize,
    /// Incidence angle generation method
    pub angle_method: AngleMethod,
    /// Run seed; drawn from the thread RNG when absent
    pub seed: Option<u64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            layers: 5,
            fibers_per_layer: 128,
            fiber_diameter: 250e-6,
            fiber_gap: 30e-6,
            core_index: 1.59,
            channel_width: 0.25e-3,
            channel_height: 1.5e-3,
            dead_zone: 5e-6,
            epoxy_thickness: 120e-6,
            epoxy_index: 1.5,
            pixel_columns_per_channel: 4,
            pixel_rows: 20,
            pde: 0.25,
            channel_count: 128,
            theta_max_deg: 30.0,
            spare_channels: 8,
            events: 1000,
            angle_method: AngleMethod::Uniform,
            seed: None,
        }
    }
}

impl DetectorConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every invariant the simulation components rely on.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("fiber_diameter", self.fiber_diameter),
            ("core_index", self.core_index),
            ("channel_width", self.channel_width),
            ("channel_height", self.channel_height),
            ("epoxy_index", self.epoxy_index),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(config_error(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("fiber_gap", self.fiber_gap),
            ("dead_zone", self.dead_zone),
            ("epoxy_thickness", self.epoxy_thickness),
            ("theta_max_deg", self.theta_max_deg),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(config_error(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.pde) {
            return Err(config_error(format!("pde must lie in [0, 1], got {}", self.pde)));
        }
        if self.theta_max_deg >= 90.0 {
            return Err(config_error(format!(
                "theta_max_deg must be below 90, got {}",
                self.theta_max_deg
            )));
        }

        let counts = [
            ("layers", self.layers),
            ("fibers_per_layer", self.fibers_per_layer),
            ("pixel_columns_per_channel", self.pixel_columns_per_channel),
            ("pixel_rows", self.pixel_rows),
            ("channel_count", self.channel_count),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(config_error(format!("{name} must be at least 1")));
            }
        }

        let fits = self
            .spare_channels
            .checked_mul(2)
            .is_some_and(|spare| spare <= self.channel_count);
        if !fits {
            return Err(config_error(format!(
                "{} spare channels per side do not fit in {} channels",
                self.spare_channels, self.channel_count
            )));
        }

        let grid_size = self
            .pixel_columns_per_channel
            .checked_mul(self.channel_count)
            .and_then(|columns| columns.checked_mul(self.pixel_rows));
        if grid_size.is_none() {
            return Err(config_error(format!(
                "pixel grid of {} x {} columns by {} rows is too large",
                self.channel_count, self.pixel_columns_per_channel, self.pixel_rows
            )));
        }
        if self.layers.checked_mul(self.fibers_per_layer).is_none() {
            return Err(config_error(format!(
                "fiber stack of {} layers x {} fibers is too large",
                self.layers, self.fibers_per_layer
            )));
        }

        if self.half_pitch() > self.fiber_diameter {
            return Err(config_error(format!(
                "fiber gap {} is too large for diameter {}: layers cannot touch",
                self.fiber_gap, self.fiber_diameter
            )));
        }

        // Impact parameters and emission radii reach the fiber radius and
        // must stay inside the tabulated buckets
        let radius_um = meters_to_micrometers(self.fiber_radius());
        let tabulated = PHOTON_YIELD_MAX_IMPACT_UM.min(ANGULAR_MAX_RADIUS_UM);
        if radius_um > tabulated + RADIUS_TOLERANCE_UM {
            return Err(config_error(format!(
                "fiber radius {radius_um} um exceeds the tabulated photon spectra ({tabulated} um)"
            )));
        }

        Ok(())
    }

    /// Fiber radius in meters
    pub fn fiber_radius(&self) -> f64 {
        self.fiber_diameter / 2.0
    }

    /// Center-to-center distance of neighbouring fibers in a layer
    pub fn fiber_pitch(&self) -> f64 {
        self.fiber_diameter + self.fiber_gap
    }

    fn half_pitch(&self) -> f64 {
        self.fiber_pitch() / 2.0
    }

    /// Pixel width in meters
    pub fn pixel_width(&self) -> f64 {
        self.channel_width / self.pixel_columns_per_channel as f64
    }

    /// Pixel height in meters
    pub fn pixel_height(&self) -> f64 {
        self.channel_height / self.pixel_rows as f64
    }

    /// Total pixel columns across all channels
    pub fn pixel_columns(&self) -> usize {
        self.pixel_columns_per_channel * self.channel_count
    }

    /// Maximum incidence angle in radians
    pub fn theta_max_rad(&self) -> f64 {
        self.theta_max_deg.to_radians()
    }
}

/// Rounding slack when comparing the fiber radius with the table edge
const RADIUS_TOLERANCE_UM: f64 = 1e-9;

fn config_error(msg: String) -> SimError {
    SimError::Configuration(msg)
}
