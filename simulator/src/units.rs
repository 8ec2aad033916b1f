//! Type-safe physical units for the detector geometry
//!
//! Geometry is configured in meters while the empirical photon tables are
//! keyed in micrometers. These helpers wrap `uom` lengths so the conversion
//! happens in one place.

use uom::si::length::{meter, micrometer};

/// Type alias for length measurements with convenient methods
pub type Length = uom::si::f64::Length;

/// Extension trait for length conversions used by fibers and sensors
pub trait LengthExt {
    /// Create length from micrometers
    fn from_micrometers(um: f64) -> Self;

    /// Get length in micrometers
    fn as_micrometers(&self) -> f64;

    /// Create length from meters
    fn from_meters(m: f64) -> Self;

    /// Get length in meters
    fn as_meters(&self) -> f64;
}

impl LengthExt for Length {
    fn from_micrometers(um: f64) -> Self {
        Length::new::<micrometer>(um)
    }

    fn as_micrometers(&self) -> f64 {
        self.get::<micrometer>()
    }

    fn from_meters(m: f64) -> Self {
        Length::new::<meter>(m)
    }

    fn as_meters(&self) -> f64 {
        self.get::<meter>()
    }
}

/// Convert a length in meters to micrometers.
pub fn meters_to_micrometers(m: f64) -> f64 {
    Length::from_meters(m).as_micrometers()
}
