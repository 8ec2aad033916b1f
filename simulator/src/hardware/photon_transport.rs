//! Transport of scintillation photons from the fiber end to the sensor plane.
//!
//! Each photon leaves the fiber end face at a random point, with an emission
//! angle drawn from the angular spectrum of its radial position. Crossing
//! into the epoxy it refracts (Snell's law), and the epoxy thickness turns
//! that angle into a lateral displacement on the SiPM surface.

use std::f64::consts::PI;

use rand::Rng;

use super::fiber::FiberGeometry;
use crate::config::DetectorConfig;
use crate::distributions::BucketedDensities;
use crate::error::Result;
use crate::units::meters_to_micrometers;

/// Result of crossing the core/epoxy interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refraction {
    /// Photon enters the epoxy at this angle (radians)
    Transmitted(f64),
    /// `n_core / n_epoxy * sin θ > 1`: the photon never reaches the epoxy
    TotalInternalReflection,
}

/// Apply Snell's law at the core/epoxy interface.
pub fn refract(emission_angle: f64, core_index: f64, epoxy_index: f64) -> Refraction {
    let s = core_index / epoxy_index * emission_angle.sin();
    if s.abs() > 1.0 {
        Refraction::TotalInternalReflection
    } else {
        Refraction::Transmitted(s.asin())
    }
}

/// Where a transported photon ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhotonPath {
    /// Landing point on the sensor plane, meters
    Landed { x: f64, y: f64 },
    /// Lost by total internal reflection at the epoxy
    Blocked,
}

/// Photon transport through the epoxy coupling layer.
#[derive(Debug, Clone)]
pub struct PhotonTransport {
    angular: BucketedDensities,
    epoxy_index: f64,
    epoxy_thickness: f64,
    channel_height: f64,
}

impl PhotonTransport {
    pub fn new(config: &DetectorConfig, angular: BucketedDensities) -> Self {
        Self {
            angular,
            epoxy_index: config.epoxy_index,
            epoxy_thickness: config.epoxy_thickness,
            channel_height: config.channel_height,
        }
    }

    /// Transport with the tabulated angular spectra.
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        Ok(Self::new(config, BucketedDensities::angular()?))
    }

    /// Emission angle (radians) of a photon emitted at `radial_position` meters
    /// from the fiber axis.
    ///
    /// A radial position outside every tabulated bucket is an
    /// [`crate::error::SimError::OutOfDomain`] error, not a zero angle.
    pub fn emission_angle<R: Rng + ?Sized>(&self, radial_position: f64, rng: &mut R) -> Result<f64> {
        let radius_um = meters_to_micrometers(radial_position);
        let degrees = self.angular.sample(radius_um, rng)?;
        Ok(degrees.to_radians())
    }

    /// Draw one photon leaving `fiber` and follow it to the sensor plane.
    ///
    /// The exit point is `(r cos φ, r sin φ)` from the fiber center, with
    /// `φ ~ U[0, π)` and `r ~ U[0, d/2)`; the epoxy then displaces it by
    /// `epoxy_thickness * sin θ'` along a second azimuth `φ' ~ U[0, π)`.
    /// Y is shifted by half the channel height into sensor coordinates.
    pub fn landing_position<R: Rng + ?Sized>(
        &self,
        fiber: &FiberGeometry,
        rng: &mut R,
    ) -> Result<PhotonPath> {
        let phi = rng.gen::<f64>() * PI;
        let phi_prime = rng.gen::<f64>() * PI;
        let radius = rng.gen::<f64>() * fiber.radius();

        let emission = self.emission_angle(radius, rng)?;
        let theta_prime = match refract(emission, fiber.core_index, self.epoxy_index) {
            Refraction::Transmitted(angle) => angle,
            Refraction::TotalInternalReflection => return Ok(PhotonPath::Blocked),
        };

        let lateral = theta_prime.sin() * self.epoxy_thickness;
        let x = fiber.xc + radius * phi.cos() + phi_prime.cos() * lateral;
        let y = fiber.yc + radius * phi.sin() + self.channel_height / 2.0 + phi_prime.sin() * lateral;

        Ok(PhotonPath::Landed { x, y })
    }

    pub fn angular(&self) -> &BucketedDensities {
        &self.angular
    }
}
