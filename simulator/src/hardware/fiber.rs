//! Single scintillating fiber and the particle trajectories crossing it.

use log::debug;
use rand::Rng;

use crate::distributions::BucketedDensities;
use crate::error::Result;
use crate::units::meters_to_micrometers;

/// Straight particle track through the fiber plane.
///
/// The track passes through `(x0, y0)` with direction `(sin θ, cos θ)`,
/// so θ = 0 is a track perpendicular to the fiber layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    /// Polar angle of incidence in radians
    pub theta: f64,
    /// X of a point on the track, meters
    pub x0: f64,
    /// Y of a point on the track, meters
    pub y0: f64,
}

impl Trajectory {
    pub fn new(theta: f64, x0: f64, y0: f64) -> Self {
        Self { theta, x0, y0 }
    }
}

/// Geometry of one fiber, seen in the plane perpendicular to its axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiberGeometry {
    /// Center X, meters
    pub xc: f64,
    /// Center Y, meters
    pub yc: f64,
    /// Diameter, meters
    pub diameter: f64,
    /// Refractive index of the core
    pub core_index: f64,
}

impl FiberGeometry {
    pub fn new(xc: f64, yc: f64, diameter: f64, core_index: f64) -> Self {
        Self {
            xc,
            yc,
            diameter,
            core_index,
        }
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Distance from the fiber axis to the trajectory, meters.
    ///
    /// Projects the fiber center onto the track line and returns the
    /// distance between the center and its projection.
    pub fn impact_parameter(&self, trajectory: &Trajectory) -> f64 {
        let (sin_t, cos_t) = trajectory.theta.sin_cos();
        let dx = self.xc - trajectory.x0;
        let dy = self.yc - trajectory.y0;

        let xp = trajectory.x0 + sin_t * sin_t * dx + sin_t * cos_t * dy;
        let yp = trajectory.y0 + sin_t * cos_t * dx + cos_t * cos_t * dy;

        (self.xc - xp).hypot(self.yc - yp)
    }

    /// Number of scintillation photons produced by `trajectory` in this fiber.
    ///
    /// A track that misses the fiber produces nothing and consumes no
    /// random numbers. Otherwise the yield is drawn from the bucket matching
    /// the impact parameter (in µm) and rounded to the nearest integer.
    pub fn produce_photon_count<R: Rng + ?Sized>(
        &self,
        trajectory: &Trajectory,
        photon_yield: &BucketedDensities,
        rng: &mut R,
    ) -> Result<u32> {
        let impact = self.impact_parameter(trajectory);
        if impact > self.radius() {
            return Ok(0);
        }

        let impact_um = meters_to_micrometers(impact);
        let drawn = photon_yield.sample(impact_um, rng)?;
        let photons = drawn.round().max(0.0) as u32;
        debug!(
            "fiber at ({:.3e}, {:.3e}): impact {:.2} um -> {} photons",
            self.xc, self.yc, impact_um, photons
        );
        Ok(photons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn fiber() -> FiberGeometry {
        FiberGeometry::new(0.0, 0.0, 250e-6, 1.59)
    }

    #[test]
    fn test_vertical_track_impact_is_horizontal_offset() {
        let f = FiberGeometry::new(100e-6, 37e-6, 250e-6, 1.59);
        let t = Trajectory::new(0.0, 40e-6, 0.0);
        assert_relative_eq!(f.impact_parameter(&t), 60e-6, epsilon = 1e-15);
    }

    #[test]
    fn test_track_through_center_has_zero_impact() {
        let f = FiberGeometry::new(50e-6, 200e-6, 250e-6, 1.59);
        let theta: f64 = 0.3;
        // Point on the track below the fiber, aligned with its direction
        let t = Trajectory::new(theta, 50e-6 - 200e-6 * theta.tan(), 0.0);
        assert!(f.impact_parameter(&t) < 1e-15);
    }

    #[test]
    fn test_inclined_track_distance() {
        // Track at 45 degrees through the origin, fiber at (d, 0)
        let d = 100e-6;
        let f = FiberGeometry::new(d, 0.0, 250e-6, 1.59);
        let t = Trajectory::new(std::f64::consts::FRAC_PI_4, 0.0, 0.0);
        assert_relative_eq!(f.impact_parameter(&t), d / 2f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_missed_fiber_yields_zero_without_randomness() {
        let table = BucketedDensities::photon_yield().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut untouched = rng.clone();
        let t = Trajectory::new(0.0, 126e-6, 0.0);
        for _ in 0..100 {
            assert_eq!(fiber().produce_photon_count(&t, &table, &mut rng).unwrap(), 0);
        }
        assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
    }

    #[test]
    fn test_edge_hit_produces_photons() {
        let table = BucketedDensities::photon_yield().unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let t = Trajectory::new(0.0, 124.9e-6, 0.0);
        let total: u32 = (0..50)
            .map(|_| fiber().produce_photon_count(&t, &table, &mut rng).unwrap())
            .sum();
        assert!(total > 0);
    }

    #[test]
    fn test_dead_center_hit_mean_yield() {
        let table = BucketedDensities::photon_yield().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let t = Trajectory::new(0.0, 0.0, 0.0);
        let n = 10_000;
        let sum: u64 = (0..n)
            .map(|_| fiber().produce_photon_count(&t, &table, &mut rng).unwrap() as u64)
            .sum();
        let mean = sum as f64 / n as f64;
        assert!((mean - 22.1398).abs() < 0.4, "mean yield {mean}");
    }
}
