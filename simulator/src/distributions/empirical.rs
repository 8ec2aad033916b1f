//! Rejection sampling from a bounded empirical density.

use rand::Rng;

use super::density::DensityShape;
use crate::error::{Result, SimError};

/// Candidates drawn before a sample is declared a failure.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Grid points used to bound the density from above.
const ENVELOPE_SCAN_POINTS: usize = 2048;

/// Headroom on the scanned maximum, covering peaks between grid points.
const ENVELOPE_MARGIN: f64 = 1.05;

/// A density shape restricted to a sampling domain `[low, high]`.
///
/// The envelope height is found once at construction by scanning the
/// domain, after which [`EmpiricalDensity::sample`] draws candidates `x`
/// uniformly on the domain and accepts them when a uniform draw on
/// `[0, envelope)` falls under the density.
#[derive(Debug, Clone)]
pub struct EmpiricalDensity {
    shape: DensityShape,
    low: f64,
    high: f64,
    envelope: f64,
    max_attempts: usize,
}

impl EmpiricalDensity {
    /// Build a sampler for `shape` on `[low, high]`.
    ///
    /// Fails with a configuration error when the domain is empty or the
    /// density is zero everywhere on it.
    pub fn new(shape: DensityShape, low: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite()) || high <= low {
            return Err(SimError::Configuration(format!(
                "invalid sampling domain [{low}, {high}]"
            )));
        }

        let step = (high - low) / (ENVELOPE_SCAN_POINTS - 1) as f64;
        let peak = (0..ENVELOPE_SCAN_POINTS)
            .map(|i| shape.evaluate(low + i as f64 * step))
            .fold(0.0f64, f64::max);

        if peak <= 0.0 {
            return Err(SimError::Configuration(format!(
                "density {shape:?} is zero on [{low}, {high}]"
            )));
        }

        Ok(Self {
            shape,
            low,
            high,
            envelope: peak * ENVELOPE_MARGIN,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Override the retry budget of the rejection loop.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Density value, zero outside the sampling domain.
    pub fn density(&self, x: f64) -> f64 {
        if x < self.low || x > self.high {
            0.0
        } else {
            self.shape.evaluate(x)
        }
    }

    /// Draw one value from the density.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        for _ in 0..self.max_attempts {
            let x = rng.gen_range(self.low..=self.high);
            let u = rng.gen::<f64>() * self.envelope;
            let d = self.density(x);
            if d > 0.0 && u <= d {
                return Ok(x);
            }
        }
        Err(SimError::SamplingFailure {
            attempts: self.max_attempts,
            low: self.low,
            high: self.high,
        })
    }

    /// Sampling domain `(low, high)`
    pub fn domain(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    /// Upper bound used by the rejection step
    pub fn envelope(&self) -> f64 {
        self.envelope
    }

    pub fn shape(&self) -> &DensityShape {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::density::{Quadratic, TailSegment};
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gaussian(mean: f64, sigma: f64) -> DensityShape {
        DensityShape::Gaussian {
            amplitude: 1.0,
            mean,
            sigma,
        }
    }

    #[test]
    fn test_envelope_bounds_density() {
        let density = EmpiricalDensity::new(gaussian(5.0, 1.0), 0.0, 10.0).unwrap();
        for i in 0..=1000 {
            let x = i as f64 * 0.01;
            assert!(density.density(x) <= density.envelope());
        }
    }

    #[test]
    fn test_samples_stay_in_domain() {
        let density = EmpiricalDensity::new(gaussian(0.0, 10.0), -2.0, 3.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..5000 {
            let x = density.sample(&mut rng).unwrap();
            assert!((-2.0..=3.0).contains(&x));
        }
    }

    #[test]
    fn test_sample_mean_matches_gaussian() {
        let density = EmpiricalDensity::new(gaussian(20.0, 3.0), 0.0, 40.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let sum: f64 = (0..n).map(|_| density.sample(&mut rng).unwrap()).sum();
        // Standard error is 3 / sqrt(20000) ~ 0.02
        assert_abs_diff_eq!(sum / n as f64, 20.0, epsilon = 0.1);
    }

    #[test]
    fn test_density_zero_outside_domain() {
        let density = EmpiricalDensity::new(gaussian(5.0, 1.0), 0.0, 10.0).unwrap();
        assert_eq!(density.density(-0.1), 0.0);
        assert_eq!(density.density(10.1), 0.0);
        assert!(density.density(5.0) > 0.0);
    }

    #[test]
    fn test_invalid_domain_rejected() {
        assert!(matches!(
            EmpiricalDensity::new(gaussian(0.0, 1.0), 1.0, 1.0),
            Err(SimError::Configuration(_))
        ));
        assert!(EmpiricalDensity::new(gaussian(0.0, 1.0), 2.0, 1.0).is_err());
        assert!(EmpiricalDensity::new(gaussian(0.0, 1.0), 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_zero_density_rejected() {
        let shape = DensityShape::PiecewiseQuadratic {
            threshold: 0.2,
            cutoff: 27.0,
            low: Quadratic::new(1.0, 0.0, 0.0),
            tail: TailSegment::Zero,
        };
        // Whole domain lies below the threshold
        assert!(EmpiricalDensity::new(shape, 0.0, 0.1).is_err());
    }

    #[test]
    fn test_exhausted_budget_reports_failure() {
        // Needle-thin peak: one attempt almost never lands under it
        let density = EmpiricalDensity::new(gaussian(500.0, 0.5), 0.0, 1000.0)
            .unwrap()
            .with_max_attempts(1);
        let mut rng = StdRng::seed_from_u64(3);
        let failures = (0..100)
            .filter(|_| {
                matches!(
                    density.sample(&mut rng),
                    Err(SimError::SamplingFailure { attempts: 1, .. })
                )
            })
            .count();
        assert!(failures >= 95);
    }
}
