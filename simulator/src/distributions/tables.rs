//! Bucketed empirical spectra from the Geant fiber simulation.
//!
//! Two families are tabulated. The photon yield of a fiber is keyed by the
//! impact parameter of the particle (µm) and the emission angle of a photon
//! (degrees) is keyed by the radial position it is emitted from (µm). The
//! coefficients below are the fit results and must not be altered.
//!
//! Bucket `i` covers `(edge[i], edge[i+1]]`; the first bucket also includes
//! its lower edge.

use rand::Rng;

use super::density::{DensityShape, Quadratic, TailSegment};
use super::empirical::EmpiricalDensity;
use crate::error::{Result, SimError};

/// Photon yield fits: `(upper edge µm, shape, sampling domain high)`.
/// Every domain starts at 0 photons.
const PHOTON_YIELD_TABLE: [(f64, DensityShape, f64); 5] = [
    (
        25.0,
        DensityShape::Gaussian {
            amplitude: 57.5095,
            mean: 22.1398,
            sigma: 6.16924,
        },
        50.0,
    ),
    (
        50.0,
        DensityShape::Landau {
            scale: 341.192,
            mpv: 18.4867,
            sigma: 2.66185,
        },
        50.0,
    ),
    (
        75.0,
        DensityShape::Landau {
            scale: 364.594,
            mpv: 17.9427,
            sigma: 2.74043,
        },
        50.0,
    ),
    (
        100.0,
        DensityShape::Gaussian {
            amplitude: 68.0951,
            mean: 18.178,
            sigma: 4.91197,
        },
        50.0,
    ),
    (
        125.0,
        DensityShape::Gaussian {
            amplitude: 59.8287,
            mean: 12.1788,
            sigma: 4.54820,
        },
        40.0,
    ),
];

/// Largest impact parameter covered by the photon yield fits, µm
pub const PHOTON_YIELD_MAX_IMPACT_UM: f64 = PHOTON_YIELD_TABLE[PHOTON_YIELD_TABLE.len() - 1].0;

const fn angular(
    threshold: f64,
    cutoff: f64,
    low: Quadratic,
    tail: TailSegment,
) -> DensityShape {
    DensityShape::PiecewiseQuadratic {
        threshold,
        cutoff,
        low,
        tail,
    }
}

/// Emission angle fits: `(upper edge µm, shape, sampling domain high in degrees)`.
const ANGULAR_TABLE: [(f64, DensityShape, f64); 10] = [
    (
        12.5,
        angular(0.2, 27.0, Quadratic::new(-0.7367, 5.0550, -0.0554), TailSegment::Zero),
        27.0,
    ),
    (
        25.0,
        angular(0.2, 27.0, Quadratic::new(-0.2846, 13.3962, -0.0838), TailSegment::Zero),
        27.0,
    ),
    (
        37.5,
        angular(0.2, 27.0, Quadratic::new(-1.9196, 25.6074, -0.2702), TailSegment::Zero),
        27.0,
    ),
    (
        50.0,
        angular(0.2, 27.0, Quadratic::new(-1.2325, 34.1110, -0.3271), TailSegment::Zero),
        27.0,
    ),
    (
        62.5,
        angular(0.2, 27.0, Quadratic::new(-6.7858, 44.746, -0.4284), TailSegment::Zero),
        27.0,
    ),
    (
        75.0,
        angular(
            0.2,
            27.0,
            Quadratic::new(-8.5570, 56.2115, -0.5866),
            TailSegment::Quadratic(Quadratic::new(7451.11, -335.88, 3.6112)),
        ),
        37.0,
    ),
    (
        87.5,
        angular(
            0.2,
            27.0,
            Quadratic::new(-6.0329, 62.0612, -0.4463),
            TailSegment::Quadratic(Quadratic::new(6296.19, -257.260, 2.5809)),
        ),
        44.0,
    ),
    (
        100.0,
        angular(
            0.2,
            27.0,
            Quadratic::new(-2.3125, 71.1939, -0.4842),
            TailSegment::Quadratic(Quadratic::new(4405.57, -141.793, 1.1392)),
        ),
        60.0,
    ),
    (
        112.5,
        angular(
            0.25,
            27.0,
            Quadratic::new(-18.2144, 82.3692, -0.9137),
            TailSegment::Quadratic(Quadratic::new(2221.03, -40.1972, 0.1705)),
        ),
        86.0,
    ),
    (
        125.0,
        angular(
            0.2,
            16.0,
            Quadratic::new(-0.4247, 18.1516, 0.4020),
            TailSegment::Exponential {
                amplitude: 1473.86,
                decay: 11.7009,
            },
        ),
        70.0,
    ),
];

/// Largest radial position covered by the emission angle fits, µm
pub const ANGULAR_MAX_RADIUS_UM: f64 = ANGULAR_TABLE[ANGULAR_TABLE.len() - 1].0;

/// One bucket of a [`BucketedDensities`] family.
#[derive(Debug, Clone)]
pub struct Bucket {
    /// Lower edge, exclusive except for the first bucket
    pub low: f64,
    /// Upper edge, inclusive
    pub high: f64,
    pub density: EmpiricalDensity,
}

/// A family of densities selected by a bucketed key.
#[derive(Debug, Clone)]
pub struct BucketedDensities {
    quantity: &'static str,
    buckets: Vec<Bucket>,
}

impl BucketedDensities {
    /// Build a family from `(upper edge, shape, domain high)` rows, with the
    /// first bucket starting at `first_edge`.
    ///
    /// Edges must be strictly increasing.
    pub fn from_rows(
        quantity: &'static str,
        first_edge: f64,
        rows: &[(f64, DensityShape, f64)],
    ) -> Result<Self> {
        if rows.is_empty() {
            return Err(SimError::Configuration(format!(
                "no buckets configured for {quantity}"
            )));
        }

        let mut buckets = Vec::with_capacity(rows.len());
        let mut low = first_edge;
        for &(high, shape, domain_high) in rows {
            if high <= low {
                return Err(SimError::Configuration(format!(
                    "{quantity} bucket edges must increase: ({low}, {high}]"
                )));
            }
            buckets.push(Bucket {
                low,
                high,
                density: EmpiricalDensity::new(shape, 0.0, domain_high)?,
            });
            low = high;
        }

        Ok(Self { quantity, buckets })
    }

    /// Photon yield per fiber as a function of impact parameter (µm).
    pub fn photon_yield() -> Result<Self> {
        Self::from_rows("impact parameter (um)", 0.0, &PHOTON_YIELD_TABLE)
    }

    /// Photon emission angle (degrees) as a function of radial position (µm).
    pub fn angular() -> Result<Self> {
        Self::from_rows("radial position (um)", 0.0, &ANGULAR_TABLE)
    }

    /// Find the bucket containing `key`.
    pub fn select(&self, key: f64) -> Result<&Bucket> {
        self.buckets
            .iter()
            .enumerate()
            .find(|(i, b)| {
                let above_low = if *i == 0 { key >= b.low } else { key > b.low };
                above_low && key <= b.high
            })
            .map(|(_, b)| b)
            .ok_or(SimError::OutOfDomain {
                quantity: self.quantity,
                value: key,
            })
    }

    /// Select the bucket for `key` and draw one value from its density.
    pub fn sample<R: Rng + ?Sized>(&self, key: f64, rng: &mut R) -> Result<f64> {
        self.select(key)?.density.sample(rng)
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Name of the bucket key, used in error reports
    pub fn quantity(&self) -> &'static str {
        self.quantity
    }

    /// Replace the retry budget of every bucket.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        for bucket in &mut self.buckets {
            bucket.density = bucket.density.clone().with_max_attempts(max_attempts);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_tables_build() {
        assert_eq!(BucketedDensities::photon_yield().unwrap().buckets().len(), 5);
        assert_eq!(BucketedDensities::angular().unwrap().buckets().len(), 10);
    }

    #[test]
    fn test_angular_bucket_edges() {
        let table = BucketedDensities::angular().unwrap();
        let domain_high = |key: f64| table.select(key).unwrap().density.domain().1;
        assert_eq!(domain_high(0.0), 27.0);
        assert_eq!(domain_high(12.5), 27.0);
        assert_eq!(domain_high(62.5), 27.0);
        assert_eq!(domain_high(62.6), 37.0);
        assert_eq!(domain_high(80.0), 44.0);
        assert_eq!(domain_high(100.0), 60.0);
        assert_eq!(domain_high(112.5), 86.0);
        assert_eq!(domain_high(112.6), 70.0);
        assert_eq!(domain_high(125.0), 70.0);
    }

    #[test]
    fn test_out_of_range_keys_are_explicit() {
        let table = BucketedDensities::photon_yield().unwrap();
        for key in [-0.001, 125.001, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                table.select(key),
                Err(SimError::OutOfDomain { .. })
            ));
        }
        let mut rng = StdRng::seed_from_u64(0);
        assert!(table.sample(130.0, &mut rng).is_err());
    }

    #[test]
    fn test_yield_bucket_edges() {
        let table = BucketedDensities::photon_yield().unwrap();
        assert!(matches!(
            table.select(0.0).unwrap().density.shape(),
            DensityShape::Gaussian { mean, .. } if (*mean - 22.1398).abs() < 1e-12
        ));
        assert!(matches!(
            table.select(25.0).unwrap().density.shape(),
            DensityShape::Gaussian { .. }
        ));
        assert!(matches!(
            table.select(25.0001).unwrap().density.shape(),
            DensityShape::Landau { .. }
        ));
        assert_eq!(table.select(125.0).unwrap().density.domain(), (0.0, 40.0));
    }

    #[test]
    fn test_every_bucket_samples_within_domain() {
        let mut rng = StdRng::seed_from_u64(2024);
        for table in [
            BucketedDensities::angular().unwrap(),
            BucketedDensities::photon_yield().unwrap(),
        ] {
            for bucket in table.buckets() {
                let (low, high) = bucket.density.domain();
                for _ in 0..2000 {
                    let x = bucket.density.sample(&mut rng).unwrap();
                    assert!(x >= low && x <= high, "{x} outside [{low}, {high}]");
                }
            }
        }
    }

    #[test]
    fn test_radius_bucket_62_5_to_75_stays_within_37_degrees() {
        let table = BucketedDensities::angular().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10_000 {
            let angle = table.sample(70.0, &mut rng).unwrap();
            assert!((0.0..=37.0).contains(&angle));
        }
    }

    #[test]
    fn test_central_yield_mean_tracks_gaussian_fit() {
        let table = BucketedDensities::photon_yield().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let n = 20_000;
        let mean = (0..n)
            .map(|_| table.sample(0.0, &mut rng).unwrap())
            .sum::<f64>()
            / n as f64;
        // Truncation at 0 shifts the mean of N(22.14, 6.17) up by ~0.03
        assert_abs_diff_eq!(mean, 22.1398, epsilon = 0.25);
    }

    #[test]
    fn test_table_limits_match_last_bucket() {
        let yield_table = BucketedDensities::photon_yield().unwrap();
        let angular_table = BucketedDensities::angular().unwrap();
        let last_edge = |table: &BucketedDensities| table.buckets().last().unwrap().high;
        assert_eq!(last_edge(&yield_table), PHOTON_YIELD_MAX_IMPACT_UM);
        assert_eq!(last_edge(&angular_table), ANGULAR_MAX_RADIUS_UM);
    }

    #[test]
    fn test_non_increasing_edges_rejected() {
        let shape = DensityShape::Gaussian {
            amplitude: 1.0,
            mean: 1.0,
            sigma: 1.0,
        };
        let rows = [(10.0, shape, 5.0), (10.0, shape, 5.0)];
        assert!(matches!(
            BucketedDensities::from_rows("test", 0.0, &rows),
            Err(SimError::Configuration(_))
        ));
        assert!(BucketedDensities::from_rows("test", 0.0, &[]).is_err());
    }
}
