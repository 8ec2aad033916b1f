//! Empirical photon spectra and the rejection sampler that draws from them.
//!
//! - [`density`]: closed-form shapes (Gaussian, Landau, piecewise polynomial)
//! - [`empirical`]: rejection sampling on a bounded domain
//! - [`tables`]: the bucketed photon-yield and emission-angle fits

pub mod density;
pub mod empirical;
pub mod tables;

pub use density::{landau_density, DensityShape, Quadratic, TailSegment};
pub use empirical::{EmpiricalDensity, DEFAULT_MAX_ATTEMPTS};
pub use tables::{Bucket, BucketedDensities};
