//! Monte Carlo simulation of a scintillating fiber tracker
//!
//! Charged particles cross a stack of scintillating fibers. Each fiber they
//! hit produces photons according to an empirical yield distribution; the
//! photons leave the fiber end, refract through an epoxy coupling layer and
//! land on a SiPM whose pixels are grouped into readout channels.
//!
//! The crate is organised bottom-up:
//! - [`distributions`]: tabulated densities and the rejection sampler
//! - [`hardware`]: fibers, the fiber stack, photon transport and the SiPM
//! - [`sims`]: the event driver tying them together
//! - [`io`]: sinks for event records

pub mod config;
pub mod distributions;
pub mod error;
pub mod hardware;
pub mod io;
pub mod sims;
pub mod units;

// Re-exports for easier access
pub use config::{AngleMethod, DetectorConfig};
pub use distributions::{BucketedDensities, DensityShape, EmpiricalDensity};
pub use error::{Result, SimError};
pub use hardware::{FiberGeometry, FiberStack, PhotonTransport, SensorArray, Trajectory};
pub use io::{CsvEventWriter, EventSink, MemorySink};
pub use sims::{EventDriver, EventRecord, ExecutionMode, RunSummary};
