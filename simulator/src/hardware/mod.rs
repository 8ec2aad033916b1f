//! Detector hardware: fibers, the fiber stack, photon transport and the SiPM

pub mod fiber;
pub mod fiber_stack;
pub mod photon_transport;
pub mod sipm;

pub use fiber::{FiberGeometry, Trajectory};
pub use fiber_stack::{FiberId, FiberStack, PhotonCounts};
pub use photon_transport::{refract, PhotonPath, PhotonTransport, Refraction};
pub use sipm::{PixelHit, SensorArray};
