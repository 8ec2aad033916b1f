//! Layout of the fiber stack and per-event photon bookkeeping.
//!
//! Fibers are arranged in `layers` rows of `fibers_per_layer`. Odd layers
//! are shifted by half a pitch so that fibers of neighbouring layers touch,
//! giving the honeycomb packing of a scintillating fiber mat.
//!
//! # Coordinate System
//! - X runs along a layer, Y across layers, both in meters
//! - Layer `j` sits at `Y = (j - 2) * y` where `y` is the layer spacing
//! - The whole stack is shifted in X by a random offset in `(-d/2, 0]`

use ndarray::Array2;
use rand::Rng;

use super::fiber::FiberGeometry;
use crate::config::DetectorConfig;
use crate::error::Result;

/// Position of a fiber in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiberId {
    pub layer: usize,
    pub index: usize,
}

/// Fixed grid of fibers, shape `(layers, fibers_per_layer)`.
#[derive(Debug, Clone)]
pub struct FiberStack {
    fibers: Array2<FiberGeometry>,
    layer_spacing: f64,
    x_offset: f64,
}

impl FiberStack {
    /// Build the stack with a random X offset `-u * d/2`, `u ~ U[0, 1)`.
    pub fn new<R: Rng + ?Sized>(config: &DetectorConfig, rng: &mut R) -> Result<Self> {
        let x_offset = -rng.gen::<f64>() * config.fiber_radius();
        Self::with_x_offset(config, x_offset)
    }

    /// Build the stack with an explicit X offset of fiber `[0][0]`.
    pub fn with_x_offset(config: &DetectorConfig, x_offset: f64) -> Result<Self> {
        config.validate()?;

        let d = config.fiber_diameter;
        let pitch = config.fiber_pitch();
        let layer_spacing = (d * d - (pitch / 2.0).powi(2)).sqrt();

        let fibers = Array2::from_shape_fn(
            (config.layers, config.fibers_per_layer),
            |(layer, index)| {
                let mut xc = x_offset + index as f64 * pitch;
                if layer % 2 == 1 {
                    xc += pitch / 2.0;
                }
                let yc = (layer as f64 - 2.0) * layer_spacing;
                FiberGeometry::new(xc, yc, d, config.core_index)
            },
        );

        Ok(Self {
            fibers,
            layer_spacing,
            x_offset,
        })
    }

    /// `(layers, fibers_per_layer)`
    pub fn shape(&self) -> (usize, usize) {
        self.fibers.dim()
    }

    pub fn fiber_count(&self) -> usize {
        self.fibers.len()
    }

    pub fn get(&self, id: FiberId) -> Option<&FiberGeometry> {
        self.fibers.get((id.layer, id.index))
    }

    /// Vertical distance between neighbouring layers, `sqrt(d² - (pitch/2)²)`
    pub fn layer_spacing(&self) -> f64 {
        self.layer_spacing
    }

    pub fn x_offset(&self) -> f64 {
        self.x_offset
    }

    /// Flat index of a fiber, layer-major.
    pub fn flat_id(&self, id: FiberId) -> usize {
        id.layer * self.fibers.ncols() + id.index
    }

    /// Inverse of [`FiberStack::flat_id`]
    pub fn fiber_id(&self, flat: usize) -> FiberId {
        let ncols = self.fibers.ncols();
        FiberId {
            layer: flat / ncols,
            index: flat % ncols,
        }
    }

    /// Iterate fibers in flat-id order.
    pub fn iter(&self) -> impl Iterator<Item = (FiberId, &FiberGeometry)> {
        self.fibers
            .indexed_iter()
            .map(|((layer, index), fiber)| (FiberId { layer, index }, fiber))
    }

    pub fn fibers(&self) -> &Array2<FiberGeometry> {
        &self.fibers
    }
}

/// Photon counts of every fiber for the current event.
///
/// Created once per stack, written once per event and cleared between
/// events, so no count can leak from one event into the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotonCounts {
    counts: Vec<u32>,
}

impl PhotonCounts {
    pub fn new(fiber_count: usize) -> Self {
        Self {
            counts: vec![0; fiber_count],
        }
    }

    pub fn for_stack(stack: &FiberStack) -> Self {
        Self::new(stack.fiber_count())
    }

    pub fn set(&mut self, flat_id: usize, photons: u32) {
        self.counts[flat_id] = photons;
    }

    pub fn get(&self, flat_id: usize) -> u32 {
        self.counts[flat_id]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }

    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }
}
