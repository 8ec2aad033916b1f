//! Event generation: one particle through the fiber stack per event.
//!
//! For every event the driver draws an incidence angle and entry position,
//! asks every fiber for its photon yield, transports each photon through the
//! epoxy onto the SiPM, fires pixels and aggregates them into channels. The
//! outcome is returned as an [`EventRecord`]; nothing is printed.
//!
//! Per-photon and per-fiber failures (exhausted rejection sampling, keys
//! outside the tabulated buckets) are logged, counted in the record and
//! otherwise treated as "no photons"; they never abort the event.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{thread_rng, Rng, RngCore, SeedableRng};
use shared::algo::{map_indexed_in_parallel, mean, median, std_dev, task_seed};

use crate::config::{AngleMethod, DetectorConfig};
use crate::distributions::BucketedDensities;
use crate::error::{Result, SimError};
use crate::hardware::{
    FiberGeometry, FiberStack, PhotonCounts, PhotonPath, PhotonTransport, PixelHit, SensorArray,
    Trajectory,
};
use crate::io::EventSink;

/// How the per-fiber photon work of an event is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// All random draws come from the single run RNG
    #[default]
    Sequential,
    /// Fibers run on the rayon pool, each with an RNG derived from
    /// `(run seed, event, fiber)`; output does not depend on thread count
    Parallel,
}

/// Everything recorded about one simulated event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Event index within the run
    pub event: usize,
    /// Incidence angle, radians
    pub theta: f64,
    /// Signal X position, meters
    pub signal_x: f64,
    /// Fired pixels per channel
    pub channel_counts: Vec<u32>,
    /// Photons produced per fiber, indexed by flat fiber id
    pub fiber_photons: Vec<u32>,
    pub photons_produced: u64,
    pub photons_detected: u64,
    pub photons_undetected: u64,
    pub photons_out_of_bounds: u64,
    /// Photons lost to total internal reflection at the epoxy
    pub photons_blocked: u64,
    pub sampling_failures: u64,
    pub out_of_domain: u64,
}

impl EventRecord {
    /// Total fired pixels over all channels
    pub fn fired_pixels(&self) -> u64 {
        self.channel_counts.iter().map(|&c| c as u64).sum()
    }
}

/// Aggregate statistics over a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub events: usize,
    pub mean_fired_pixels: Option<f64>,
    pub std_fired_pixels: Option<f64>,
    pub median_fired_pixels: Option<f64>,
    pub photons_produced: u64,
    pub photons_detected: u64,
    pub photons_out_of_bounds: u64,
    pub photons_blocked: u64,
    pub sampling_failures: u64,
    pub out_of_domain: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    fn accumulate(&mut self, record: &EventRecord) {
        self.events += 1;
        self.photons_produced += record.photons_produced;
        self.photons_detected += record.photons_detected;
        self.photons_out_of_bounds += record.photons_out_of_bounds;
        self.photons_blocked += record.photons_blocked;
        self.sampling_failures += record.sampling_failures;
        self.out_of_domain += record.out_of_domain;
    }
}

/// Photons produced by one fiber and where they went.
#[derive(Debug, Default)]
struct FiberOutcome {
    photons: u32,
    landed: Vec<(f64, f64)>,
    blocked: u64,
    sampling_failures: u64,
    out_of_domain: u64,
}

impl FiberOutcome {
    fn record_error(&mut self, err: &SimError) {
        match err {
            SimError::OutOfDomain { .. } => self.out_of_domain += 1,
            _ => self.sampling_failures += 1,
        }
    }
}

fn simulate_fiber<R: Rng + ?Sized>(
    fiber: &FiberGeometry,
    trajectory: &Trajectory,
    photon_yield: &BucketedDensities,
    transport: &PhotonTransport,
    rng: &mut R,
) -> FiberOutcome {
    let mut outcome = FiberOutcome::default();

    outcome.photons = match fiber.produce_photon_count(trajectory, photon_yield, rng) {
        Ok(photons) => photons,
        Err(e) => {
            warn!(
                "fiber at ({:.3e}, {:.3e}) produced no photons: {}",
                fiber.xc, fiber.yc, e
            );
            outcome.record_error(&e);
            return outcome;
        }
    };

    for _ in 0..outcome.photons {
        match transport.landing_position(fiber, rng) {
            Ok(PhotonPath::Landed { x, y }) => outcome.landed.push((x, y)),
            Ok(PhotonPath::Blocked) => outcome.blocked += 1,
            Err(e) => {
                warn!("photon dropped: {e}");
                outcome.record_error(&e);
            }
        }
    }

    outcome
}

/// Photon totals of one event, filled while registering photons.
#[derive(Debug, Default)]
struct Tally {
    produced: u64,
    detected: u64,
    undetected: u64,
    out_of_bounds: u64,
    blocked: u64,
    sampling_failures: u64,
    out_of_domain: u64,
}

/// Store per-fiber counts and fire pixels, in fiber order.
fn register_outcomes<R: Rng + ?Sized>(
    outcomes: &[FiberOutcome],
    photon_counts: &mut PhotonCounts,
    sensor: &mut SensorArray,
    rng: &mut R,
) -> Tally {
    let mut tally = Tally::default();
    for (flat_id, outcome) in outcomes.iter().enumerate() {
        photon_counts.set(flat_id, outcome.photons);
        tally.produced += outcome.photons as u64;
        tally.blocked += outcome.blocked;
        tally.sampling_failures += outcome.sampling_failures;
        tally.out_of_domain += outcome.out_of_domain;

        for &(x, y) in &outcome.landed {
            match sensor.register_photon(x, y, rng) {
                PixelHit::Fired { .. } => tally.detected += 1,
                PixelHit::Undetected => tally.undetected += 1,
                PixelHit::OutOfBounds => tally.out_of_bounds += 1,
            }
        }
    }
    tally
}

/// Drives the per-event simulation over a fixed detector.
#[derive(Debug)]
pub struct EventDriver {
    config: DetectorConfig,
    stack: FiberStack,
    photon_yield: BucketedDensities,
    transport: PhotonTransport,
    sensor: SensorArray,
    photon_counts: PhotonCounts,
    rng: StdRng,
    seed: u64,
    mode: ExecutionMode,
}

impl EventDriver {
    /// Build the detector from `config`, seeding from `config.seed` or, when
    /// absent, from the thread RNG. The seed in use is logged.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(|| thread_rng().next_u64());
        Self::with_seed(config, seed)
    }

    /// Build the detector with an explicit run seed.
    pub fn with_seed(config: DetectorConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let stack = FiberStack::new(&config, &mut rng)?;
        let photon_yield = BucketedDensities::photon_yield()?;
        let transport = PhotonTransport::from_config(&config)?;
        let sensor = SensorArray::new(&config);
        let photon_counts = PhotonCounts::for_stack(&stack);

        let (layers, fibers) = stack.shape();
        info!(
            "Detector: {} layers x {} fibers, {} channels, stack x offset {:.2} um, seed {}",
            layers,
            fibers,
            sensor.channel_count(),
            stack.x_offset() * 1e6,
            seed
        );

        Ok(Self {
            config,
            stack,
            photon_yield,
            transport,
            sensor,
            photon_counts,
            rng,
            seed,
            mode: ExecutionMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Draw the incidence angle of the next particle, radians.
    pub fn generate_theta(&mut self) -> f64 {
        match self.config.angle_method {
            AngleMethod::Uniform => self.rng.gen::<f64>() * self.config.theta_max_rad(),
        }
    }

    /// Draw the X position of the next particle, meters.
    ///
    /// Uniform over the channels between the spare channels on each side.
    pub fn generate_signal_position(&mut self) -> f64 {
        let width = self.config.channel_width;
        let spare = self.config.spare_channels as f64;
        let active = (self.config.channel_count as f64 - 2.0 * spare) * width;
        spare * width + self.rng.gen::<f64>() * active
    }

    /// Simulate one event with a freshly drawn trajectory.
    pub fn simulate_event(&mut self, event: usize) -> EventRecord {
        let theta = self.generate_theta();
        let x0 = self.generate_signal_position();
        self.simulate_trajectory(event, Trajectory::new(theta, x0, 0.0))
    }

    /// Simulate one event for a given trajectory.
    ///
    /// The sensor and the per-fiber photon counts are cleared once the record
    /// has been taken, so every event starts from zero.
    pub fn simulate_trajectory(&mut self, event: usize, trajectory: Trajectory) -> EventRecord {
        let tally = match self.mode {
            ExecutionMode::Sequential => {
                let outcomes: Vec<FiberOutcome> = self
                    .stack
                    .iter()
                    .map(|(_, fiber)| {
                        simulate_fiber(
                            fiber,
                            &trajectory,
                            &self.photon_yield,
                            &self.transport,
                            &mut self.rng,
                        )
                    })
                    .collect();
                register_outcomes(
                    &outcomes,
                    &mut self.photon_counts,
                    &mut self.sensor,
                    &mut self.rng,
                )
            }
            ExecutionMode::Parallel => {
                let event_seed = task_seed(self.seed, event as u64);
                let stack = &self.stack;
                let photon_yield = &self.photon_yield;
                let transport = &self.transport;
                let outcomes =
                    map_indexed_in_parallel(stack.fiber_count(), event_seed, |flat, rng| {
                        stack
                            .get(stack.fiber_id(flat))
                            .map(|fiber| {
                                simulate_fiber(fiber, &trajectory, photon_yield, transport, rng)
                            })
                            .unwrap_or_default()
                    });
                // Pixel firing uses the stream after the last fiber's
                let mut rng =
                    StdRng::seed_from_u64(task_seed(event_seed, stack.fiber_count() as u64));
                register_outcomes(
                    &outcomes,
                    &mut self.photon_counts,
                    &mut self.sensor,
                    &mut rng,
                )
            }
        };

        let channel_counts = self.sensor.aggregate_channels().to_vec();

        let record = EventRecord {
            event,
            theta: trajectory.theta,
            signal_x: trajectory.x0,
            channel_counts,
            fiber_photons: self.photon_counts.as_slice().to_vec(),
            photons_produced: tally.produced,
            photons_detected: tally.detected,
            photons_undetected: tally.undetected,
            photons_out_of_bounds: tally.out_of_bounds,
            photons_blocked: tally.blocked,
            sampling_failures: tally.sampling_failures,
            out_of_domain: tally.out_of_domain,
        };
        debug!(
            "event {}: theta {:.4} rad, x {:.4e} m, {} photons, {} fired pixels",
            event,
            record.theta,
            record.signal_x,
            record.photons_produced,
            record.fired_pixels()
        );

        self.reset();
        record
    }

    /// Simulate `events` events, handing every record to `sink`.
    pub fn run(&mut self, events: usize, sink: &mut dyn EventSink) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::default();
        let mut fired = Vec::with_capacity(events);

        for event in 0..events {
            let record = self.simulate_event(event);
            summary.accumulate(&record);
            fired.push(record.fired_pixels() as f64);
            sink.write_record(&record)?;

            if (event + 1) % 100 == 0 {
                info!("Simulated {}/{} events", event + 1, events);
            }
        }
        sink.finish()?;

        summary.mean_fired_pixels = mean(&fired);
        summary.std_fired_pixels = std_dev(&fired);
        summary.median_fired_pixels = median(&fired);
        summary.elapsed = start.elapsed();

        if summary.sampling_failures > 0 || summary.out_of_domain > 0 {
            warn!(
                "{} sampling failures and {} out-of-domain draws over {} events",
                summary.sampling_failures, summary.out_of_domain, summary.events
            );
        }
        info!(
            "Run complete: {} events in {:.2?}, {} photons produced, {} detected",
            summary.events, summary.elapsed, summary.photons_produced, summary.photons_detected
        );
        Ok(summary)
    }

    /// Clear the sensor and the per-fiber photon counts.
    pub fn reset(&mut self) {
        self.sensor.reset();
        self.photon_counts.reset();
    }

    /// Current channel counts; all zero between events
    pub fn channel_counts(&self) -> &[u32] {
        self.sensor.channel_counts()
    }

    /// Current per-fiber photon counts; all zero between events
    pub fn photon_counts(&self) -> &PhotonCounts {
        &self.photon_counts
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn stack(&self) -> &FiberStack {
        &self.stack
    }

    pub fn sensor(&self) -> &SensorArray {
        &self.sensor
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }
}
