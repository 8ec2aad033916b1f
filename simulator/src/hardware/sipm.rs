//! SiPM channel array read out at the end of the fiber mat.
//!
//! The sensor is a grid of single-photon pixels. A channel groups
//! `pixel_columns_per_channel` adjacent pixel columns over the full height
//! of the array and reports how many of its pixels fired during the event.
//!
//! # Coordinate System
//! - Origin at the lower-left corner of pixel `(column 0, row 0)`
//! - X along the channels, Y along the channel height, meters
//! - Positions outside the grid are dropped silently

use ndarray::Array2;
use rand::Rng;

use crate::config::DetectorConfig;

/// Outcome of a photon reaching the sensor plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelHit {
    /// Photon detected; the pixel at `(column, row)` fired
    Fired { column: usize, row: usize },
    /// Photon landed on a pixel but was not detected
    Undetected,
    /// Photon missed the pixel grid
    OutOfBounds,
}

/// Pixel grid plus the per-channel counts derived from it.
#[derive(Debug, Clone)]
pub struct SensorArray {
    /// Fired state, indexed `[[row, column]]`
    pixels: Array2<bool>,
    channel_counts: Vec<u32>,
    pixel_width: f64,
    pixel_height: f64,
    columns_per_channel: usize,
    pde: f64,
}

impl SensorArray {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            pixels: Array2::from_elem((config.pixel_rows, config.pixel_columns()), false),
            channel_counts: vec![0; config.channel_count],
            pixel_width: config.pixel_width(),
            pixel_height: config.pixel_height(),
            columns_per_channel: config.pixel_columns_per_channel,
            pde: config.pde,
        }
    }

    /// Pixel `(column, row)` containing the point, if it lies on the grid.
    pub fn pixel_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let column = (x / self.pixel_width).floor();
        let row = (y / self.pixel_height).floor();
        if !(column >= 0.0 && row >= 0.0) {
            return None;
        }
        let (column, row) = (column as usize, row as usize);
        let (rows, columns) = self.pixels.dim();
        (column < columns && row < rows).then_some((column, row))
    }

    /// Register one photon landing at `(x, y)`.
    ///
    /// A photon on the grid fires its pixel with probability `pde`.
    /// Off-grid photons consume no random numbers.
    pub fn register_photon<R: Rng + ?Sized>(&mut self, x: f64, y: f64, rng: &mut R) -> PixelHit {
        let Some((column, row)) = self.pixel_index(x, y) else {
            return PixelHit::OutOfBounds;
        };
        if rng.gen::<f64>() < self.pde {
            self.pixels[[row, column]] = true;
            PixelHit::Fired { column, row }
        } else {
            PixelHit::Undetected
        }
    }

    /// Register one photon and report whether a pixel fired.
    pub fn fire_pixel<R: Rng + ?Sized>(&mut self, x: f64, y: f64, rng: &mut R) -> bool {
        matches!(self.register_photon(x, y, rng), PixelHit::Fired { .. })
    }

    /// Channel reading out a pixel column
    pub fn channel_of_column(&self, column: usize) -> usize {
        column / self.columns_per_channel
    }

    /// Recompute the channel counts from the pixel grid.
    ///
    /// The counts are rebuilt from zero on every call, so calling this
    /// repeatedly without new photons yields the same counts.
    pub fn aggregate_channels(&mut self) -> &[u32] {
        self.channel_counts.iter_mut().for_each(|c| *c = 0);
        for ((_, column), &fired) in self.pixels.indexed_iter() {
            if fired {
                self.channel_counts[column / self.columns_per_channel] += 1;
            }
        }
        &self.channel_counts
    }

    /// Clear every pixel and channel count.
    pub fn reset(&mut self) {
        self.pixels.fill(false);
        self.channel_counts.iter_mut().for_each(|c| *c = 0);
    }

    /// Channel counts from the last aggregation
    pub fn channel_counts(&self) -> &[u32] {
        &self.channel_counts
    }

    pub fn fired_pixel_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    pub fn pixels(&self) -> &Array2<bool> {
        &self.pixels
    }

    pub fn channel_count(&self) -> usize {
        self.channel_counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config_with_pde(pde: f64) -> DetectorConfig {
        DetectorConfig {
            pde,
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn test_pixel_index_mapping() {
        let sensor = SensorArray::new(&DetectorConfig::default());
        // Pixels are 62.5 um x 75 um
        assert_eq!(sensor.pixel_index(0.0, 0.0), Some((0, 0)));
        assert_eq!(sensor.pixel_index(63e-6, 74e-6), Some((1, 0)));
        assert_eq!(sensor.pixel_index(1.01e-3, 0.8e-3), Some((16, 10)));
        assert_eq!(sensor.pixel_index(-1e-9, 0.0), None);
        assert_eq!(sensor.pixel_index(0.0, 1.51e-3), None);
        assert_eq!(sensor.pixel_index(32.01e-3, 0.0), None);
        assert_eq!(sensor.pixel_index(f64::NAN, 0.0), None);
    }

    #[test]
    fn test_channel_of_column_stays_in_range() {
        let config = DetectorConfig::default();
        let sensor = SensorArray::new(&config);
        for column in 0..config.pixel_columns() {
            let channel = sensor.channel_of_column(column);
            assert_eq!(channel, column / 4);
            assert!(channel < config.channel_count);
        }
    }

    #[test]
    fn test_full_pde_always_fires() {
        let mut sensor = SensorArray::new(&config_with_pde(1.0));
        let mut rng = StdRng::seed_from_u64(0);
        for i in 0..100 {
            assert!(sensor.fire_pixel(i as f64 * 100e-6, 0.5e-3, &mut rng));
        }
    }

    #[test]
    fn test_zero_pde_never_fires() {
        let mut sensor = SensorArray::new(&config_with_pde(0.0));
        let mut rng = StdRng::seed_from_u64(0);
        for i in 0..100 {
            assert_eq!(
                sensor.register_photon(i as f64 * 100e-6, 0.5e-3, &mut rng),
                PixelHit::Undetected
            );
        }
        assert_eq!(sensor.fired_pixel_count(), 0);
    }

    #[test]
    fn test_detection_rate_follows_pde() {
        let mut sensor = SensorArray::new(&config_with_pde(0.25));
        let mut rng = StdRng::seed_from_u64(1);
        let n = 20_000;
        let fired = (0..n)
            .filter(|_| sensor.fire_pixel(1e-3, 1e-3, &mut rng))
            .count();
        let rate = fired as f64 / n as f64;
        assert!((rate - 0.25).abs() < 0.02, "detection rate {rate}");
    }

    #[test]
    fn test_out_of_bounds_is_silent() {
        let mut sensor = SensorArray::new(&config_with_pde(1.0));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            sensor.register_photon(-1e-3, 0.0, &mut rng),
            PixelHit::OutOfBounds
        );
        assert_eq!(sensor.fired_pixel_count(), 0);
    }

    #[test]
    fn test_aggregation_counts_pixels_not_photons() {
        let mut sensor = SensorArray::new(&config_with_pde(1.0));
        let mut rng = StdRng::seed_from_u64(0);
        // Two photons on the same pixel, one on a neighbouring pixel of channel 0,
        // one in channel 2
        sensor.fire_pixel(10e-6, 10e-6, &mut rng);
        sensor.fire_pixel(20e-6, 20e-6, &mut rng);
        sensor.fire_pixel(70e-6, 10e-6, &mut rng);
        sensor.fire_pixel(0.55e-3, 1.2e-3, &mut rng);

        let counts = sensor.aggregate_channels().to_vec();
        assert_eq!(counts[0], 2);
        assert_eq!(counts[1], 0);
        assert_eq!(counts[2], 1);
        assert_eq!(counts.iter().sum::<u32>(), 3);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let mut sensor = SensorArray::new(&config_with_pde(1.0));
        let mut rng = StdRng::seed_from_u64(0);
        for i in 0..50 {
            sensor.fire_pixel(i as f64 * 37e-6, (i % 20) as f64 * 75e-6, &mut rng);
        }
        let first = sensor.aggregate_channels().to_vec();
        let second = sensor.aggregate_channels().to_vec();
        assert_eq!(first, second);
        assert_eq!(first.iter().sum::<u32>() as usize, sensor.fired_pixel_count());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut sensor = SensorArray::new(&config_with_pde(1.0));
        let mut rng = StdRng::seed_from_u64(0);
        for i in 0..30 {
            sensor.fire_pixel(i as f64 * 100e-6, 0.3e-3, &mut rng);
        }
        sensor.aggregate_channels();
        sensor.reset();
        assert!(sensor.channel_counts().iter().all(|&c| c == 0));
        assert!(sensor.pixels().iter().all(|&p| !p));
        assert!(sensor.aggregate_channels().iter().all(|&c| c == 0));
    }
}
