//! Gaussian kernel density estimation on a fixed grid
//!
//! Curves are normalised to sum to one over the grid so that communities with
//! different sample sizes can be compared point by point. They are meant for
//! visual comparison; significance comes from [`super::significance`].

use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

use crate::error::{AnalysisError, Result};

/// Kernel bandwidth rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum Bandwidth {
    /// Sample standard deviation times a constant factor
    ScaledStd(f64),

    /// Scott's rule, `n^(-1/5)` times the standard deviation
    Scott,

    /// Silverman's rule, `(3n/4)^(-1/5)` times the standard deviation
    Silverman,

    /// Absolute kernel width
    Fixed(f64),
}

impl Default for Bandwidth {
    fn default() -> Self {
        Bandwidth::ScaledStd(0.25)
    }
}

impl Bandwidth {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Bandwidth::ScaledStd(v) | Bandwidth::Fixed(v) if !(v > 0.0 && v.is_finite()) => Err(
                AnalysisError::invalid_config(format!("bandwidth must be positive, got {}", v)),
            ),
            _ => Ok(()),
        }
    }

    /// Kernel standard deviation for `samples`, `None` when it would be degenerate
    pub fn width(&self, samples: &[f64]) -> Option<f64> {
        let n = samples.len() as f64;
        let std = || samples.iter().std_dev();

        let width = match *self {
            Bandwidth::Fixed(h) => h,
            Bandwidth::ScaledStd(factor) => factor * std(),
            Bandwidth::Scott => n.powf(-0.2) * std(),
            Bandwidth::Silverman => (n * 3.0 / 4.0).powf(-0.2) * std(),
        };

        (width > 0.0 && width.is_finite()).then_some(width)
    }
}

/// `n` evenly spaced points from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Smoothed, grid-normalised density of a one-dimensional sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DensityEstimator {
    pub bandwidth: Bandwidth,
}

impl DensityEstimator {
    pub fn new(bandwidth: Bandwidth) -> Self {
        Self { bandwidth }
    }

    /// Evaluate the kernel density of `samples` at every `support` point.
    ///
    /// The result sums to one over `support`. When the sample has no spread
    /// (or the kernel vanishes on the whole grid) all mass goes to the grid
    /// point closest to the sample mean. An empty sample or grid has no
    /// normalised density and is rejected.
    pub fn estimate(&self, samples: &[f64], support: &[f64]) -> Result<Vec<f64>> {
        if samples.is_empty() {
            return Err(AnalysisError::invalid_config("density estimate needs at least one sample"));
        }
        if support.is_empty() {
            return Err(AnalysisError::invalid_config("density grid is empty"));
        }

        let kernel = self.bandwidth.width(samples).and_then(|h| Normal::new(0.0, h).ok());

        if let Some(kernel) = kernel {
            let mut density: Vec<f64> = support
                .iter()
                .map(|&x| samples.iter().map(|&s| kernel.pdf(x - s)).sum::<f64>())
                .collect();

            let total: f64 = density.iter().sum();
            if total > 0.0 && total.is_finite() {
                density.iter_mut().for_each(|d| *d /= total);
                return Ok(density);
            }
        }

        log::debug!("Degenerate kernel for {} samples, using a point mass", samples.len());
        Ok(point_mass(samples.iter().mean(), support))
    }
}

/// All mass on the support point nearest `at`
fn point_mass(at: f64, support: &[f64]) -> Vec<f64> {
    let nearest = support
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - at).abs().total_cmp(&(*b - at).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut density = vec![0.0; support.len()];
    density[nearest] = 1.0;
    density
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn uniform_samples(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(0.2..0.6)).collect()
    }

    #[test]
    fn test_linspace() {
        let grid = linspace(0.0, 1.0, 5);
        assert_eq!(grid, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(0.3, 1.0, 1), vec![0.3]);
    }

    #[test]
    fn test_density_sums_to_one_for_any_sample_size() {
        let support = linspace(0.0, 1.0, 100);
        let estimator = DensityEstimator::default();

        for n in [10usize, 10_000] {
            let density = estimator.estimate(&uniform_samples(n, n as u64), &support).unwrap();
            assert_eq!(density.len(), support.len());
            let total: f64 = density.iter().sum();
            assert!((total - 1.0).abs() < 1e-6, "n = {}: sum = {}", n, total);
            assert!(density.iter().all(|d| *d >= 0.0));
        }
    }

    #[test]
    fn test_every_bandwidth_rule_normalises() {
        let support = linspace(0.0, 1.0, 50);
        let samples = uniform_samples(200, 9);
        for bandwidth in [
            Bandwidth::ScaledStd(0.5),
            Bandwidth::Scott,
            Bandwidth::Silverman,
            Bandwidth::Fixed(0.05),
        ] {
            let density = DensityEstimator::new(bandwidth).estimate(&samples, &support).unwrap();
            let total: f64 = density.iter().sum();
            assert!((total - 1.0).abs() < 1e-6, "{:?}", bandwidth);
        }
    }

    #[test]
    fn test_peak_follows_the_sample() {
        let support = linspace(0.0, 1.0, 101);
        let samples: Vec<f64> = (0..100).map(|i| 0.7 + (i % 5) as f64 * 0.01).collect();
        let density = DensityEstimator::default().estimate(&samples, &support).unwrap();

        let peak = density
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| support[i])
            .unwrap();
        assert!((peak - 0.72).abs() < 0.03, "peak at {}", peak);
    }

    #[test]
    fn test_constant_sample_becomes_point_mass() {
        let support = linspace(0.0, 1.0, 11);
        let density = DensityEstimator::default().estimate(&[0.31; 25], &support).unwrap();
        assert_eq!(density[3], 1.0);
        assert_eq!(density.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_single_sample_becomes_point_mass() {
        let support = linspace(0.0, 1.0, 5);
        let density = DensityEstimator::default().estimate(&[0.9], &support).unwrap();
        assert_eq!(density, vec![0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_sample_or_grid_is_rejected() {
        let estimator = DensityEstimator::default();
        let err = estimator.estimate(&[], &linspace(0.0, 1.0, 5)).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig { .. }));

        let err = estimator.estimate(&[0.5, 0.6], &[]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig { .. }));
    }

    #[test]
    fn test_bandwidth_validation() {
        assert!(Bandwidth::ScaledStd(0.25).validate().is_ok());
        assert!(Bandwidth::Scott.validate().is_ok());
        assert!(Bandwidth::Fixed(0.0).validate().is_err());
        assert!(Bandwidth::ScaledStd(f64::NAN).validate().is_err());
    }
}
