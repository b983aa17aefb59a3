//! Calibrated noise mechanisms.
//!
//! Laplace draws one inverse-CDF sample at scale b = sensitivity / epsilon,
//! giving ε-DP for a query of the stated L1 sensitivity. Gaussian calibrates
//! the minimal sigma meeting (ε, δ)-DP for an L2-sensitivity query via the
//! analytic Gaussian mechanism (Balle & Wang 2018): a bracket-and-bisect
//! search over the privacy-loss boundary using the standard normal CDF. The
//! full domain δ ∈ (0, 1) is accepted.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use statrs::function::erf::erfc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DpError {
    #[error("epsilon must be > 0")]
    InvalidEpsilon,
    #[error("delta must be within (0,1)")]
    InvalidDelta,
    #[error("sensitivity must be positive")]
    InvalidSensitivity,
    #[error("epsilon {0} outside the supported range (0, 10]")]
    EpsilonOutOfRange(f64),
    #[error("sensitivity {0} outside the supported range [0.1, 10]")]
    SensitivityOutOfRange(f64),
}

/// Laplace scale b = sensitivity / epsilon.
pub fn laplace_scale(epsilon: f64, sensitivity: f64) -> Result<f64, DpError> {
    validate_epsilon(epsilon)?;
    validate_sensitivity(sensitivity)?;
    Ok(sensitivity / epsilon)
}

/// Minimal Gaussian sigma meeting (epsilon, delta)-DP.
pub fn gaussian_sigma(epsilon: f64, sensitivity: f64, delta: f64) -> Result<f64, DpError> {
    validate_epsilon(epsilon)?;
    validate_sensitivity(sensitivity)?;
    validate_delta(delta)?;
    let alpha = analytic_alpha(epsilon, delta);
    let sigma = alpha * sensitivity / (2.0 * epsilon).sqrt();
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(DpError::InvalidEpsilon);
    }
    Ok(sigma)
}

/// One Laplace(0, scale) draw via the inverse CDF.
pub fn sample_laplace<R: Rng>(scale: f64, rng: &mut R) -> f64 {
    let u: f64 = rng.gen::<f64>() - 0.5;
    let magnitude = (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE);
    -scale * u.signum() * magnitude.ln()
}

/// One N(0, sigma²) draw.
pub fn sample_gaussian<R: Rng>(sigma: f64, rng: &mut R) -> f64 {
    let normal = Normal::new(0.0, sigma.max(f64::MIN_POSITIVE)).unwrap();
    normal.sample(rng)
}

/// `value` + Laplace noise calibrated for ε-DP.
pub fn laplace_noise<R: Rng>(
    value: f64,
    epsilon: f64,
    sensitivity: f64,
    rng: &mut R,
) -> Result<f64, DpError> {
    let scale = laplace_scale(epsilon, sensitivity)?;
    Ok(value + sample_laplace(scale, rng))
}

/// `value` + Gaussian noise calibrated for (ε, δ)-DP.
pub fn gaussian_noise<R: Rng>(
    value: f64,
    epsilon: f64,
    sensitivity: f64,
    delta: f64,
    rng: &mut R,
) -> Result<f64, DpError> {
    let sigma = gaussian_sigma(epsilon, sensitivity, delta)?;
    Ok(value + sample_gaussian(sigma, rng))
}

pub(crate) fn validate_epsilon(epsilon: f64) -> Result<(), DpError> {
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(DpError::InvalidEpsilon);
    }
    Ok(())
}

pub(crate) fn validate_sensitivity(sensitivity: f64) -> Result<(), DpError> {
    if !(sensitivity.is_finite() && sensitivity > 0.0) {
        return Err(DpError::InvalidSensitivity);
    }
    Ok(())
}

pub(crate) fn validate_delta(delta: f64) -> Result<(), DpError> {
    if !(delta.is_finite() && delta > 0.0 && delta < 1.0) {
        return Err(DpError::InvalidDelta);
    }
    Ok(())
}

fn phi(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Balle & Wang Algorithm 1: the noise multiplier alpha such that
/// sigma = alpha · sensitivity / sqrt(2 · epsilon).
fn analytic_alpha(epsilon: f64, delta: f64) -> f64 {
    let delta_zero = phi(0.0) - epsilon.exp() * phi(-(2.0 * epsilon).sqrt());
    if delta >= delta_zero {
        let boundary = |v: f64| {
            phi((epsilon * v).sqrt()) - epsilon.exp() * phi(-(epsilon * (v + 2.0)).sqrt())
        };
        let v = solve_monotone(boundary, delta, true);
        (1.0 + v / 2.0).sqrt() - (v / 2.0).sqrt()
    } else {
        let boundary = |v: f64| {
            phi(-(epsilon * v).sqrt()) - epsilon.exp() * phi(-(epsilon * (v + 2.0)).sqrt())
        };
        let v = solve_monotone(boundary, delta, false);
        (1.0 + v / 2.0).sqrt() + (v / 2.0).sqrt()
    }
}

/// Bisects a monotone boundary function to its target level, after growing
/// the bracket geometrically.
fn solve_monotone<F: Fn(f64) -> f64>(f: F, target: f64, increasing: bool) -> f64 {
    let mut hi = 1.0;
    while hi < 1e12 {
        let value = f(hi);
        if (increasing && value >= target) || (!increasing && value <= target) {
            break;
        }
        hi *= 2.0;
    }
    let mut lo = 0.0;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        let value = f(mid);
        let below = if increasing { value < target } else { value > target };
        if below {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn laplace_scale_is_sensitivity_over_epsilon() {
        assert_eq!(laplace_scale(0.5, 1.0).unwrap(), 2.0);
        assert_eq!(laplace_scale(2.0, 4.0).unwrap(), 2.0);
    }

    #[test]
    fn invalid_domains_are_rejected() {
        assert_eq!(laplace_scale(0.0, 1.0), Err(DpError::InvalidEpsilon));
        assert_eq!(laplace_scale(-0.5, 1.0), Err(DpError::InvalidEpsilon));
        assert_eq!(laplace_scale(0.5, -1.0), Err(DpError::InvalidSensitivity));
        assert_eq!(gaussian_sigma(0.0, 1.0, 1e-5), Err(DpError::InvalidEpsilon));
        assert_eq!(
            gaussian_sigma(0.5, -1.0, 1e-5),
            Err(DpError::InvalidSensitivity)
        );
        assert_eq!(gaussian_sigma(0.5, 1.0, 1.5), Err(DpError::InvalidDelta));
        assert_eq!(gaussian_sigma(0.5, 1.0, 0.0), Err(DpError::InvalidDelta));
        assert_eq!(
            gaussian_sigma(f64::NAN, 1.0, 1e-5),
            Err(DpError::InvalidEpsilon)
        );
    }

    #[test]
    fn sigma_strictly_decreases_in_epsilon() {
        let deltas = [1e-6, 1e-5, 1e-3];
        for delta in deltas {
            let mut last = f64::INFINITY;
            for epsilon in [0.1, 0.5, 1.0, 2.0, 5.0, 10.0] {
                let sigma = gaussian_sigma(epsilon, 1.0, delta).unwrap();
                assert!(
                    sigma < last,
                    "sigma {sigma} not below {last} at eps {epsilon}, delta {delta}"
                );
                last = sigma;
            }
        }
    }

    #[test]
    fn sigma_strictly_decreases_in_delta() {
        for epsilon in [0.1, 0.5, 1.0, 5.0] {
            let mut last = f64::INFINITY;
            for delta in [1e-8, 1e-6, 1e-4, 1e-2, 0.1] {
                let sigma = gaussian_sigma(epsilon, 1.0, delta).unwrap();
                assert!(
                    sigma < last,
                    "sigma {sigma} not below {last} at eps {epsilon}, delta {delta}"
                );
                last = sigma;
            }
        }
    }

    #[test]
    fn analytic_sigma_beats_the_classical_bound() {
        // For eps < 1 the classical sigma = Δ·sqrt(2 ln(1.25/δ))/ε is a valid
        // but non-minimal calibration, so the analytic value must sit at or
        // below it.
        let (epsilon, delta): (f64, f64) = (0.5, 1e-5);
        let classical = (2.0 * (1.25 / delta).ln()).sqrt() / epsilon;
        let analytic = gaussian_sigma(epsilon, 1.0, delta).unwrap();
        assert!(analytic > 0.0);
        assert!(
            analytic <= classical * (1.0 + 1e-9),
            "analytic {analytic} above classical {classical}"
        );
    }

    #[test]
    fn sigma_scales_linearly_in_sensitivity() {
        let one = gaussian_sigma(0.5, 1.0, 1e-5).unwrap();
        let five = gaussian_sigma(0.5, 5.0, 1e-5).unwrap();
        assert!((five / one - 5.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_draws_differ() {
        let mut rng = ChaCha20Rng::from_seed([21u8; 32]);
        let a = laplace_noise(100.0, 0.5, 1.0, &mut rng).unwrap();
        let b = laplace_noise(100.0, 0.5, 1.0, &mut rng).unwrap();
        assert_ne!(a, b);
        let c = gaussian_noise(100.0, 0.5, 1.0, 1e-5, &mut rng).unwrap();
        let d = gaussian_noise(100.0, 0.5, 1.0, 1e-5, &mut rng).unwrap();
        assert_ne!(c, d);
    }

    #[test]
    fn laplace_noise_is_unbiased() {
        let mut rng = ChaCha20Rng::from_seed([22u8; 32]);
        let n = 20_000;
        let value = 10.0;
        let sum: f64 = (0..n)
            .map(|_| laplace_noise(value, 0.5, 1.0, &mut rng).unwrap())
            .sum();
        let mean = sum / n as f64;
        // Scale b = 2 so the standard error is sqrt(2·b²/n) ≈ 0.02.
        assert!((mean - value).abs() < 0.1, "mean {mean} drifted from {value}");
    }

    #[test]
    fn laplace_variance_matches_two_b_squared() {
        let mut rng = ChaCha20Rng::from_seed([23u8; 32]);
        let scale = 2.0;
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| sample_laplace(scale, &mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let expected = 2.0 * scale * scale;
        assert!(
            (variance - expected).abs() / expected < 0.2,
            "variance {variance} too far from {expected}"
        );
    }

    #[test]
    fn gaussian_variance_matches_sigma_squared() {
        let mut rng = ChaCha20Rng::from_seed([24u8; 32]);
        let sigma = 3.0;
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| sample_gaussian(sigma, &mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let expected = sigma * sigma;
        assert!(
            (variance - expected).abs() / expected < 0.15,
            "variance {variance} too far from {expected}"
        );
    }
}
