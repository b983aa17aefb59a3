//! Residue polynomials over Z[X]/(X^N + 1) and the samplers the scheme
//! draws key, ephemeral, and error polynomials from.

use std::sync::Arc;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::math::RnsBasis;

/// One ring element, stored residue-wise: `residues[i][j]` is coefficient `j`
/// reduced modulo the basis prime `i`.
#[derive(Clone, Debug)]
pub struct RnsPoly {
    basis: Arc<RnsBasis>,
    residues: Vec<Vec<u64>>,
}

impl RnsPoly {
    /// Builds a polynomial from signed integer coefficients, zero-padded to
    /// the ring degree. Coefficients are reduced into each prime field.
    pub fn from_signed_coeffs(coeffs: &[i64], basis: Arc<RnsBasis>) -> Self {
        debug_assert!(coeffs.len() <= basis.degree());
        let degree = basis.degree();
        let residues = basis
            .primes()
            .iter()
            .map(|&p| {
                let mut row = vec![0u64; degree];
                for (j, &c) in coeffs.iter().enumerate() {
                    row[j] = c.rem_euclid(p as i64) as u64;
                }
                row
            })
            .collect();
        Self { basis, residues }
    }

    pub fn basis(&self) -> &Arc<RnsBasis> {
        &self.basis
    }

    pub fn add(&self, rhs: &RnsPoly) -> RnsPoly {
        debug_assert!(Arc::ptr_eq(&self.basis, &rhs.basis));
        let residues = self
            .basis
            .primes()
            .iter()
            .enumerate()
            .map(|(l, &p)| {
                self.residues[l]
                    .iter()
                    .zip(&rhs.residues[l])
                    .map(|(&a, &b)| {
                        let s = a + b;
                        if s >= p { s - p } else { s }
                    })
                    .collect()
            })
            .collect();
        RnsPoly {
            basis: self.basis.clone(),
            residues,
        }
    }

    pub fn neg(&self) -> RnsPoly {
        let residues = self
            .basis
            .primes()
            .iter()
            .enumerate()
            .map(|(l, &p)| {
                self.residues[l]
                    .iter()
                    .map(|&a| if a == 0 { 0 } else { p - a })
                    .collect()
            })
            .collect();
        RnsPoly {
            basis: self.basis.clone(),
            residues,
        }
    }

    /// Negacyclic product: X^N ≡ -1, so terms wrapping past the degree come
    /// back with flipped sign. Schoolbook with zero-skipping, which makes
    /// products against sparse ternary polynomials cheap.
    pub fn mul(&self, rhs: &RnsPoly) -> RnsPoly {
        debug_assert!(Arc::ptr_eq(&self.basis, &rhs.basis));
        let n = self.basis.degree();
        let residues = self
            .basis
            .primes()
            .iter()
            .enumerate()
            .map(|(l, &p)| {
                let a = &self.residues[l];
                let b = &rhs.residues[l];
                // Row sums stay below N·p < 2^64 for every supported basis.
                let mut acc = vec![0u64; n];
                for (i, &ai) in a.iter().enumerate() {
                    if ai == 0 {
                        continue;
                    }
                    for (j, &bj) in b.iter().enumerate() {
                        if bj == 0 {
                            continue;
                        }
                        let t = crate::math::mul_mod(ai, bj, p);
                        let k = i + j;
                        if k < n {
                            acc[k] += t;
                        } else {
                            acc[k - n] += p - t;
                        }
                    }
                }
                acc.into_iter().map(|x| x % p).collect()
            })
            .collect();
        RnsPoly {
            basis: self.basis.clone(),
            residues,
        }
    }

    /// CRT-reconstructs every coefficient into the centered interval.
    pub fn to_centered_coeffs(&self) -> Vec<i128> {
        let n = self.basis.degree();
        let k = self.basis.primes().len();
        let mut scratch = vec![0u64; k];
        (0..n)
            .map(|j| {
                for l in 0..k {
                    scratch[l] = self.residues[l][j];
                }
                self.basis.reconstruct_centered(&scratch)
            })
            .collect()
    }
}

/// Uniform element of the full coefficient ring, sampled residue-wise.
pub fn sample_uniform<R: Rng>(basis: &Arc<RnsBasis>, rng: &mut R) -> RnsPoly {
    let degree = basis.degree();
    let residues = basis
        .primes()
        .iter()
        .map(|&p| (0..degree).map(|_| rng.gen_range(0..p)).collect())
        .collect();
    RnsPoly {
        basis: basis.clone(),
        residues,
    }
}

/// Ternary polynomial with each coefficient -1/0/+1; `density` is the
/// probability of a nonzero coefficient, split evenly between signs.
pub fn sample_ternary<R: Rng>(basis: &Arc<RnsBasis>, density: f64, rng: &mut R) -> RnsPoly {
    let coeffs: Vec<i64> = (0..basis.degree())
        .map(|_| {
            let r: f64 = rng.gen();
            if r < density / 2.0 {
                1
            } else if r < density {
                -1
            } else {
                0
            }
        })
        .collect();
    RnsPoly::from_signed_coeffs(&coeffs, basis.clone())
}

/// Ternary polynomial with exactly `weight` nonzero coefficients of random
/// sign, the HEAAN-style sparse secret shape.
pub fn sample_hamming_ternary<R: Rng>(
    basis: &Arc<RnsBasis>,
    weight: usize,
    rng: &mut R,
) -> RnsPoly {
    let degree = basis.degree();
    let mut coeffs = vec![0i64; degree];
    for index in rand::seq::index::sample(rng, degree, weight) {
        coeffs[index] = if rng.gen::<bool>() { 1 } else { -1 };
    }
    RnsPoly::from_signed_coeffs(&coeffs, basis.clone())
}

/// Rounded-Gaussian error polynomial with the given standard deviation.
pub fn sample_error<R: Rng>(basis: &Arc<RnsBasis>, std_dev: f64, rng: &mut R) -> RnsPoly {
    let normal = Normal::new(0.0, std_dev.max(f64::MIN_POSITIVE)).unwrap();
    let coeffs: Vec<i64> = (0..basis.degree())
        .map(|_| normal.sample(rng).round() as i64)
        .collect();
    RnsPoly::from_signed_coeffs(&coeffs, basis.clone())
}
