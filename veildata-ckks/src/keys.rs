use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::math::RnsBasis;
use crate::poly::{sample_error, sample_hamming_ternary, sample_uniform, RnsPoly};

/// Sparse ternary secret. Never serialized; redacted from Debug output.
pub struct SecretKey {
    pub(crate) s: RnsPoly,
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey").field("s", &"[REDACTED]").finish()
    }
}

impl SecretKey {
    pub fn generate<R: Rng>(basis: &Arc<RnsBasis>, hamming_weight: usize, rng: &mut R) -> Self {
        Self {
            s: sample_hamming_ternary(basis, hamming_weight, rng),
        }
    }
}

/// RLWE public key pair (b, a) with b = -(a·s) + e.
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub(crate) b: RnsPoly,
    pub(crate) a: RnsPoly,
}

impl PublicKey {
    pub fn generate<R: Rng>(
        secret: &SecretKey,
        basis: &Arc<RnsBasis>,
        error_std: f64,
        rng: &mut R,
    ) -> Self {
        let a = sample_uniform(basis, rng);
        let e = sample_error(basis, error_std, rng);
        // Sparse operand first: mul zero-skips on the left-hand side.
        let b = secret.s.mul(&a).neg().add(&e);
        Self { b, a }
    }
}
