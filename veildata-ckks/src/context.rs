//! Encryption context: immutable scheme state shared by every vector
//! encrypted under it.
//!
//! Construction generates the key material, which dominates the cost; the
//! finished context is read-only and may be shared freely (`Arc`) across
//! concurrent pipelines. Decryption under the wrong context is rejected by
//! fingerprint, never attempted.
//!
//! The scheme is approximate: with the default parameters the per-slot
//! round-trip error sits around 1e-6, and callers should budget for
//! [`DECRYPT_TOLERANCE`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use blake3::Hasher;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CkksParams;
use crate::encoding::{decode, encode, encode_scalar};
use crate::error::{CkksError, CkksResult};
use crate::math::{generate_ntt_primes, RnsBasis};
use crate::keys::{PublicKey, SecretKey};
use crate::poly::{sample_error, sample_ternary, RnsPoly};

/// Guaranteed absolute accuracy of `decrypt(encrypt(v))` (and of one
/// homomorphic scalar addition) under any validated parameter set.
pub const DECRYPT_TOLERANCE: f64 = 1e-2;

/// Blake3 fingerprint binding ciphertexts to the context that made them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId([u8; 32]);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({self})")
    }
}

/// One encrypted column: an RLWE pair plus the slot count actually packed.
#[derive(Clone)]
pub struct Ciphertext {
    pub(crate) c0: RnsPoly,
    pub(crate) c1: RnsPoly,
    len: usize,
    scale: f64,
    context_id: ContextId,
}

impl Ciphertext {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ciphertext")
            .field("len", &self.len)
            .field("scale", &self.scale)
            .field("context_id", &self.context_id)
            .finish()
    }
}

pub struct CkksContext {
    params: CkksParams,
    basis: Arc<RnsBasis>,
    public_key: PublicKey,
    secret_key: Option<SecretKey>,
    id: ContextId,
}

impl fmt::Debug for CkksContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CkksContext")
            .field("params", &self.params)
            .field("id", &self.id)
            .field("has_secret_key", &self.secret_key.is_some())
            .finish()
    }
}

impl CkksContext {
    /// Generates a fresh context from OS entropy.
    pub fn generate(params: CkksParams) -> CkksResult<Self> {
        Self::generate_seeded(params, random_seed())
    }

    /// Deterministic construction for tests.
    pub fn generate_seeded(params: CkksParams, seed: [u8; 32]) -> CkksResult<Self> {
        params.validate()?;
        let basis = Arc::new(build_basis(&params)?);
        let mut rng = ChaCha20Rng::from_seed(seed);
        let secret_key = SecretKey::generate(&basis, params.hamming_weight, &mut rng);
        let public_key = PublicKey::generate(&secret_key, &basis, params.error_std, &mut rng);
        let id = derive_context_id(&params, &public_key);
        debug!(
            poly_modulus_degree = params.poly_modulus_degree,
            modulus_bits = params.total_modulus_bits(),
            %id,
            "ckks context ready"
        );
        Ok(Self {
            params,
            basis,
            public_key,
            secret_key: Some(secret_key),
            id,
        })
    }

    /// Copy of this context carrying only public material: it can encrypt
    /// and add, but decryption fails with `MissingSecretKey`.
    pub fn public_clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            basis: self.basis.clone(),
            public_key: self.public_key.clone(),
            secret_key: None,
            id: self.id,
        }
    }

    pub fn params(&self) -> &CkksParams {
        &self.params
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn has_secret_key(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Number of values one ciphertext can pack.
    pub fn slot_capacity(&self) -> usize {
        self.params.poly_modulus_degree
    }

    /// Packs and encrypts a whole column as one ciphertext:
    /// c0 = b·u + e1 + m, c1 = a·u + e2.
    pub fn encrypt<R: Rng>(&self, values: &[f64], rng: &mut R) -> CkksResult<Ciphertext> {
        let scale = self.params.scale();
        let plaintext = encode(values, scale, &self.basis)?;
        let u = sample_ternary(&self.basis, 0.5, rng);
        let e1 = sample_error(&self.basis, self.params.error_std, rng);
        let e2 = sample_error(&self.basis, self.params.error_std, rng);
        let c0 = u.mul(&self.public_key.b).add(&e1).add(&plaintext);
        let c1 = u.mul(&self.public_key.a).add(&e2);
        Ok(Ciphertext {
            c0,
            c1,
            len: values.len(),
            scale,
            context_id: self.id,
        })
    }

    /// Homomorphically adds a public scalar to every packed slot. Touches
    /// only c0 with a plaintext constant, so no secret material is involved.
    pub fn add_plain_scalar(&self, ciphertext: &Ciphertext, scalar: f64) -> CkksResult<Ciphertext> {
        self.check_ownership(ciphertext)?;
        let encoded = encode_scalar(scalar, ciphertext.scale, &self.basis)?;
        let broadcast =
            RnsPoly::from_signed_coeffs(&vec![encoded; ciphertext.len], self.basis.clone());
        Ok(Ciphertext {
            c0: ciphertext.c0.add(&broadcast),
            c1: ciphertext.c1.clone(),
            len: ciphertext.len,
            scale: ciphertext.scale,
            context_id: self.id,
        })
    }

    /// Decrypts c0 + c1·s and decodes the packed slots. The result matches
    /// the ideal arithmetic only up to the scheme noise; see
    /// [`DECRYPT_TOLERANCE`].
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> CkksResult<Vec<f64>> {
        self.check_ownership(ciphertext)?;
        let secret = self
            .secret_key
            .as_ref()
            .ok_or(CkksError::MissingSecretKey)?;
        let plaintext = ciphertext.c0.add(&secret.s.mul(&ciphertext.c1));
        Ok(decode(&plaintext, ciphertext.scale, ciphertext.len))
    }

    fn check_ownership(&self, ciphertext: &Ciphertext) -> CkksResult<()> {
        if ciphertext.context_id != self.id {
            return Err(CkksError::ContextMismatch {
                ciphertext: ciphertext.context_id,
                context: self.id,
            });
        }
        Ok(())
    }
}

fn build_basis(params: &CkksParams) -> CkksResult<RnsBasis> {
    // Group equal bit sizes so repeated chain entries get distinct primes.
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for &bits in &params.coeff_modulus_bits {
        *counts.entry(bits).or_insert(0) += 1;
    }
    let mut pools: BTreeMap<u32, Vec<u64>> = BTreeMap::new();
    for (&bits, &count) in &counts {
        let primes = generate_ntt_primes(bits, count, params.poly_modulus_degree)?;
        pools.insert(bits, primes);
    }
    let primes = params
        .coeff_modulus_bits
        .iter()
        .map(|bits| pools.get_mut(bits).and_then(Vec::pop))
        .collect::<Option<Vec<u64>>>()
        .ok_or(CkksError::PrimeSearchExhausted {
            bits: params.coeff_modulus_bits[0],
            degree: params.poly_modulus_degree,
        })?;
    RnsBasis::new(params.poly_modulus_degree, primes)
}

fn derive_context_id(params: &CkksParams, public_key: &PublicKey) -> ContextId {
    let mut hasher = Hasher::new();
    hasher.update(&params.poly_modulus_degree.to_le_bytes());
    for &bits in &params.coeff_modulus_bits {
        hasher.update(&bits.to_le_bytes());
    }
    hasher.update(&params.scale_bits.to_le_bytes());
    for poly in [&public_key.b, &public_key.a] {
        for coeff in poly.to_centered_coeffs() {
            hasher.update(&coeff.to_le_bytes());
        }
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(hasher.finalize().as_bytes());
    ContextId(out)
}

fn random_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    let mut rng = rand::rngs::StdRng::from_entropy();
    rng.fill_bytes(&mut seed);
    seed
}
