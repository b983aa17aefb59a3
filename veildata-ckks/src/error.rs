use thiserror::Error;

use crate::context::ContextId;

pub type CkksResult<T> = Result<T, CkksError>;

#[derive(Debug, Error)]
pub enum CkksError {
    #[error("polynomial modulus degree must be a power of two in 8..=65536, got {degree}")]
    InvalidDegree { degree: usize },
    #[error("coefficient modulus chain must hold 1..=4 primes of 20..=30 bits, got {0:?}")]
    InvalidModulusChain(Vec<u32>),
    #[error("scale 2^{scale_bits} leaves no headroom under a {total_bits}-bit coefficient modulus")]
    InvalidScale { scale_bits: u32, total_bits: u32 },
    #[error("secret key hamming weight {weight} does not fit degree {degree}")]
    InvalidHammingWeight { weight: usize, degree: usize },
    #[error("error distribution std must be positive and finite, got {0}")]
    InvalidErrorStd(f64),
    #[error("ran out of {bits}-bit NTT-friendly primes for degree {degree}")]
    PrimeSearchExhausted { bits: u32, degree: usize },
    #[error("cannot encrypt an empty vector")]
    EmptyInput,
    #[error("vector of {len} values exceeds the {capacity}-slot capacity")]
    CapacityExceeded { len: usize, capacity: usize },
    #[error("input contains a non-finite value at index {index}")]
    NonFiniteInput { index: usize },
    #[error("value {value} at index {index} exceeds the encodable range at the configured scale")]
    ValueOutOfRange { value: f64, index: usize },
    #[error("context holds no secret key material")]
    MissingSecretKey,
    #[error("ciphertext was produced under context {ciphertext}, not {context}")]
    ContextMismatch {
        ciphertext: ContextId,
        context: ContextId,
    },
}
