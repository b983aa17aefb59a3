//! veildata-ckks – compact approximate homomorphic encryption in the CKKS
//! shape: packed encoding of real vectors at a fixed scale over an RNS
//! negacyclic ring, RLWE public-key encryption, plaintext-scalar addition on
//! ciphertexts, and approximate decryption. The context is immutable after
//! key generation so one context can serve many concurrent encrypted
//! columns.

pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod math;
pub mod poly;

pub use config::CkksParams;
pub use context::{Ciphertext, CkksContext, ContextId, DECRYPT_TOLERANCE};
pub use error::{CkksError, CkksResult};
pub use keys::{PublicKey, SecretKey};
pub use math::RnsBasis;
pub use poly::RnsPoly;
