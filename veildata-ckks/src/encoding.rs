//! Coefficient packing of real vectors at a fixed scale.
//!
//! Value `v_j` lands in coefficient `round(v_j · Δ)` with Δ = 2^scale_bits;
//! one ring element packs up to N values. Decoding centers each coefficient
//! modulo Q and divides the scale back out, so the round-trip error per slot
//! is bounded by the scheme noise plus ~1/Δ of encoding rounding.

use std::sync::Arc;

use crate::error::{CkksError, CkksResult};
use crate::math::RnsBasis;
use crate::poly::RnsPoly;

/// Largest magnitude an encoded coefficient may take: a quarter of Q so a
/// packed value plus a homomorphic scalar stays centered, capped at i64.
fn encodable_limit(basis: &RnsBasis) -> f64 {
    let quarter = basis.modulus() >> 2;
    quarter.min(1u128 << 62) as f64
}

pub fn encode(values: &[f64], scale: f64, basis: &Arc<RnsBasis>) -> CkksResult<RnsPoly> {
    if values.is_empty() {
        return Err(CkksError::EmptyInput);
    }
    if values.len() > basis.degree() {
        return Err(CkksError::CapacityExceeded {
            len: values.len(),
            capacity: basis.degree(),
        });
    }
    let limit = encodable_limit(basis);
    let mut coeffs = Vec::with_capacity(values.len());
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(CkksError::NonFiniteInput { index });
        }
        let scaled = value * scale;
        if scaled.abs() >= limit {
            return Err(CkksError::ValueOutOfRange { value, index });
        }
        coeffs.push(scaled.round() as i64);
    }
    Ok(RnsPoly::from_signed_coeffs(&coeffs, basis.clone()))
}

/// Encodes a public scalar for homomorphic addition.
pub fn encode_scalar(value: f64, scale: f64, basis: &Arc<RnsBasis>) -> CkksResult<i64> {
    if !value.is_finite() {
        return Err(CkksError::NonFiniteInput { index: 0 });
    }
    let scaled = value * scale;
    if scaled.abs() >= encodable_limit(basis) {
        return Err(CkksError::ValueOutOfRange { value, index: 0 });
    }
    Ok(scaled.round() as i64)
}

pub fn decode(poly: &RnsPoly, scale: f64, len: usize) -> Vec<f64> {
    poly.to_centered_coeffs()
        .into_iter()
        .take(len)
        .map(|c| c as f64 / scale)
        .collect()
}
