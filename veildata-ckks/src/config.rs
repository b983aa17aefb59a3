use serde::{Deserialize, Serialize};

use crate::error::{CkksError, CkksResult};

/// Scheme parameters. The defaults mirror a typical interactive workload:
/// degree 4096 with a [30, 30, 30]-bit modulus chain and scale 2^30.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CkksParams {
    pub poly_modulus_degree: usize,
    pub coeff_modulus_bits: Vec<u32>,
    pub scale_bits: u32,
    pub hamming_weight: usize,
    pub error_std: f64,
}

impl Default for CkksParams {
    fn default() -> Self {
        Self {
            poly_modulus_degree: 4096,
            coeff_modulus_bits: vec![30, 30, 30],
            scale_bits: 30,
            hamming_weight: 64,
            error_std: 3.2,
        }
    }
}

impl CkksParams {
    /// Scale factor Δ = 2^scale_bits applied when packing values.
    pub fn scale(&self) -> f64 {
        2f64.powi(self.scale_bits as i32)
    }

    pub fn total_modulus_bits(&self) -> u32 {
        self.coeff_modulus_bits.iter().sum()
    }

    pub fn validate(&self) -> CkksResult<()> {
        let degree = self.poly_modulus_degree;
        if !degree.is_power_of_two() || !(8..=65536).contains(&degree) {
            return Err(CkksError::InvalidDegree { degree });
        }
        let chain = &self.coeff_modulus_bits;
        if chain.is_empty()
            || chain.len() > 4
            || chain.iter().any(|&bits| !(20..=30).contains(&bits))
        {
            return Err(CkksError::InvalidModulusChain(chain.clone()));
        }
        let total_bits = self.total_modulus_bits();
        if self.scale_bits == 0 || self.scale_bits + 16 > total_bits {
            return Err(CkksError::InvalidScale {
                scale_bits: self.scale_bits,
                total_bits,
            });
        }
        if self.hamming_weight == 0 || self.hamming_weight > degree {
            return Err(CkksError::InvalidHammingWeight {
                weight: self.hamming_weight,
                degree,
            });
        }
        if !(self.error_std.is_finite() && self.error_std > 0.0) {
            return Err(CkksError::InvalidErrorStd(self.error_std));
        }
        Ok(())
    }
}
