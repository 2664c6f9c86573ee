use crate::error::{Result, ScaleError};
use crate::ring::modular::{mod_add, mod_neg};

/// Plaintext polynomial: coefficients in [0, t) under the centered convention,
/// where values >= ceil(t/2) stand for the negative integers c - t.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlainPoly {
    pub coeffs: Vec<u64>,
    pub modulus: u64,
}

impl PlainPoly {
    /// Create a zero polynomial with `n` coefficients in Z_t.
    pub fn zero(n: usize, modulus: u64) -> Self {
        Self {
            coeffs: vec![0u64; n],
            modulus,
        }
    }

    /// Create a polynomial from coefficients (reduced mod t).
    ///
    /// # Panics
    /// If `modulus < 2`; use [`PlainPoly::try_from_coeffs`] for untrusted input.
    pub fn from_coeffs(coeffs: Vec<u64>, modulus: u64) -> Self {
        assert!(modulus > 1, "modulus must be > 1");
        let mut p = Self { coeffs, modulus };
        p.reduce();
        p
    }

    /// Like [`PlainPoly::from_coeffs`], but rejects coefficients >= t instead of reducing them.
    pub fn try_from_coeffs(coeffs: Vec<u64>, modulus: u64) -> Result<Self> {
        if modulus < 2 {
            return Err(ScaleError::InvalidParam(format!("plain_modulus must be >= 2, got {modulus}")));
        }
        if let Some(&c) = coeffs.iter().find(|&&c| c >= modulus) {
            return Err(ScaleError::InvalidParam(
                format!("plaintext coefficient {} >= plain_modulus {}", c, modulus)
            ));
        }
        Ok(Self { coeffs, modulus })
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    fn reduce(&mut self) {
        for c in self.coeffs.iter_mut() {
            *c %= self.modulus;
        }
    }

    /// Coefficient-wise addition in Z_t.
    pub fn add(&self, other: &Self) -> Result<Self> {
        if self.len() != other.len() {
            return Err(ScaleError::DimensionMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        if self.modulus != other.modulus {
            return Err(ScaleError::ModulusMismatch);
        }
        let coeffs = self.coeffs.iter()
            .zip(other.coeffs.iter())
            .map(|(&a, &b)| mod_add(a, b, self.modulus))
            .collect();
        Ok(Self { coeffs, modulus: self.modulus })
    }

    pub fn neg(&self) -> Self {
        let coeffs = self.coeffs.iter()
            .map(|&a| mod_neg(a, self.modulus))
            .collect();
        Self { coeffs, modulus: self.modulus }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    /// Signed values under the plaintext centering rule:
    /// [0, ceil(t/2)) stays non-negative, [ceil(t/2), t) maps to c - t.
    pub fn centered_coeffs(&self) -> Vec<i128> {
        let threshold = (self.modulus + 1) >> 1;
        self.coeffs.iter().map(|&c| {
            if c >= threshold {
                c as i128 - self.modulus as i128
            } else {
                c as i128
            }
        }).collect()
    }
}
