use std::sync::Arc;

use num_traits::ToPrimitive;

use crate::error::{Result, ScaleError};
use crate::ring::modular::{gcd, Modulus};
use crate::ring::rns::{RnsBasis, RnsPoly};

/// γ must be at least this multiple of the chain length.
pub const MIN_GAMMA_PER_MODULUS: u64 = 4;

/// Fast base conversion from the ciphertext basis Q = ∏ q_j into the
/// auxiliary two-modulus basis {t, γ}, plus the constants that the
/// decoding side needs to undo the γ·t pre-scaling and the final division by γ.
#[derive(Clone, Debug)]
pub struct BaseConverter {
    coeff_basis: Arc<RnsBasis>,
    /// [t, γ].
    pub plain_gamma_array: [Modulus; 2],
    /// t·γ mod q_j.
    pub plain_gamma_product: Vec<u64>,
    /// -(Q^{-1}) mod t and mod γ.
    pub neg_inv_coeff: [u64; 2],
    /// γ^{-1} mod t.
    pub inv_gamma: u64,
    /// (Q/q_j) mod t and mod γ, indexed [target][j].
    base_change_matrix: [Vec<u64>; 2],
}

impl BaseConverter {
    pub fn new(coeff_basis: Arc<RnsBasis>, plain_modulus: Modulus, gamma: Modulus) -> Result<Self> {
        let t = plain_modulus.value();
        let g = gamma.value();
        if g & 1 == 0 {
            return Err(ScaleError::InvalidParam(format!("gamma must be odd, got {g}")));
        }
        // The fast conversion overshoots by α·Q with α < k; the γ-rounding
        // only absorbs that while γ/2 stays well above k.
        let min_gamma = MIN_GAMMA_PER_MODULUS * coeff_basis.len() as u64;
        if g < min_gamma {
            return Err(ScaleError::InvalidParam(format!(
                "gamma {g} is below {min_gamma} for {} coefficient moduli",
                coeff_basis.len()
            )));
        }
        if gcd(g, t) != 1 {
            return Err(ScaleError::NotCoprime { a: g, b: t });
        }
        for q in coeff_basis.moduli() {
            if gcd(g, q.value()) != 1 {
                return Err(ScaleError::NotCoprime { a: g, b: q.value() });
            }
        }

        let plain_gamma_array = [plain_modulus, gamma];

        let plain_gamma_product: Vec<u64> = coeff_basis.moduli().iter()
            .map(|q| q.mul(q.reduce(t), q.reduce(g)))
            .collect();

        let mut neg_inv_coeff = [0u64; 2];
        for (slot, m) in neg_inv_coeff.iter_mut().zip(plain_gamma_array.iter()) {
            let q_mod_m = (coeff_basis.product() % m.value())
                .to_u64()
                .ok_or_else(|| ScaleError::InvalidParam("failed to reduce Q".into()))?;
            let inv = m.inv(q_mod_m)
                .ok_or(ScaleError::NotCoprime { a: q_mod_m, b: m.value() })?;
            *slot = m.neg(inv);
        }

        let inv_gamma = plain_modulus.inv(g).ok_or(ScaleError::NotCoprime { a: g, b: t })?;

        let base_change_matrix: [Vec<u64>; 2] = plain_gamma_array.map(|m| {
            (0..coeff_basis.len()).map(|j| coeff_basis.q_star_mod(j, &m)).collect()
        });

        Ok(Self {
            coeff_basis,
            plain_gamma_array,
            plain_gamma_product,
            neg_inv_coeff,
            inv_gamma,
            base_change_matrix,
        })
    }

    pub fn coeff_basis(&self) -> &Arc<RnsBasis> {
        &self.coeff_basis
    }

    pub fn coeff_mod_count(&self) -> usize {
        self.coeff_basis.len()
    }

    pub fn plain_modulus(&self) -> &Modulus {
        &self.plain_gamma_array[0]
    }

    pub fn gamma(&self) -> &Modulus {
        &self.plain_gamma_array[1]
    }

    /// Convert `src` (over the q-chain) into `row_t` (mod t) and `row_gamma` (mod γ):
    ///
    ///   y_m[i] = Σ_j (x_j[i] · (Q/q_j)^{-1} mod q_j) · (Q/q_j)  mod m
    ///
    /// The result is x + α·Q for some α in [0, k); callers absorb α.
    pub fn fast_convert_to_gamma_t_basis(
        &self,
        src: &RnsPoly,
        row_t: &mut [u64],
        row_gamma: &mut [u64],
    ) -> Result<()> {
        let n = src.coeff_count();
        if src.coeff_mod_count() != self.coeff_mod_count() {
            return Err(ScaleError::DimensionMismatch {
                expected: self.coeff_mod_count(),
                got: src.coeff_mod_count(),
            });
        }
        if row_t.len() < n || row_gamma.len() < n {
            return Err(ScaleError::DimensionMismatch {
                expected: n,
                got: row_t.len().min(row_gamma.len()),
            });
        }

        let [t, gamma] = &self.plain_gamma_array;
        let moduli = self.coeff_basis.moduli();
        let q_star_inv = self.coeff_basis.q_star_inv();

        for i in 0..n {
            let mut acc_t = 0u64;
            let mut acc_gamma = 0u64;
            for (j, (qj, row)) in moduli.iter().zip(src.rows()).enumerate() {
                let temp = qj.mul(row[i], q_star_inv[j]);
                acc_t = t.add(acc_t, t.mul(t.reduce(temp), self.base_change_matrix[0][j]));
                acc_gamma = gamma.add(acc_gamma, gamma.mul(gamma.reduce(temp), self.base_change_matrix[1][j]));
            }
            row_t[i] = acc_t;
            row_gamma[i] = acc_gamma;
        }
        Ok(())
    }
}
