pub mod presets;

use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use tracing::debug;

use crate::error::{Result, ScaleError};
use crate::ring::base_conv::BaseConverter;
use crate::ring::modular::{gcd, is_prime, Modulus};
use crate::ring::rns::RnsBasis;

/// Largest auxiliary modulus tried when none is configured: the Mersenne prime 2^61 - 1.
pub const DEFAULT_GAMMA_START: u64 = (1u64 << 61) - 1;

/// Exclusive upper bound on t, every q_j and an explicit γ.
pub const MODULUS_LIMIT: u64 = 1u64 << 63;

/// Parameter context for the scaling-variant transforms.
///
/// Holds the modulus chain, coefficient count, plaintext modulus t and the
/// per-modulus scaling constants, all derived once in
/// [`ScalingParamsBuilder::build`] and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct ScalingParams {
    /// Number of coefficients per polynomial (power of 2).
    pub coeff_count: usize,
    /// Plaintext modulus t.
    pub plain_modulus: Modulus,
    /// RNS basis for the ciphertext modulus Q = ∏ q_j.
    pub coeff_basis: Arc<RnsBasis>,
    /// floor(Q / t) mod q_j.
    pub coeff_div_plain_modulus: Vec<u64>,
    /// (Q mod t) mod q_j, added for centered-negative plaintext coefficients.
    pub upper_half_increment: Vec<u64>,
    /// ceil(t / 2).
    pub plain_upper_half_threshold: u64,
    /// Converter into the auxiliary {t, γ} basis used by decoding.
    pub base_converter: Arc<BaseConverter>,
}

impl ScalingParams {
    pub fn coeff_mod_count(&self) -> usize {
        self.coeff_basis.len()
    }

    pub fn coeff_modulus(&self) -> &[Modulus] {
        self.coeff_basis.moduli()
    }

    pub fn gamma(&self) -> u64 {
        self.base_converter.gamma().value()
    }
}

/// Builder for ScalingParams.
pub struct ScalingParamsBuilder {
    coeff_count: usize,
    plain_modulus: u64,
    coeff_moduli: Vec<u64>,
    gamma: Option<u64>,
}

impl Default for ScalingParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalingParamsBuilder {
    pub fn new() -> Self {
        Self {
            coeff_count: 4096,
            plain_modulus: 65537,
            coeff_moduli: Vec::new(),
            gamma: None, // auto-select
        }
    }

    pub fn coeff_count(mut self, n: usize) -> Self {
        self.coeff_count = n;
        self
    }

    pub fn plain_modulus(mut self, t: u64) -> Self {
        self.plain_modulus = t;
        self
    }

    pub fn coeff_moduli(mut self, moduli: Vec<u64>) -> Self {
        self.coeff_moduli = moduli;
        self
    }

    pub fn gamma(mut self, gamma: u64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn build(self) -> Result<Arc<ScalingParams>> {
        if !self.coeff_count.is_power_of_two() {
            return Err(ScaleError::InvalidRingDegree(self.coeff_count));
        }
        if self.coeff_moduli.is_empty() {
            return Err(ScaleError::InvalidParam("must specify at least one coefficient modulus".into()));
        }
        if self.plain_modulus < 2 {
            return Err(ScaleError::InvalidParam("plaintext modulus must be >= 2".into()));
        }
        let too_large = std::iter::once(self.plain_modulus)
            .chain(self.coeff_moduli.iter().copied())
            .chain(self.gamma)
            .find(|&m| m >= MODULUS_LIMIT);
        if let Some(m) = too_large {
            return Err(ScaleError::InvalidParam(format!("modulus {m} is not below 2^63")));
        }
        let plain_modulus = Modulus::new(self.plain_modulus)?;
        for &q in &self.coeff_moduli {
            if gcd(q, self.plain_modulus) != 1 {
                return Err(ScaleError::NotCoprime { a: q, b: self.plain_modulus });
            }
        }

        let coeff_basis = Arc::new(RnsBasis::new(self.coeff_moduli.clone())?);

        let big_q = coeff_basis.product();
        let t_big = BigUint::from(self.plain_modulus);
        let delta = big_q / &t_big;
        if delta.is_zero() {
            return Err(ScaleError::InvalidParam(
                "coefficient modulus product Q must be >= plaintext modulus t".into(),
            ));
        }
        let remainder = big_q % &t_big;

        let coeff_div_plain_modulus = coeff_basis.decompose(&delta);
        let upper_half_increment = coeff_basis.decompose(&remainder);
        let plain_upper_half_threshold = (self.plain_modulus + 1) >> 1;

        let gamma = match self.gamma {
            Some(g) => g,
            None => select_gamma(self.plain_modulus, &self.coeff_moduli)?,
        };
        let base_converter = Arc::new(BaseConverter::new(
            coeff_basis.clone(),
            plain_modulus,
            Modulus::new(gamma)?,
        )?);

        debug!(
            coeff_count = self.coeff_count,
            coeff_mod_count = coeff_basis.len(),
            plain_modulus = self.plain_modulus,
            gamma,
            q_bits = big_q.bits(),
            delta_mod_t = (&delta % &t_big).to_u64().unwrap_or_default(),
            "built scaling parameters"
        );

        Ok(Arc::new(ScalingParams {
            coeff_count: self.coeff_count,
            plain_modulus,
            coeff_basis,
            coeff_div_plain_modulus,
            upper_half_increment,
            plain_upper_half_threshold,
            base_converter,
        }))
    }
}

/// Largest odd prime <= [`DEFAULT_GAMMA_START`] coprime to t and every q_j.
fn select_gamma(plain_modulus: u64, coeff_moduli: &[u64]) -> Result<u64> {
    let mut candidate = DEFAULT_GAMMA_START;
    while candidate > 2 {
        if is_prime(candidate)
            && gcd(candidate, plain_modulus) == 1
            && coeff_moduli.iter().all(|&q| gcd(candidate, q) == 1)
        {
            return Ok(candidate);
        }
        candidate -= 2;
    }
    Err(ScaleError::InvalidParam("no auxiliary modulus gamma available".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q0: u64 = 1099509805057;
    const Q1: u64 = 562949953443841;

    #[test]
    fn test_constants_single_modulus() {
        let params = ScalingParamsBuilder::new()
            .coeff_count(4)
            .plain_modulus(17)
            .coeff_moduli(vec![Q0])
            .build()
            .unwrap();
        assert_eq!(params.coeff_div_plain_modulus, vec![Q0 / 17]);
        assert_eq!(params.upper_half_increment, vec![Q0 % 17]);
        assert_eq!(params.plain_upper_half_threshold, 9);
        assert_eq!(params.gamma(), DEFAULT_GAMMA_START);
        assert_eq!(params.coeff_mod_count(), 1);
    }

    #[test]
    fn test_delta_uses_full_chain_product() {
        let params = ScalingParamsBuilder::new()
            .coeff_count(16)
            .plain_modulus(257)
            .coeff_moduli(vec![Q0, Q1])
            .build()
            .unwrap();
        let q = BigUint::from(Q0) * BigUint::from(Q1);
        let delta = &q / 257u64;
        let r = &q % 257u64;
        for (j, &qj) in [Q0, Q1].iter().enumerate() {
            assert_eq!(params.coeff_div_plain_modulus[j], (&delta % qj).to_u64().unwrap());
            assert_eq!(params.upper_half_increment[j], (&r % qj).to_u64().unwrap());
        }
        // Δ·t + r = Q ≡ 0 in every row.
        for (j, q) in params.coeff_modulus().iter().enumerate() {
            let dt = q.mul(params.coeff_div_plain_modulus[j], q.reduce(257));
            assert_eq!(q.add(dt, params.upper_half_increment[j]), 0);
        }
    }

    #[test]
    fn test_even_plain_modulus_threshold() {
        let params = ScalingParamsBuilder::new()
            .coeff_count(2)
            .plain_modulus(16)
            .coeff_moduli(vec![Q0])
            .build()
            .unwrap();
        assert_eq!(params.plain_upper_half_threshold, 8);
    }

    #[test]
    fn test_explicit_gamma() {
        let params = ScalingParamsBuilder::new()
            .coeff_count(4)
            .plain_modulus(17)
            .coeff_moduli(vec![Q0])
            .gamma(101)
            .build()
            .unwrap();
        assert_eq!(params.gamma(), 101);
    }

    #[test]
    fn test_gamma_skips_chain_moduli() {
        let g = select_gamma(17, &[DEFAULT_GAMMA_START]).unwrap();
        assert!(g < DEFAULT_GAMMA_START);
        assert!(is_prime(g));
    }

    #[test]
    fn test_build_rejects_bad_params() {
        let base = || ScalingParamsBuilder::new().coeff_count(4).plain_modulus(17);
        assert_eq!(base().coeff_count(6).coeff_moduli(vec![Q0]).build().unwrap_err(),
            ScaleError::InvalidRingDegree(6));
        assert_eq!(base().coeff_count(0).coeff_moduli(vec![Q0]).build().unwrap_err(),
            ScaleError::InvalidRingDegree(0));
        assert!(matches!(base().build(), Err(ScaleError::InvalidParam(_))));
        assert!(matches!(base().plain_modulus(1).coeff_moduli(vec![Q0]).build(), Err(ScaleError::InvalidParam(_))));
        assert!(matches!(base().coeff_moduli(vec![13]).build(), Err(ScaleError::InvalidParam(_))));
        assert!(matches!(base().coeff_moduli(vec![17 * 3]).build(), Err(ScaleError::NotCoprime { .. })));
        assert!(matches!(base().coeff_moduli(vec![Q0, Q0]).build(), Err(ScaleError::NotCoprime { .. })));
        assert!(matches!(base().coeff_moduli(vec![Q0]).gamma(51).build(), Err(ScaleError::NotCoprime { .. })));
        assert!(matches!(base().coeff_moduli(vec![Q0, Q1, 5]).gamma(3).build(), Err(ScaleError::InvalidParam(_))));
    }

    #[test]
    fn test_build_rejects_moduli_above_63_bits() {
        let largest_u64_prime = u64::MAX - 58;
        let base = || ScalingParamsBuilder::new().coeff_count(4).plain_modulus(17);
        assert!(matches!(base().coeff_moduli(vec![largest_u64_prime]).build(), Err(ScaleError::InvalidParam(_))));
        assert!(matches!(
            base().plain_modulus(largest_u64_prime).coeff_moduli(vec![Q0, Q1]).build(),
            Err(ScaleError::InvalidParam(_))
        ));
        assert!(matches!(base().coeff_moduli(vec![Q0]).gamma(MODULUS_LIMIT + 1).build(), Err(ScaleError::InvalidParam(_))));
        // 2^63 - 25 is the largest prime below the limit.
        assert!(base().coeff_moduli(vec![MODULUS_LIMIT - 25]).build().is_ok());
    }
}
