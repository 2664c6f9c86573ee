use std::sync::Arc;
use crate::error::Result;
use crate::params::{ScalingParams, ScalingParamsBuilder};

/// 40-bit NTT prime: 1099509805057 ≡ 1 (mod 2048)
pub const Q_40: u64 = 1099509805057;
/// 50-bit NTT prime: 562949953443841 ≡ 1 (mod 2048)
pub const Q_50: u64 = 562949953443841;
/// 55-bit prime: 18014398509998081
pub const Q_55: u64 = 18014398509998081;
/// 60-bit NTT prime: 1152921504606830593 ≡ 1 (mod 8192)
pub const Q_60: u64 = 1152921504606830593;

/// Tiny parameters for worked examples: t=17, one 40-bit prime, 4 coefficients.
pub fn toy() -> Result<Arc<ScalingParams>> {
    ScalingParamsBuilder::new()
        .coeff_count(4)
        .plain_modulus(17)
        .coeff_moduli(vec![Q_40])
        .build()
}

/// Compact parameters for fast tests: n=1024, t=257, Q ≈ 2^90 over two primes.
pub fn compact() -> Result<Arc<ScalingParams>> {
    ScalingParamsBuilder::new()
        .coeff_count(1024)
        .plain_modulus(257)
        .coeff_moduli(vec![Q_40, Q_50])
        .build()
}

/// n=4096, t=65537, Q ≈ 2^165 over three primes.
pub fn wide() -> Result<Arc<ScalingParams>> {
    ScalingParamsBuilder::new()
        .coeff_count(4096)
        .plain_modulus(65537)
        .coeff_moduli(vec![Q_50, Q_55, Q_60])
        .build()
}
