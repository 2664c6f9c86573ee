//! # bfvscale: exact RNS scaling for BFV
//!
//! Moves polynomials between the plaintext domain (coefficients mod t) and
//! the RNS ciphertext domain (residues over a chain of word-sized primes
//! q_0..q_{k-1}) using only integer arithmetic:
//!
//! - [`scaling::encode_scale`] multiplies a centered plaintext by Δ = ⌊Q/t⌋
//!   and accumulates the result into an RNS polynomial.
//! - [`scaling::decode_scale`] computes round(t/Q · c) mod t through a fast
//!   base conversion into the auxiliary basis {t, γ}.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bfvscale::prelude::*;
//!
//! // t = 17, one 40-bit prime, four coefficients
//! let params = bfvscale::params::presets::toy().unwrap();
//! let pool = MemoryPool::new();
//!
//! let mut ct = RnsPoly::zero(params.coeff_count, params.coeff_mod_count());
//! encode_scale(&[0, 1, 16, 8], 4, &params, &mut ct).unwrap();
//!
//! let mut plain = [0u64; 4];
//! decode_scale(&mut ct, &params, &params.base_converter, &mut plain, &pool).unwrap();
//! assert_eq!(plain, [0, 1, 16, 8]);
//! ```

pub mod error;
pub mod params;
pub mod pool;
pub mod ring;
pub mod scaling;

/// Convenient re-exports for common types and functions.
pub mod prelude {
    pub use crate::error::{Result, ScaleError};
    pub use crate::params::{ScalingParams, ScalingParamsBuilder};
    pub use crate::pool::{MemoryPool, ScopedBuffer};
    pub use crate::ring::{BaseConverter, Modulus, PlainPoly, RnsBasis, RnsPoly};
    pub use crate::scaling::{decode_plain, decode_scale, encode_plain, encode_scale};
}
