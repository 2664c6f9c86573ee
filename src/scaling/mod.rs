//! Scaling-variant transforms between the plaintext domain (mod t) and the
//! RNS ciphertext domain (mod Q = ∏ q_j).
//!
//! Both transforms are stateless: they read an immutable [`ScalingParams`]
//! and only write the buffers passed in, so one parameter set can be shared
//! across threads.

pub mod decode;
pub mod encode;

pub use decode::{decode_plain, decode_scale};
pub use encode::{encode_plain, encode_scale};

use tracing::warn;

use crate::error::{Result, ScaleError};
use crate::params::ScalingParams;
use crate::ring::rns::RnsPoly;

pub(crate) fn violation(msg: String) -> ScaleError {
    warn!(%msg, "rejected scaling input");
    ScaleError::PrecondViolation(msg)
}

pub(crate) fn check_shape(poly: &RnsPoly, params: &ScalingParams, what: &str) -> Result<()> {
    if poly.coeff_mod_count() != params.coeff_mod_count() || poly.coeff_count() != params.coeff_count {
        return Err(violation(format!(
            "{what} is {}x{}, parameters require {}x{}",
            poly.coeff_mod_count(), poly.coeff_count(),
            params.coeff_mod_count(), params.coeff_count
        )));
    }
    Ok(())
}

pub(crate) fn check_residues(poly: &RnsPoly, params: &ScalingParams, what: &str) -> Result<()> {
    for (j, (q, row)) in params.coeff_modulus().iter().zip(poly.rows()).enumerate() {
        if let Some(i) = row.iter().position(|&c| c >= q.value()) {
            return Err(violation(format!(
                "{what} residue ({j}, {i}) = {} is not below q_{j} = {}",
                row[i], q.value()
            )));
        }
    }
    Ok(())
}
