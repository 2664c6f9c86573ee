use tracing::instrument;

use crate::error::Result;
use crate::params::ScalingParams;
use crate::ring::modular::{add_with_carry, mul_wide};
use crate::ring::poly::PlainPoly;
use crate::ring::rns::RnsPoly;
use crate::scaling::{check_residues, check_shape, violation};

/// Scale a plaintext by Δ = ⌊Q/t⌋ and accumulate it into `destination`.
///
/// For each of the first `plain_coeff_count` coefficients m and each row j:
/// - m < ceil(t/2): `Δ·m mod q_j`;
/// - m ≥ ceil(t/2): `(Δ·m + (Q mod t)) mod q_j`, which is Δ·(m - t) mod Q,
///   computed as a 128-bit product plus increment and reduced once.
///
/// The scaled value is added to `destination[j][i]` mod q_j. Coefficients at
/// index ≥ `plain_coeff_count` are left untouched. All preconditions are
/// checked before `destination` is modified.
#[instrument(skip_all, fields(
    plain_coeff_count = plain_coeff_count,
    coeff_count = params.coeff_count,
    coeff_mod_count = params.coeff_mod_count()
))]
pub fn encode_scale(
    plain: &[u64],
    plain_coeff_count: usize,
    params: &ScalingParams,
    destination: &mut RnsPoly,
) -> Result<()> {
    if plain_coeff_count > params.coeff_count {
        return Err(violation(format!(
            "plain_coeff_count {} exceeds coeff_count {}",
            plain_coeff_count, params.coeff_count
        )));
    }
    if plain.len() < plain_coeff_count {
        return Err(violation(format!(
            "plaintext holds {} coefficients, {} requested",
            plain.len(), plain_coeff_count
        )));
    }
    let plain = &plain[..plain_coeff_count];
    let t = params.plain_modulus.value();
    if let Some((i, &m)) = plain.iter().enumerate().find(|&(_, &m)| m >= t) {
        return Err(violation(format!("plaintext coefficient {i} = {m} is not below t = {t}")));
    }
    check_shape(destination, params, "destination")?;
    check_residues(destination, params, "destination")?;

    let threshold = params.plain_upper_half_threshold;
    let rows = params.coeff_modulus().iter()
        .zip(&params.coeff_div_plain_modulus)
        .zip(&params.upper_half_increment)
        .zip(destination.rows_mut());

    for (((qj, &delta), &increment), row) in rows {
        for (dst, &m) in row.iter_mut().zip(plain) {
            let scaled = if m >= threshold {
                let [lo, hi] = mul_wide(delta, m);
                let (lo, carry) = add_with_carry(lo, increment, 0);
                qj.reduce_wide([lo, hi + carry as u64])
            } else {
                qj.mul(delta, qj.reduce(m))
            };
            *dst = qj.add(*dst, scaled);
        }
    }
    Ok(())
}

/// Scale `plain` into a fresh zero RNS polynomial.
pub fn encode_plain(plain: &PlainPoly, params: &ScalingParams) -> Result<RnsPoly> {
    if plain.modulus != params.plain_modulus.value() {
        return Err(violation(format!(
            "plaintext modulus {} does not match parameters ({})",
            plain.modulus, params.plain_modulus.value()
        )));
    }
    let mut destination = RnsPoly::zero(params.coeff_count, params.coeff_mod_count());
    encode_scale(&plain.coeffs, plain.len(), params, &mut destination)?;
    Ok(destination)
}
