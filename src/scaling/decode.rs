use tracing::instrument;

use crate::error::Result;
use crate::params::ScalingParams;
use crate::pool::MemoryPool;
use crate::ring::base_conv::BaseConverter;
use crate::ring::poly::PlainPoly;
use crate::ring::rns::RnsPoly;
use crate::scaling::{check_residues, check_shape, violation};

/// Compute `round(t/Q · c) mod t` for every coefficient of `ciphertext`
/// without leaving integer arithmetic.
///
/// 1. Multiply row j by |γ·t|_{q_j}.
/// 2. Fast-convert the chain into {t, γ}.
/// 3. Multiply both auxiliary rows by -Q^{-1}.
/// 4. Read the γ row as a centered value in (-γ/2, γ/2] and remove it from
///    the t row, which leaves a multiple of γ.
/// 5. Multiply by γ^{-1} mod t (skipped when the value is already zero).
///
/// `ciphertext` is used as working space and must be treated as consumed.
/// The scratch rows come from `pool` and go back to it on every exit path.
/// Preconditions are checked before either buffer is touched.
#[instrument(skip_all, fields(
    coeff_count = params.coeff_count,
    coeff_mod_count = params.coeff_mod_count()
))]
pub fn decode_scale(
    ciphertext: &mut RnsPoly,
    params: &ScalingParams,
    base_converter: &BaseConverter,
    destination: &mut [u64],
    pool: &MemoryPool,
) -> Result<()> {
    let n = params.coeff_count;
    check_shape(ciphertext, params, "ciphertext")?;
    check_residues(ciphertext, params, "ciphertext")?;
    if destination.len() < n {
        return Err(violation(format!(
            "destination holds {} coefficients, {} required",
            destination.len(), n
        )));
    }
    if base_converter.coeff_basis().moduli() != params.coeff_modulus()
        || base_converter.plain_modulus() != &params.plain_modulus
    {
        return Err(violation("base converter was built for a different modulus chain".into()));
    }

    // |γ·t|_{q_j} · ct
    let rows = params.coeff_modulus().iter()
        .zip(&base_converter.plain_gamma_product)
        .zip(ciphertext.rows_mut());
    for ((qj, &factor), row) in rows {
        for c in row.iter_mut() {
            *c = qj.mul(*c, factor);
        }
    }

    let mut scratch = pool.allocate(2 * n);
    let (row_t, row_gamma) = scratch.split_at_mut(n);
    base_converter.fast_convert_to_gamma_t_basis(ciphertext, row_t, row_gamma)?;

    let [t, gamma] = &base_converter.plain_gamma_array;
    let [neg_inv_t, neg_inv_gamma] = base_converter.neg_inv_coeff;
    for c in row_t.iter_mut() {
        *c = t.mul(*c, neg_inv_t);
    }
    for c in row_gamma.iter_mut() {
        *c = gamma.mul(*c, neg_inv_gamma);
    }

    let gamma_div_2 = gamma.value() >> 1;
    for ((dst, &zt), &zg) in destination[..n].iter_mut().zip(row_t.iter()).zip(row_gamma.iter()) {
        let combined = if zg > gamma_div_2 {
            // Negative residual: add (γ - zg) rather than subtract (zg - γ).
            t.add(zt, t.reduce(gamma.value() - zg))
        } else {
            t.sub(zt, t.reduce(zg))
        };
        *dst = if combined != 0 {
            t.mul(combined, base_converter.inv_gamma)
        } else {
            0
        };
    }
    Ok(())
}

/// Decode `ciphertext` into a fresh plaintext polynomial.
pub fn decode_plain(
    mut ciphertext: RnsPoly,
    params: &ScalingParams,
    pool: &MemoryPool,
) -> Result<PlainPoly> {
    let mut coeffs = vec![0u64; params.coeff_count];
    decode_scale(&mut ciphertext, params, &params.base_converter, &mut coeffs, pool)?;
    Ok(PlainPoly { coeffs, modulus: params.plain_modulus.value() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScaleError;
    use crate::params::presets::{compact, toy, Q_40, Q_50, Q_55};
    use crate::params::ScalingParamsBuilder;
    use crate::scaling::encode::{encode_plain, encode_scale};
    use num_bigint::BigUint;
    use num_traits::ToPrimitive;

    /// round(t·c / Q) mod t
    fn oracle(c: &BigUint, params: &ScalingParams) -> u64 {
        let q = params.coeff_basis.product();
        let t = params.plain_modulus.value();
        let rounded = (c * t * 2u64 + q) / (q * 2u64);
        (rounded % t).to_u64().unwrap()
    }

    #[test]
    fn test_toy_end_to_end() {
        let params = toy().unwrap();
        let pool = MemoryPool::new();
        let plain = [0u64, 1, 16, 8];

        let mut ct = RnsPoly::zero(4, 1);
        encode_scale(&plain, 4, &params, &mut ct).unwrap();
        let mut out = [0u64; 4];
        decode_scale(&mut ct, &params, &params.base_converter, &mut out, &pool).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn test_compact_roundtrip_all_residues() {
        let params = compact().unwrap();
        let pool = MemoryPool::new();
        let t = params.plain_modulus.value();
        let plain = PlainPoly::from_coeffs((0..params.coeff_count as u64).map(|i| (i * 7) % t).collect(), t);
        let ct = encode_plain(&plain, &params).unwrap();
        assert_eq!(decode_plain(ct, &params, &pool).unwrap(), plain);
    }

    #[test]
    fn test_gamma_correction_boundary() {
        // Small γ with γ·t < Q so every intermediate value W = floor(γ·t·c/Q) is reachable.
        let params = ScalingParamsBuilder::new()
            .coeff_count(4)
            .plain_modulus(17)
            .coeff_moduli(vec![Q_40])
            .gamma(101)
            .build()
            .unwrap();
        let pool = MemoryPool::new();
        let q = params.coeff_basis.product().clone();
        let gamma_t = 101u64 * 17;
        let gamma_div_2 = 101u64 >> 1;

        for (residual, expected) in [(gamma_div_2, 5u64), (gamma_div_2 + 1, 6)] {
            let w = 101 * 5 + residual;
            // smallest c with floor(γ·t·c / Q) = w
            let c: BigUint = (&q * w + gamma_t - 1u64) / gamma_t;
            assert_eq!(&c * gamma_t / &q, BigUint::from(w));
            assert_eq!((&c * gamma_t / &q % 101u64).to_u64().unwrap(), residual);

            let coeffs = vec![c.clone(), BigUint::from(0u64), BigUint::from(0u64), BigUint::from(0u64)];
            let mut ct = RnsPoly::from_biguint_coeffs(&coeffs, &params.coeff_basis);
            let mut out = [u64::MAX; 4];
            decode_scale(&mut ct, &params, &params.base_converter, &mut out, &pool).unwrap();
            assert_eq!(out[0], expected, "residual {residual}");
            assert_eq!(out[0], oracle(&c, &params));
            assert_eq!(&out[1..], &[0, 0, 0]);
        }
    }

    #[test]
    fn test_smallest_accepted_gamma_roundtrips() {
        let build = |gamma| ScalingParamsBuilder::new()
            .coeff_count(16)
            .plain_modulus(17)
            .coeff_moduli(vec![Q_40, Q_50, Q_55])
            .gamma(gamma)
            .build();
        assert!(matches!(build(3), Err(ScaleError::InvalidParam(_))));

        let params = build(13).unwrap();
        let pool = MemoryPool::new();
        let plain = PlainPoly::from_coeffs(vec![3, 8, 13, 1, 6, 11, 16, 4, 9, 14, 2, 7, 12, 0, 5, 10], 17);
        let ct = encode_plain(&plain, &params).unwrap();
        assert_eq!(decode_plain(ct, &params, &pool).unwrap(), plain);
    }

    #[test]
    fn test_zero_preservation() {
        let params = compact().unwrap();
        let pool = MemoryPool::new();
        // Small positive and negative noise around zero decodes to zero.
        let q = params.coeff_basis.product().clone();
        let mut coeffs = vec![BigUint::from(0u64); params.coeff_count];
        coeffs[1] = BigUint::from(3u64);
        coeffs[2] = &q - 3u64;
        let ct = RnsPoly::from_biguint_coeffs(&coeffs, &params.coeff_basis);
        let out = decode_plain(ct, &params, &pool).unwrap();
        assert!(out.is_zero());
    }

    #[test]
    fn test_noisy_values_match_oracle() {
        let params = compact().unwrap();
        let pool = MemoryPool::new();
        let q = params.coeff_basis.product().clone();
        let t = params.plain_modulus.value();
        let delta = &q / t;

        let coeffs: Vec<BigUint> = (0..params.coeff_count as u64)
            .map(|i| {
                let m = i % t;
                let noise = (i * 7919) % 100_000;
                (&delta * m + noise) % &q
            })
            .collect();
        let ct = RnsPoly::from_biguint_coeffs(&coeffs, &params.coeff_basis);
        let out = decode_plain(ct, &params, &pool).unwrap();
        for (i, c) in coeffs.iter().enumerate() {
            assert_eq!(out.coeffs[i], oracle(c, &params), "coefficient {i}");
            assert_eq!(out.coeffs[i], i as u64 % t);
        }
    }

    #[test]
    fn test_scratch_returns_to_pool() {
        let params = toy().unwrap();
        let pool = MemoryPool::new();
        let mut out = [0u64; 4];
        let mut ct = RnsPoly::zero(4, 1);
        decode_scale(&mut ct, &params, &params.base_converter, &mut out, &pool).unwrap();
        assert_eq!(pool.cached_buffers(), 1);
        decode_scale(&mut ct, &params, &params.base_converter, &mut out, &pool).unwrap();
        assert_eq!(pool.cached_buffers(), 1);
    }

    #[test]
    fn test_preconditions_leave_buffers_untouched() {
        let params = toy().unwrap();
        let other = compact().unwrap();
        let pool = MemoryPool::new();
        let q0 = params.coeff_modulus()[0].value();

        let mut short = [7u64; 3];
        let mut ct = RnsPoly::from_rows(vec![vec![1, 2, 3, 4]]).unwrap();
        let err = decode_scale(&mut ct, &params, &params.base_converter, &mut short, &pool).unwrap_err();
        assert!(matches!(err, ScaleError::PrecondViolation(_)));
        assert_eq!(short, [7; 3]);
        assert_eq!(ct.row(0), &[1, 2, 3, 4]);

        let mut out = [7u64; 4];
        let mut wrong_shape = RnsPoly::zero(2, 1);
        assert!(decode_scale(&mut wrong_shape, &params, &params.base_converter, &mut out, &pool).is_err());
        let mut unreduced = RnsPoly::from_rows(vec![vec![q0, 0, 0, 0]]).unwrap();
        assert!(decode_scale(&mut unreduced, &params, &params.base_converter, &mut out, &pool).is_err());
        assert!(decode_scale(&mut ct, &params, &other.base_converter, &mut out, &pool).is_err());
        assert_eq!(out, [7; 4]);
        assert_eq!(pool.cached_buffers(), 0, "no scratch taken on rejected input");
    }
}
