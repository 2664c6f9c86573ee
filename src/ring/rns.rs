use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::{Result, ScaleError};
use crate::ring::modular::{gcd, Modulus};

/// Stores precomputed data for an RNS basis.
#[derive(Clone, Debug)]
pub struct RnsBasis {
    moduli: Vec<Modulus>,
    /// Q = ∏ q_i.
    product: BigUint,
    /// q_star_inv_i = (Q/q_i)^{-1} mod q_i.
    q_star_inv: Vec<u64>,
}

impl RnsBasis {
    /// Create a new RNS basis from pairwise coprime moduli.
    pub fn new(moduli: Vec<u64>) -> Result<Self> {
        if moduli.is_empty() {
            return Err(ScaleError::InvalidParam("RNS basis needs at least one modulus".into()));
        }
        for (i, &qi) in moduli.iter().enumerate() {
            for &qj in &moduli[i + 1..] {
                if gcd(qi, qj) != 1 {
                    return Err(ScaleError::NotCoprime { a: qi, b: qj });
                }
            }
        }
        let moduli = moduli.into_iter()
            .map(Modulus::new)
            .collect::<Result<Vec<_>>>()?;

        let mut product = BigUint::one();
        for q in &moduli {
            product *= q.value();
        }

        let q_star_inv = moduli.iter().enumerate().map(|(i, qi)| {
            let mut prod = 1u64;
            for (j, qj) in moduli.iter().enumerate() {
                if i != j {
                    prod = qi.mul(prod, qi.reduce(qj.value()));
                }
            }
            qi.inv(prod).ok_or(ScaleError::NotCoprime { a: prod, b: qi.value() })
        }).collect::<Result<Vec<_>>>()?;

        Ok(Self { moduli, product, q_star_inv })
    }

    pub fn len(&self) -> usize {
        self.moduli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moduli.is_empty()
    }

    pub fn moduli(&self) -> &[Modulus] {
        &self.moduli
    }

    pub fn product(&self) -> &BigUint {
        &self.product
    }

    /// (Q/q_i)^{-1} mod q_i for each i.
    pub fn q_star_inv(&self) -> &[u64] {
        &self.q_star_inv
    }

    /// Q/q_i reduced modulo an arbitrary target modulus.
    pub fn q_star_mod(&self, i: usize, target: &Modulus) -> u64 {
        self.moduli.iter().enumerate()
            .filter(|&(j, _)| j != i)
            .fold(1u64, |acc, (_, qj)| target.mul(acc, target.reduce(qj.value())))
    }

    /// Residues of `x` modulo each q_i.
    pub fn decompose(&self, x: &BigUint) -> Vec<u64> {
        self.moduli.iter()
            .map(|q| (x % q.value()).to_u64().unwrap_or_default())
            .collect()
    }

    /// CRT reconstruction into [0, Q).
    pub fn compose(&self, residues: &[u64]) -> Result<BigUint> {
        if residues.len() != self.len() {
            return Err(ScaleError::DimensionMismatch { expected: self.len(), got: residues.len() });
        }
        let mut x = BigUint::zero();
        for (i, (q, &r)) in self.moduli.iter().zip(residues).enumerate() {
            let t = q.mul(q.reduce(r), self.q_star_inv[i]);
            x += (&self.product / q.value()) * t;
        }
        Ok(x % &self.product)
    }
}

/// Polynomial in RNS (Residue Number System) representation.
///
/// Row-major arena of `coeff_mod_count × coeff_count` words: row j holds the
/// coefficients reduced modulo q_j. The shape is fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RnsPoly {
    data: Vec<u64>,
    coeff_count: usize,
    coeff_mod_count: usize,
}

impl RnsPoly {
    /// Create a zero polynomial in RNS.
    pub fn zero(coeff_count: usize, coeff_mod_count: usize) -> Self {
        Self {
            data: vec![0u64; coeff_count * coeff_mod_count],
            coeff_count,
            coeff_mod_count,
        }
    }

    /// Build from one residue vector per modulus; all rows must share a length.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self> {
        let coeff_mod_count = rows.len();
        let coeff_count = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(coeff_count * coeff_mod_count);
        for row in rows {
            if row.len() != coeff_count {
                return Err(ScaleError::DimensionMismatch { expected: coeff_count, got: row.len() });
            }
            data.extend_from_slice(&row);
        }
        Ok(Self { data, coeff_count, coeff_mod_count })
    }

    /// Reduce integer coefficients into every modulus of `basis`.
    pub fn from_biguint_coeffs(coeffs: &[BigUint], basis: &RnsBasis) -> Self {
        let mut poly = Self::zero(coeffs.len(), basis.len());
        for (i, c) in coeffs.iter().enumerate() {
            for (j, r) in basis.decompose(c).into_iter().enumerate() {
                poly.data[j * poly.coeff_count + i] = r;
            }
        }
        poly
    }

    /// CRT-reconstruct every coefficient into [0, Q).
    pub fn to_biguint_coeffs(&self, basis: &RnsBasis) -> Result<Vec<BigUint>> {
        if self.coeff_mod_count != basis.len() {
            return Err(ScaleError::DimensionMismatch {
                expected: basis.len(),
                got: self.coeff_mod_count,
            });
        }
        let mut residues = vec![0u64; self.coeff_mod_count];
        (0..self.coeff_count).map(|i| {
            for (j, r) in residues.iter_mut().enumerate() {
                *r = self.data[j * self.coeff_count + i];
            }
            basis.compose(&residues)
        }).collect()
    }

    pub fn coeff_count(&self) -> usize {
        self.coeff_count
    }

    pub fn coeff_mod_count(&self) -> usize {
        self.coeff_mod_count
    }

    /// Residues modulo q_j. Panics if `j` is out of range.
    pub fn row(&self, j: usize) -> &[u64] {
        &self.data[j * self.coeff_count..(j + 1) * self.coeff_count]
    }

    /// Mutable residues modulo q_j. Panics if `j` is out of range.
    pub fn row_mut(&mut self, j: usize) -> &mut [u64] {
        &mut self.data[j * self.coeff_count..(j + 1) * self.coeff_count]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        // chunks_exact(0) panics; an empty poly has no rows either way.
        self.data.chunks_exact(self.coeff_count.max(1)).take(self.coeff_mod_count)
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u64]> {
        let n = self.coeff_count.max(1);
        let k = self.coeff_mod_count;
        self.data.chunks_exact_mut(n).take(k)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<u64> {
        self.check_index(row, col)?;
        Ok(self.data[row * self.coeff_count + col])
    }

    pub fn set(&mut self, row: usize, col: usize, value: u64) -> Result<()> {
        self.check_index(row, col)?;
        self.data[row * self.coeff_count + col] = value;
        Ok(())
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.coeff_mod_count || col >= self.coeff_count {
            return Err(ScaleError::PrecondViolation(format!(
                "index ({row}, {col}) out of bounds for {}x{} RNS polynomial",
                self.coeff_mod_count, self.coeff_count
            )));
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.data
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&c| c == 0)
    }
}
