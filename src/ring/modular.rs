use crate::error::{Result, ScaleError};

/// Barrett reduction: compute a mod m using precomputed Barrett constant.
///
/// Barrett constant k = floor(2^64 / m). For moduli ≤ 2^32, the single-word
/// Barrett trick is exact for inputs a < m^2. For larger moduli, we fall back
/// to u128 division (still single-instruction on modern x86-64/aarch64).
#[inline(always)]
pub fn barrett_reduce(a: u128, m: u64, barrett_k: u64) -> u64 {
    if m > (1u64 << 32) {
        (a % m as u128) as u64
    } else {
        // q_hat = (a * k) >> 64
        let q_hat = ((a * barrett_k as u128) >> 64) as u64;
        let r = (a as u64).wrapping_sub(q_hat.wrapping_mul(m));
        // At most one conditional subtraction needed
        if r >= m { r.wrapping_sub(m) } else { r }
    }
}

/// Compute Barrett constant for modulus m: floor(2^64 / m)
#[inline]
pub fn barrett_constant(m: u64) -> u64 {
    assert!(m > 1, "modulus must be > 1");
    ((1u128 << 64) / m as u128) as u64
}

/// 64×64 → 128-bit product, returned as `[lo, hi]`.
#[inline(always)]
pub fn mul_wide(a: u64, b: u64) -> [u64; 2] {
    let p = a as u128 * b as u128;
    [p as u64, (p >> 64) as u64]
}

/// 64 + 64 (+ carry) → 65-bit sum, returned as `(sum, carry_out)`.
#[inline(always)]
pub fn add_with_carry(a: u64, b: u64, carry: u8) -> (u64, u8) {
    let (s, c1) = a.overflowing_add(b);
    let (s, c2) = s.overflowing_add(carry as u64);
    (s, (c1 | c2) as u8)
}

/// Modular addition: (a + b) mod m, assumes a, b < m
#[inline(always)]
pub fn mod_add(a: u64, b: u64, m: u64) -> u64 {
    let sum = a as u128 + b as u128;
    let r = sum as u64;
    if sum >= m as u128 { r.wrapping_sub(m) } else { r }
}

/// Modular subtraction: (a - b) mod m, assumes a, b < m
#[inline(always)]
pub fn mod_sub(a: u64, b: u64, m: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        m - b + a
    }
}

/// Modular negation: (-a) mod m, assumes a < m
#[inline(always)]
pub fn mod_neg(a: u64, m: u64) -> u64 {
    if a == 0 { 0 } else { m - a }
}

/// Modular multiplication: (a * b) mod m using Barrett reduction.
/// Assumes a, b < m.
#[inline(always)]
pub fn mod_mul(a: u64, b: u64, m: u64, barrett_k: u64) -> u64 {
    let product = a as u128 * b as u128;
    barrett_reduce(product, m, barrett_k)
}

/// Modular exponentiation: a^exp mod m
///
/// # Panics
/// If `m < 2` (see [`barrett_constant`]).
pub fn mod_pow(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let bk = barrett_constant(m);
    let mut result = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mod_mul(result, base, m, bk);
        }
        exp >>= 1;
        base = mod_mul(base, base, m, bk);
    }
    result
}

/// Find modular inverse: a^{-1} mod m using extended Euclidean algorithm
pub fn mod_inv(a: u64, m: u64) -> Option<u64> {
    let (mut old_r, mut r) = (a as i128, m as i128);
    let (mut old_s, mut s) = (1i128, 0i128);

    while r != 0 {
        let q = old_r / r;
        let tmp = r;
        r = old_r - q * r;
        old_r = tmp;
        let tmp = s;
        s = old_s - q * s;
        old_s = tmp;
    }

    if old_r != 1 {
        return None;
    }

    Some(((old_s % m as i128 + m as i128) % m as i128) as u64)
}

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Deterministic Miller-Rabin; the first twelve prime bases cover all of u64.
pub fn is_prime(n: u64) -> bool {
    const BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    if n < 2 {
        return false;
    }
    for &p in &BASES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d & 1 == 0 {
        d >>= 1;
        s += 1;
    }

    let bk = barrett_constant(n);
    'witness: for &a in &BASES {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mod_mul(x, x, n, bk);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// A word-sized modulus with its Barrett constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Modulus {
    value: u64,
    barrett_k: u64,
}

impl Modulus {
    pub fn new(value: u64) -> Result<Self> {
        if value < 2 {
            return Err(ScaleError::InvalidParam(format!("modulus must be >= 2, got {value}")));
        }
        Ok(Self { value, barrett_k: barrett_constant(value) })
    }

    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[inline(always)]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        mod_add(a, b, self.value)
    }

    #[inline(always)]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        mod_sub(a, b, self.value)
    }

    #[inline(always)]
    pub fn neg(&self, a: u64) -> u64 {
        mod_neg(a, self.value)
    }

    #[inline(always)]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        mod_mul(a, b, self.value, self.barrett_k)
    }

    /// Reduce an arbitrary word.
    #[inline(always)]
    pub fn reduce(&self, a: u64) -> u64 {
        if a < self.value { a } else { a % self.value }
    }

    /// Reduce a 128-bit value given as `[lo, hi]`. Exact for every input.
    #[inline(always)]
    pub fn reduce_wide(&self, a: [u64; 2]) -> u64 {
        let wide = a[0] as u128 | ((a[1] as u128) << 64);
        if self.value <= (1u64 << 32) && a[1] != 0 {
            // Fold the high word first so the Barrett input stays below m^2.
            let hi = barrett_reduce(a[1] as u128, self.value, self.barrett_k);
            let lo = barrett_reduce(a[0] as u128, self.value, self.barrett_k);
            let two_64 = ((1u128 << 64) % self.value as u128) as u64;
            return self.add(self.mul(hi, two_64), lo);
        }
        barrett_reduce(wide, self.value, self.barrett_k)
    }

    pub fn inv(&self, a: u64) -> Option<u64> {
        mod_inv(self.reduce(a), self.value)
    }
}
