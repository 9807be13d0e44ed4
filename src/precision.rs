//! Number-theoretic precision selection and split-radix bit encodings.
//!
//! A target distribution with common denominator `Z0` is representable at
//! bit-depth `k` with shared prefix `l` exactly when `Z0` divides
//! `Zkl = 2^k - 2^l` (or `2^k` when `l = k`). The minimal `(k, l)` is the
//! prefix/period structure of the binary expansion of `1/Z0`, which reduces
//! to the multiplicative order of 2 modulo the odd part of `Z0`.

use num_integer::Integer;
use num_traits::Zero;

use crate::error::{Error, Result};
use crate::Rational;

/// Least `Z` such that every probability is a multiple of `1/Z`.
pub fn common_denominator(probabilities: &[Rational]) -> u128 {
    probabilities
        .iter()
        .fold(1u128, |z, p| z.lcm(&(*p.denom() as u128)))
}

/// Minimal `k` with `2^k = 1 (mod m)`, for odd `m > 1`.
///
/// Trial multiplication; the loop length is the order itself, which divides
/// the Carmichael function of `m`.
pub fn multiplicative_order_2(m: u128) -> Result<u32> {
    if m <= 1 || m % 2 == 0 {
        return Err(Error::DomainError(format!(
            "multiplicative order of 2 requires odd m > 1, got {m}"
        )));
    }
    let mut t = 2 % m;
    let mut k = 1;
    while t != 1 {
        t = (t * 2) % m;
        k += 1;
    }
    Ok(k)
}

/// Length `(k, l)` of the prefix and suffix of the binary expansion of `1/m`.
///
/// `m = 1` is the deterministic singleton, pinned to `(1, 0)`.
pub fn expansion_length(m: u128) -> Result<(u32, u32)> {
    if m == 0 {
        return Err(Error::DomainError("zero denominator".into()));
    }
    if m == 1 {
        return Ok((1, 0));
    }
    if m % 2 == 1 {
        return Ok((multiplicative_order_2(m)?, 0));
    }
    let w = m.trailing_zeros();
    let mp = m >> w;
    if mp == 1 {
        Ok((w, w))
    } else {
        Ok((multiplicative_order_2(mp)? + w, w))
    }
}

/// Denominator of the non-periodic suffix: `2^(k-l) - 1` if `l < k`, else 1.
pub fn z_b(k: u32, l: u32) -> u128 {
    debug_assert!(0 < k && l <= k);
    (1u128 << (k - l)) - u128::from(l < k)
}

/// Achievable denominator at depth `k` with prefix `l`: `2^k - 2^l` if
/// `l < k`, else `2^k`.
pub fn z_kl(k: u32, l: u32) -> u128 {
    debug_assert!(0 < k && l <= k);
    if l < k {
        (1u128 << k) - (1u128 << l)
    } else {
        1u128 << k
    }
}

/// Append the `width`-digit binary expansion of `x`, most significant first.
pub fn encode_binary(x: u128, width: u32, out: &mut Vec<u8>) {
    debug_assert!(width == 128 || x < (1u128 << width.min(127)) || width == 0 && x == 0);
    for j in (0..width).rev() {
        out.push(((x >> j) & 1) as u8);
    }
}

/// Generalized binary expansion of `M / Zkl`: an `l`-bit prefix followed by
/// a `(k-l)`-bit suffix.
pub fn frac_to_bits(m: u128, k: u32, l: u32) -> Vec<u8> {
    debug_assert!(m < z_kl(k, l) || (k == 1 && l == 0));
    let (x, y) = if l == k {
        (m, 0)
    } else if l == 0 {
        (0, m)
    } else {
        let zb = (1u128 << (k - l)) - 1;
        (m / zb, m % zb)
    };
    let mut bits = Vec::with_capacity(k as usize);
    encode_binary(x, l, &mut bits);
    encode_binary(y, k - l, &mut bits);
    bits
}

/// Invert [`frac_to_bits`]: recover `(M, Zkl)` from a `(k, l)`-structured row.
pub fn bits_to_frac(bits: &[u8], k: u32, l: u32) -> (u128, u128) {
    debug_assert_eq!(bits.len(), k as usize);
    let int_of = |bs: &[u8]| bs.iter().fold(0u128, |acc, &b| 2 * acc + u128::from(b));
    let prefix = int_of(&bits[..l as usize]);
    let suffix = int_of(&bits[l as usize..]);
    (z_b(k, l) * prefix + suffix, z_kl(k, l))
}

/// Whether the distribution is a valid probability vector: non-negative
/// entries summing to exactly 1.
pub fn check_distribution(p: &[Rational]) -> Result<()> {
    if p.is_empty() {
        return Err(Error::DomainError("empty target distribution".into()));
    }
    if p.iter().any(|x| x < &Rational::zero()) {
        return Err(Error::DomainError("negative probability".into()));
    }
    let sum = p.iter().fold(Rational::zero(), |acc, x| acc + x.clone());
    if sum != Rational::new(1, 1) {
        return Err(Error::DomainError(format!(
            "target distribution sums to {sum}, expected 1"
        )));
    }
    Ok(())
}
