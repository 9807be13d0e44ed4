//! End-to-end construction of samplers from an exact target distribution.
//!
//! Each builder takes the target probabilities as exact rationals, derives
//! the unique entropy-optimal bit depth `(k, l)` from the common
//! denominator's binary expansion, and scales the probabilities to integer
//! numerators over `Z(k, l) = 2^k - 2^l`.

use crate::error::{Error, Result};
use crate::matrix::{DdgMatrix, HammingCache};
use crate::pack::Encoding;
use crate::precision::{check_distribution, common_denominator, expansion_length, z_kl};
use crate::tree::DdgTree;
use crate::Rational;

/// Build the DDG matrix whose row `i` is the `(k, l)`-bit binary expansion
/// of `p[i]`.
pub fn build_matrix(p: &[Rational]) -> Result<DdgMatrix> {
    check_distribution(p)?;
    let denom = common_denominator(p);
    let (k, l) = expansion_length(denom)?;
    let z = z_kl(k, l);
    let zi = i128::try_from(z)
        .map_err(|_| Error::DomainError(format!("Z(k={k}, l={l}) exceeds the integer range")))?;
    let ms: Vec<u128> = p
        .iter()
        .map(|q| {
            let scaled = q * Rational::from_integer(zi);
            if !scaled.is_integer() || scaled.numer() < &0 {
                return Err(Error::InvariantViolation(format!(
                    "{q} does not scale to an integer numerator over Z = {z}"
                )));
            }
            Ok(*scaled.numer() as u128)
        })
        .collect::<Result<_>>()?;
    DdgMatrix::new(&ms, k, l)
}

/// Build the packed linear encoding of the DDG tree for `p`.
pub fn build_encoding(p: &[Rational]) -> Result<Encoding> {
    let matrix = build_matrix(p)?;
    let tree = DdgTree::build(&matrix)?;
    Encoding::pack(&tree, matrix.n() as u32, matrix.k())
}

/// Build the Hamming-weight caches for the DDG matrix of `p`.
pub fn build_cached(p: &[Rational]) -> Result<HammingCache> {
    let matrix = build_matrix(p)?;
    Ok(HammingCache::new(&matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flip::SequenceBits;

    fn r(n: i128, d: i128) -> Rational {
        Rational::new(n, d)
    }

    #[test]
    fn test_dyadic_distribution_is_exact() {
        // Denominator 16 = 2^4, so (k, l) = (4, 4) and Z = 16.
        let m = build_matrix(&[r(3, 16), r(12, 16), r(1, 16)]).unwrap();
        assert_eq!((m.k(), m.l()), (4, 4));
        assert_eq!(m.n(), 3);
    }

    #[test]
    fn test_non_dyadic_denominator_picks_periodic_expansion() {
        // ord_10(2): 10 = 2 * 5, ord_5(2) = 4, so (k, l) = (5, 1), Z = 30.
        let m = build_matrix(&[r(1, 10), r(3, 10), r(4, 10), r(2, 10)]).unwrap();
        assert_eq!((m.k(), m.l()), (5, 1));
        let sums: u32 = m.rows().iter().flatten().map(|&b| u32::from(b)).sum();
        assert!(sums > 0);
    }

    #[test]
    fn test_three_forms_agree() {
        let p = [r(1, 10), r(3, 10), r(4, 10), r(2, 10)];
        let matrix = build_matrix(&p).unwrap();
        let enc = build_encoding(&p).unwrap();
        let cache = build_cached(&p).unwrap();

        // A long fixed bit sequence shared by all three walks. Each draw
        // consumes the same bits from every form, so the cursors stay in
        // lockstep across draws.
        let mut state = 0x2545_f491_4f6c_dd1du64;
        let bits: Vec<u8> = (0..1 << 14)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 63) as u8
            })
            .collect();
        let mut s0 = SequenceBits::new(bits.clone());
        let mut s1 = SequenceBits::new(bits.clone());
        let mut s2 = SequenceBits::new(bits);
        while s0.remaining() > 256 {
            let a = matrix.sample(&mut s0);
            let b = enc.sample(&mut s1);
            let c = cache.sample(&mut s2);
            assert_eq!(a, b, "matrix vs encoding diverge");
            assert_eq!(a, c, "matrix vs cached diverge");
            assert_eq!(s0.remaining(), s1.remaining());
            assert_eq!(s0.remaining(), s2.remaining());
        }
    }

    #[test]
    fn test_degenerate_distribution_keeps_its_label() {
        let enc = build_encoding(&[r(0, 1), r(1, 1)]).unwrap();
        let mut s = SequenceBits::from_word(0, 1);
        assert_eq!(enc.sample(&mut s), 2);
    }

    #[test]
    fn test_rejects_non_distribution() {
        assert!(build_matrix(&[r(1, 2), r(1, 3)]).is_err());
        assert!(build_matrix(&[]).is_err());
        assert!(build_matrix(&[r(3, 2), r(-1, 2)]).is_err());
    }
}
