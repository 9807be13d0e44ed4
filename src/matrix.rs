//! DDG matrices: generalized binary expansions with exact reduction.
//!
//! Row `i` of a [`DdgMatrix`] is the `(k, l)`-structured binary expansion of
//! `M_i / Zkl`. Construction reduces the allocation to the minimal
//! equivalent `(k, l)` first, so the matrix (and everything derived from it)
//! is canonical for its distribution.

use crate::error::{Error, Result};
use crate::precision::{frac_to_bits, z_kl};

/// Simplify `(M/Zkl | M in Ms)` to lowest terms.
///
/// Returns the reduced numerators with their new `(k, l)`. Reduction is
/// exact and deterministic: a row equal to `Zkl` collapses the whole matrix
/// to the `(1, 0)` singleton; an all-even final column halves every row and
/// shrinks `(k, l)` by one; an all-equal allocation is uniform at a
/// power-of-two denominator.
pub fn reduce_fractions(ms: &[u128], k: u32, l: u32) -> Result<(Vec<u128>, u32, u32)> {
    let zkl = z_kl(k, l);
    if ms.iter().sum::<u128>() != zkl {
        return Err(Error::InvariantViolation(format!(
            "allocation sums to {}, expected Zkl = {}",
            ms.iter().sum::<u128>(),
            zkl
        )));
    }
    if ms.iter().any(|&m| m == zkl) {
        return Ok((ms.iter().map(|&m| m / zkl).collect(), 1, 0));
    }
    if l == 0 {
        return Ok((ms.to_vec(), k, l));
    }
    if ms.iter().all(|&m| m % 2 == 0) {
        let halved: Vec<u128> = ms.iter().map(|&m| m / 2).collect();
        return reduce_fractions(&halved, k - 1, l - 1);
    }
    if ms.iter().all(|&m| m == ms[0]) {
        let remainder = zkl / ms[0];
        if zkl % ms[0] != 0 || !remainder.is_power_of_two() {
            return Err(Error::InvariantViolation(format!(
                "uniform reduction of {} rows over Zkl = {} is not dyadic",
                ms.len(),
                zkl
            )));
        }
        let kp = remainder.trailing_zeros();
        return Ok((vec![1; ms.len()], kp, kp));
    }
    Ok((ms.to_vec(), k, l))
}

/// An `N x k` boolean matrix of generalized binary expansions, reduced to
/// its minimal `(k, l)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DdgMatrix {
    pub(crate) rows: Vec<Vec<u8>>,
    pub(crate) k: u32,
    pub(crate) l: u32,
    /// Surviving 1-based outcome when reduction collapses to the `(1, 0)`
    /// singleton; the matrix alone no longer identifies it.
    pub(crate) degenerate: Option<u32>,
}

impl DdgMatrix {
    /// Build the reduced DDG matrix of `Ms / Zkl`.
    pub fn new(ms: &[u128], k: u32, l: u32) -> Result<Self> {
        if k == 0 || l > k {
            return Err(Error::DomainError(format!(
                "invalid precision parameters k = {k}, l = {l}"
            )));
        }
        let (msp, kp, lp) = reduce_fractions(ms, k, l)?;
        if (kp, lp) == (1, 0) {
            let label = msp
                .iter()
                .position(|&m| m == 1)
                .map(|j| (j + 1) as u32)
                .ok_or_else(|| {
                    Error::InvariantViolation("singleton reduction with no unit row".into())
                })?;
            return Ok(DdgMatrix {
                rows: vec![vec![1]],
                k: 1,
                l: 0,
                degenerate: Some(label),
            });
        }
        let rows = msp.iter().map(|&m| frac_to_bits(m, kp, lp)).collect();
        Ok(DdgMatrix {
            rows,
            k: kp,
            l: lp,
            degenerate: None,
        })
    }

    /// Reconstruct a matrix from raw rows, as read from the text format.
    pub(crate) fn from_rows(rows: Vec<Vec<u8>>, k: u32, l: u32) -> Result<Self> {
        if k == 0 || l > k {
            return Err(Error::DomainError(format!(
                "invalid precision parameters k = {k}, l = {l}"
            )));
        }
        if rows.is_empty() || rows.iter().any(|r| r.len() != k as usize) {
            return Err(Error::Parse("matrix rows do not match bit depth".into()));
        }
        if rows.iter().flatten().any(|&b| b > 1) {
            return Err(Error::Parse("matrix entries must be 0 or 1".into()));
        }
        Ok(DdgMatrix {
            rows,
            k,
            l,
            degenerate: None,
        })
    }

    /// Number of outcomes.
    pub fn n(&self) -> usize {
        self.rows.len()
    }

    /// Bit depth.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Shared prefix length.
    pub fn l(&self) -> u32 {
        self.l
    }

    /// The matrix rows.
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub(crate) fn degenerate_label(&self) -> u32 {
        self.degenerate.unwrap_or(1)
    }
}

/// Precomputed Hamming-weight tables for the O(1)-per-column sampler.
///
/// `h[c]` counts the rows terminating at column `c`; `T[d][c]` is the row
/// index of the `d`-th such terminator, or `-1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HammingCache {
    pub(crate) k: u32,
    pub(crate) l: u32,
    pub(crate) h: Vec<u32>,
    pub(crate) t: Vec<Vec<i64>>,
    pub(crate) degenerate: Option<u32>,
}

impl HammingCache {
    /// Precompute the terminal-row tables of `matrix`.
    pub fn new(matrix: &DdgMatrix) -> Self {
        let n = matrix.n();
        let k = matrix.k as usize;
        let mut h = vec![0u32; k];
        let mut t = vec![vec![-1i64; k]; n];
        for c in 0..k {
            let mut d = 0;
            for r in 0..n {
                if matrix.rows[r][c] == 1 {
                    t[d][c] = r as i64;
                    d += 1;
                }
            }
            h[c] = d as u32;
        }
        HammingCache {
            k: matrix.k,
            l: matrix.l,
            h,
            t,
            degenerate: matrix.degenerate,
        }
    }

    pub(crate) fn from_parts(k: u32, l: u32, h: Vec<u32>, t: Vec<Vec<i64>>) -> Result<Self> {
        if k == 0 || l > k {
            return Err(Error::DomainError(format!(
                "invalid precision parameters k = {k}, l = {l}"
            )));
        }
        if t.is_empty() {
            return Err(Error::Parse("cache has no rows".into()));
        }
        if h.len() != k as usize || t.iter().any(|row| row.len() != k as usize) {
            return Err(Error::Parse("cache tables do not match bit depth".into()));
        }
        let n = t.len();
        // The sampler indexes t[d][c] for every d < h[c] and returns the
        // entry as a row index, so each counted terminal must exist and
        // name a real row.
        for (c, &count) in h.iter().enumerate() {
            if count as usize > n {
                return Err(Error::Parse(format!(
                    "column {c} claims {count} terminals but the table has {n} rows"
                )));
            }
            for d in 0..count as usize {
                let e = t[d][c];
                if e < 0 || e >= n as i64 {
                    return Err(Error::Parse(format!(
                        "terminal entry {e} at ({d}, {c}) is not a row index"
                    )));
                }
            }
        }
        Ok(HammingCache {
            k,
            l,
            h,
            t,
            degenerate: None,
        })
    }

    /// Bit depth.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Shared prefix length.
    pub fn l(&self) -> u32 {
        self.l
    }

    /// Per-column terminal counts.
    pub fn h(&self) -> &[u32] {
        &self.h
    }

    /// Terminal-row table with `-1` sentinels.
    pub fn table(&self) -> &[Vec<i64>] {
        &self.t
    }
}
