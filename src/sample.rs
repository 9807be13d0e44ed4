//! Sampling engines.
//!
//! Three interchangeable decoders over the same `(k, l)` structure: a
//! direct matrix walk, a packed-encoding walk, and a Hamming-cached walk.
//! Driven by the same bit-source state they produce bit-for-bit identical
//! sample sequences; they differ only in speed and memory. Outcomes are
//! 1-based labels.

use crate::flip::BitSource;
use crate::matrix::{DdgMatrix, HammingCache};
use crate::pack::Encoding;

impl DdgMatrix {
    /// Draw one outcome by walking the matrix columns directly.
    ///
    /// Maintains the running difference `d` between the bit path and the
    /// cumulative column entries; a row closing the gap to `-1` is the
    /// sampled outcome. Past the last column the cursor wraps to the
    /// prefix boundary `l`, re-entering the periodic part of the
    /// expansion.
    pub fn sample<S: BitSource>(&self, source: &mut S) -> u32 {
        if self.rows.len() == 1 {
            return self.degenerate_label();
        }
        let k = self.k as usize;
        let l = self.l as usize;
        let mut d: i64 = 0;
        let mut c = 0usize;
        loop {
            let b = i64::from(source.flip());
            d = 2 * d + (1 - b);
            for (r, row) in self.rows.iter().enumerate() {
                d -= i64::from(row[c]);
                if d == -1 {
                    return (r + 1) as u32;
                }
            }
            if c == k - 1 {
                debug_assert!(l < k);
                c = l;
            } else {
                c += 1;
            }
        }
    }
}

impl Encoding {
    /// Draw one outcome by walking the packed encoding: each bit selects
    /// one of the two slots at the cursor, negative slots terminate.
    pub fn sample<S: BitSource>(&self, source: &mut S) -> u32 {
        if self.values.len() == 1 {
            return (-self.values[0]) as u32;
        }
        let mut c = 0usize;
        loop {
            let b = source.flip() as usize;
            c = self.values[c + b] as usize;
            if self.values[c] < 0 {
                return (-self.values[c]) as u32;
            }
        }
    }
}

impl HammingCache {
    /// Draw one outcome using the precomputed terminal tables: `h[c]`
    /// skips past rows that cannot terminate at this column, and `T[d][c]`
    /// resolves the outcome in O(1) instead of scanning rows.
    pub fn sample<S: BitSource>(&self, source: &mut S) -> u32 {
        if self.t.len() == 1 {
            return self.degenerate.unwrap_or(1);
        }
        let k = self.k as usize;
        let l = self.l as usize;
        let mut d: i64 = 0;
        let mut c = 0usize;
        loop {
            let b = i64::from(source.flip());
            d = 2 * d + (1 - b);
            if d < i64::from(self.h[c]) {
                return (self.t[d as usize][c] + 1) as u32;
            }
            d -= i64::from(self.h[c]);
            if c == k - 1 {
                debug_assert!(l < k);
                c = l;
            } else {
                c += 1;
            }
        }
    }
}
