//! Whitespace-delimited text interchange for the three sampler forms.
//!
//! Formats are token streams compatible with the companion native reader:
//! headers first, then arrays prefixed with their length and matrices
//! prefixed with their dimensions.
//!
//! - encoding file: `N K` then `<len> v0 .. v_{len-1}`
//! - matrix file: `K L` then `N K` then `N` rows of `K` 0/1 entries
//! - cached file: `K L` then the `h` array, then the `T` matrix (with its
//!   `-1` sentinels written literally)

use std::io::{BufRead, Write};

use crate::error::{Error, Result};
use crate::matrix::{DdgMatrix, HammingCache};
use crate::pack::Encoding;

/// Write a packed encoding.
pub fn write_encoding<W: Write>(enc: &Encoding, w: &mut W) -> Result<()> {
    writeln!(w, "{} {}", enc.n(), enc.k())?;
    write_array(enc.values(), w)?;
    Ok(())
}

/// Read a packed encoding.
pub fn read_encoding<R: BufRead>(r: &mut R) -> Result<Encoding> {
    let mut tokens = Tokens::read_from(r)?;
    let n: u32 = tokens.next("outcome count")?;
    let k: u32 = tokens.next("bit depth")?;
    let values = tokens.array::<i64>("encoding")?;
    Encoding::from_parts(values, n, k)
}

/// Write a DDG matrix.
pub fn write_matrix<W: Write>(matrix: &DdgMatrix, w: &mut W) -> Result<()> {
    writeln!(w, "{} {}", matrix.k(), matrix.l())?;
    write_grid(matrix.rows(), w)?;
    Ok(())
}

/// Read a DDG matrix.
pub fn read_matrix<R: BufRead>(r: &mut R) -> Result<DdgMatrix> {
    let mut tokens = Tokens::read_from(r)?;
    let k: u32 = tokens.next("bit depth")?;
    let l: u32 = tokens.next("prefix length")?;
    let rows = tokens.grid::<u8>("matrix")?;
    DdgMatrix::from_rows(rows, k, l)
}

/// Write a Hamming cache.
pub fn write_cached<W: Write>(cache: &HammingCache, w: &mut W) -> Result<()> {
    writeln!(w, "{} {}", cache.k(), cache.l())?;
    write_array(cache.h(), w)?;
    write_grid(cache.table(), w)?;
    Ok(())
}

/// Read a Hamming cache.
pub fn read_cached<R: BufRead>(r: &mut R) -> Result<HammingCache> {
    let mut tokens = Tokens::read_from(r)?;
    let k: u32 = tokens.next("bit depth")?;
    let l: u32 = tokens.next("prefix length")?;
    let h = tokens.array::<u32>("hamming vector")?;
    let t = tokens.grid::<i64>("hamming table")?;
    HammingCache::from_parts(k, l, h, t)
}

fn write_array<W: Write, T: std::fmt::Display>(values: &[T], w: &mut W) -> Result<()> {
    write!(w, "{} ", values.len())?;
    let joined: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    writeln!(w, "{}", joined.join(" "))?;
    Ok(())
}

fn write_grid<W: Write, T: std::fmt::Display>(rows: &[Vec<T>], w: &mut W) -> Result<()> {
    let ncols = rows.first().map_or(0, Vec::len);
    writeln!(w, "{} {}", rows.len(), ncols)?;
    for row in rows {
        let joined: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(w, "{}", joined.join(" "))?;
    }
    Ok(())
}

/// Cursor over the whitespace-delimited tokens of an input stream.
struct Tokens {
    tokens: Vec<String>,
    pos: usize,
}

impl Tokens {
    fn read_from<R: BufRead>(r: &mut R) -> Result<Self> {
        let mut text = String::new();
        r.read_to_string(&mut text)?;
        let tokens = text.split_whitespace().map(String::from).collect();
        Ok(Tokens { tokens, pos: 0 })
    }

    fn next<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| Error::Parse(format!("unexpected end of input reading {what}")))?;
        self.pos += 1;
        token
            .parse()
            .map_err(|_| Error::Parse(format!("bad token {token:?} reading {what}")))
    }

    /// Length-prefixed array.
    fn array<T: std::str::FromStr>(&mut self, what: &str) -> Result<Vec<T>> {
        let len: usize = self.next(what)?;
        (0..len).map(|_| self.next(what)).collect()
    }

    /// Dimension-prefixed matrix.
    fn grid<T: std::str::FromStr>(&mut self, what: &str) -> Result<Vec<Vec<T>>> {
        let nrows: usize = self.next(what)?;
        let ncols: usize = self.next(what)?;
        (0..nrows)
            .map(|_| (0..ncols).map(|_| self.next(what)).collect())
            .collect()
    }
}
