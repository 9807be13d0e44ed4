//! Buffered random-bit sources.
//!
//! Samplers consume entropy one bit at a time; drawing a full word per bit
//! would waste 31 of every 32. [`BufferedBits`] buffers one word from the
//! underlying generator and hands out its bits most-significant first,
//! refilling exactly when the buffer is exhausted (the lazy scheme of
//! Lumbroso, "Optimal Discrete Uniform Generation from Coin Flips, and
//! Applications", 2013). Each source owns its buffer, so concurrent
//! sampling streams stay independent by construction.

use rand::RngCore;

/// One fair coin flip per call.
pub trait BitSource {
    /// Return the next bit, 0 or 1.
    fn flip(&mut self) -> u8;
}

/// Word width of the buffered source.
const WORD_BITS: u32 = 32;

/// Buffers 32-bit words from an [`RngCore`] generator.
pub struct BufferedBits<R: RngCore> {
    rng: R,
    word: u32,
    pos: u32,
}

impl<R: RngCore> BufferedBits<R> {
    /// Create a source over `rng` with an empty buffer.
    pub fn new(rng: R) -> Self {
        BufferedBits { rng, word: 0, pos: 0 }
    }
}

impl<R: RngCore> BitSource for BufferedBits<R> {
    fn flip(&mut self) -> u8 {
        if self.pos == 0 {
            self.word = self.rng.next_u32();
            self.pos = WORD_BITS;
        }
        self.pos -= 1;
        ((self.word >> self.pos) & 1) as u8
    }
}

/// Replays a fixed bit sequence, for deterministic tests and interop
/// checks.
///
/// Panics when the sequence is exhausted; a replay that runs dry is a
/// test-harness bug, not a recoverable condition.
#[derive(Clone, Debug)]
pub struct SequenceBits {
    bits: Vec<u8>,
    pos: usize,
}

impl SequenceBits {
    /// Replay `bits` in order.
    pub fn new(bits: Vec<u8>) -> Self {
        SequenceBits { bits, pos: 0 }
    }

    /// Replay the `width` low bits of `word`, most significant first.
    pub fn from_word(word: u64, width: u32) -> Self {
        let bits = (0..width).rev().map(|j| ((word >> j) & 1) as u8).collect();
        SequenceBits { bits, pos: 0 }
    }

    /// Bits remaining before the replay runs dry.
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }
}

impl BitSource for SequenceBits {
    fn flip(&mut self) -> u8 {
        let b = self.bits[self.pos];
        self.pos += 1;
        b
    }
}
