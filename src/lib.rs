//! # Optimal Approximate Sampling (Knuth-Yao DDG)
//!
//! *Entropy-optimal discrete sampling from coin flips, with exact error control.*
//!
//! ## Intuition First
//!
//! Imagine you only have a fair coin and you want to roll a loaded die. Flip the
//! coin a few times and read the flips as a path down a binary tree: left on
//! heads, right on tails. If the leaves of the tree are labeled with die faces
//! in the right proportions, stopping at a leaf rolls the die exactly.
//!
//! Knuth and Yao showed how to build the tree that does this with the *fewest
//! possible* coin flips on average, for any target distribution whose
//! probabilities are dyadic. For everything else, this crate first finds the
//! closest distribution expressible at a chosen bit precision (closest under a
//! statistical divergence you pick), then builds that optimal tree for it.
//!
//! ## The Problem
//!
//! Practical samplers face a trade-off:
//! - **Floating-point inversion**: Fast but silently wrong (rounding error skews
//!   the sampled distribution in ways that are hard to audit).
//! - **Exact rejection samplers**: Correct but entropy-wasteful (they throw away
//!   random bits).
//!
//! ## Historical Context
//!
//! ```text
//! 1976  Knuth & Yao   DDG trees: entropy-optimal sampling from fair bits
//! 1997  Han & Hoshi   Interval algorithm for biased sources
//! 2013  Lumbroso      Optimal discrete uniform generation (Fast Dice Roller)
//! 2020  Saad et al.   Optimal approximate sampling at fixed precision (POPL)
//! ```
//!
//! The key insight of the fixed-precision formulation is number-theoretic: a
//! rational `M / (2^k - 2^l)` has a binary expansion with preperiod `l` and
//! period `k - l`, so the infinite Knuth-Yao tree folds into a finite graph
//! with back edges.
//!
//! ## Mathematical Formulation
//!
//! Given a target distribution $p$ and a precision budget $Z = 2^k - 2^l$, the
//! optimizer finds integers $M_1, \dots, M_n$ with $\sum_i M_i = Z$ minimizing
//!
//! ```text
//! D_f(p, M/Z) = \sum_i q_i f(p_i / q_i),   q_i = M_i / Z
//! ```
//!
//! over a catalog of f-divergences (total variation, Hellinger, chi-square,
//! KL, Jensen-Shannon, ...). The binary expansions of the $M_i / Z$ form a
//! `(k, l)` bit matrix; the DDG tree of that matrix samples $M/Z$ exactly
//! using fewer than $k + 2$ fair bits per draw in expectation.
//!
//! ## Complexity Analysis
//!
//! - **Construction**: $O(n \log n + n k)$ for the optimizer and the tree.
//! - **Sampling**: expected $O(k)$ bit reads per draw; worst case unbounded
//!   but with geometrically vanishing tail.
//! - **Space**: $O(n k)$ for the matrix, $O(2^k)$ worst case for the tree.
//!
//! ## Failure Modes
//!
//! 1. **Insufficient precision**: With divergences that forbid zero mass (for
//!    example KL), a budget $Z < n$ cannot cover the support and construction
//!    fails rather than returning a degenerate answer.
//! 2. **Exhausted bit sources**: Replay sources hold finitely many bits; a
//!    walk that outlives its source panics. Wrap a real RNG for open-ended
//!    sampling.
//!
//! ## Implementation Notes
//!
//! This crate provides three interchangeable sampler forms, all walking the
//! same implicit tree bit for bit:
//! - **Matrix**: samples directly from the `(k, l)` probability bit matrix.
//! - **Encoding**: the tree packed into one flat integer array, one add and
//!   one load per bit.
//! - **Cached**: matrix sampling with precomputed Hamming-weight partial sums.
//!
//! ## References
//!
//! - Knuth, D. E., Yao, A. C. (1976). "The complexity of nonuniform random number generation."
//! - Saad, F. A., Freer, C. E., Rinard, M. C., Mansinghka, V. K. (2020). "Optimal approximate sampling from discrete probability distributions." POPL.
//! - Lumbroso, J. (2013). "Optimal discrete uniform generation from coin flips, and applications."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod construct;
pub mod divergence;
pub mod error;
pub mod flip;
pub mod io;
pub mod matrix;
pub mod opt;
pub mod pack;
pub mod precision;
pub mod sample;
pub mod tree;

/// Exact rational arithmetic used throughout construction.
pub type Rational = num_rational::Ratio<i128>;

pub use construct::{build_cached, build_encoding, build_matrix};
pub use divergence::Divergence;
pub use error::{Error, Result};
pub use flip::{BitSource, BufferedBits, SequenceBits};
pub use matrix::{DdgMatrix, HammingCache};
pub use opt::{optimal_probabilities, optimize};
pub use pack::Encoding;
pub use tree::DdgTree;
