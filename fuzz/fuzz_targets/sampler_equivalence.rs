#![no_main]
use ddg::{build_cached, build_encoding, build_matrix, Rational, SequenceBits};
use libfuzzer_sys::fuzz_target;
use std::panic::{catch_unwind, AssertUnwindSafe};

fuzz_target!(|data: (Vec<u8>, Vec<u8>)| {
    let (weight_bytes, bit_bytes) = data;
    if weight_bytes.len() < 2 || bit_bytes.is_empty() {
        return;
    }

    // Small weights keep the derived bit depth (and thus the walk length)
    // manageable while still exercising reduction and back edges.
    let weights: Vec<u32> = weight_bytes.iter().take(8).map(|&b| u32::from(b % 16)).collect();
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return;
    }
    let p: Vec<Rational> = weights
        .iter()
        .map(|&w| Rational::new(i128::from(w), i128::from(total)))
        .collect();

    let matrix = match build_matrix(&p) {
        Ok(m) => m,
        Err(_) => return,
    };
    let encoding = build_encoding(&p).unwrap();
    let cached = build_cached(&p).unwrap();

    let bits: Vec<u8> = bit_bytes
        .iter()
        .take(512)
        .flat_map(|&b| (0..8).rev().map(move |j| (b >> j) & 1))
        .collect();
    let mut s0 = SequenceBits::new(bits.clone());
    let mut s1 = SequenceBits::new(bits.clone());
    let mut s2 = SequenceBits::new(bits);

    loop {
        // Adversarial bits can stretch a single walk past the end of the
        // source; replay sources panic there, which ends the run. All three
        // walks consume bits in lockstep, so if one exhausts they all do.
        let a = match catch_unwind(AssertUnwindSafe(|| matrix.sample(&mut s0))) {
            Ok(a) => a,
            Err(_) => return,
        };
        let b = encoding.sample(&mut s1);
        let c = cached.sample(&mut s2);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(s0.remaining(), s1.remaining());
        assert_eq!(s0.remaining(), s2.remaining());
        if s0.remaining() == 0 {
            return;
        }
    }
});
