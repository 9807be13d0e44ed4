//! Full-pipeline tests: optimize, build, serialize, and draw real samples.

use ddg::{
    build_cached, build_encoding, build_matrix, io, optimal_probabilities, BufferedBits,
    DdgMatrix, Divergence, HammingCache, Rational, SequenceBits,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn r(n: i128, d: i128) -> Rational {
    Rational::new(n, d)
}

/// Draw `n` samples and return per-outcome frequencies (1-based outcomes).
fn frequencies<F: FnMut(&mut BufferedBits<StdRng>) -> u32>(
    outcomes: usize,
    n: usize,
    seed: u64,
    mut draw: F,
) -> Vec<f64> {
    let mut bits = BufferedBits::new(StdRng::seed_from_u64(seed));
    let mut counts = vec![0u64; outcomes];
    for _ in 0..n {
        counts[draw(&mut bits) as usize - 1] += 1;
    }
    counts.iter().map(|&c| c as f64 / n as f64).collect()
}

#[test]
fn test_mass_on_one_outcome_always_samples_it() {
    let m = DdgMatrix::new(&[0, 31], 5, 0).unwrap();
    let enc = build_encoding(&[r(0, 1), r(1, 1)]).unwrap();
    let cache = HammingCache::new(&m);

    for word in 0..32u64 {
        let mut s = SequenceBits::from_word(word, 5);
        assert_eq!(m.sample(&mut s), 2);
        let mut s = SequenceBits::from_word(word, 5);
        assert_eq!(cache.sample(&mut s), 2);
    }
    let mut s = SequenceBits::from_word(0, 1);
    assert_eq!(enc.sample(&mut s), 2);
}

#[test]
fn test_sampled_frequencies_match_target() {
    // p = (3/16, 13/16) is dyadic, so sampling is exact in distribution.
    let p = [r(3, 16), r(13, 16)];
    let matrix = build_matrix(&p).unwrap();
    let encoding = build_encoding(&p).unwrap();

    const DRAWS: usize = 50_000;
    for (seed, freqs) in [
        (7, frequencies(2, DRAWS, 7, |b| matrix.sample(b))),
        (8, frequencies(2, DRAWS, 8, |b| encoding.sample(b))),
    ] {
        assert!(
            (freqs[0] - 0.1875).abs() < 0.01,
            "seed {seed}: outcome 1 frequency {} far from 3/16",
            freqs[0]
        );
        assert!((freqs[1] - 0.8125).abs() < 0.01);
    }
}

#[test]
fn test_periodic_sampler_passes_goodness_of_fit() {
    // p = (3/15, 12/15) has a fully periodic expansion (l = 0), so every
    // draw can traverse the back edge; 10 000 draws must still fit the
    // target under a chi-square test at the 5% level (df = 1, critical
    // value 3.841).
    let p = [r(3, 15), r(12, 15)];
    let matrix = build_matrix(&p).unwrap();
    assert_eq!((matrix.k(), matrix.l()), (4, 0));
    let encoding = build_encoding(&p).unwrap();

    let mut state = 0x853c_49e6_748f_ea9bu64;
    let bits: Vec<u8> = (0..1 << 16)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 63) as u8
        })
        .collect();
    let mut s0 = SequenceBits::new(bits.clone());
    let mut s1 = SequenceBits::new(bits);

    const DRAWS: usize = 10_000;
    let mut counts = [[0u64; 2]; 2];
    for _ in 0..DRAWS {
        counts[0][matrix.sample(&mut s0) as usize - 1] += 1;
        counts[1][encoding.sample(&mut s1) as usize - 1] += 1;
    }
    assert_eq!(counts[0], counts[1]);

    let expected = [DRAWS as f64 * 3.0 / 15.0, DRAWS as f64 * 12.0 / 15.0];
    for observed in counts {
        let chi2: f64 = observed
            .iter()
            .zip(&expected)
            .map(|(&o, e)| (o as f64 - e) * (o as f64 - e) / e)
            .sum();
        assert!(chi2 < 3.841, "chi-square statistic {chi2} rejects the target");
    }
}

#[test]
fn test_optimize_then_sample_pipeline() {
    let target = [r(1, 10), r(3, 10), r(4, 10), r(2, 10)];
    let q = optimal_probabilities(1u128 << 32, &target, Divergence::Hellinger).unwrap();
    assert_eq!(q.iter().sum::<Rational>(), Rational::from_integer(1));

    // The optimal 32-bit approximation is within 2^-32 of the target per
    // outcome, far below sampling noise.
    let encoding = build_encoding(&q).unwrap();
    let cached = build_cached(&q).unwrap();

    const DRAWS: usize = 50_000;
    let freqs = frequencies(4, DRAWS, 11, |b| encoding.sample(b));
    for (f, t) in freqs.iter().zip(&target) {
        let t = *t.numer() as f64 / *t.denom() as f64;
        assert!((f - t).abs() < 0.01, "frequency {f} far from target {t}");
    }
    let freqs = frequencies(4, DRAWS, 12, |b| cached.sample(b));
    for (f, t) in freqs.iter().zip(&target) {
        let t = *t.numer() as f64 / *t.denom() as f64;
        assert!((f - t).abs() < 0.01);
    }
}

#[test]
fn test_serialized_samplers_survive_a_round_trip() {
    let p = [r(1, 10), r(3, 10), r(4, 10), r(2, 10)];
    let matrix = build_matrix(&p).unwrap();
    let encoding = build_encoding(&p).unwrap();
    let cached = build_cached(&p).unwrap();

    let mut buf = Vec::new();
    io::write_matrix(&matrix, &mut buf).unwrap();
    let matrix2 = io::read_matrix(&mut buf.as_slice()).unwrap();

    buf.clear();
    io::write_encoding(&encoding, &mut buf).unwrap();
    let encoding2 = io::read_encoding(&mut buf.as_slice()).unwrap();

    buf.clear();
    io::write_cached(&cached, &mut buf).unwrap();
    let cached2 = io::read_cached(&mut buf.as_slice()).unwrap();

    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    let bits: Vec<u8> = (0..1 << 13)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 63) as u8
        })
        .collect();
    let mut sources: Vec<SequenceBits> = (0..6).map(|_| SequenceBits::new(bits.clone())).collect();
    while sources[0].remaining() > 512 {
        let a = matrix.sample(&mut sources[0]);
        assert_eq!(a, matrix2.sample(&mut sources[1]));
        assert_eq!(a, encoding.sample(&mut sources[2]));
        assert_eq!(a, encoding2.sample(&mut sources[3]));
        assert_eq!(a, cached.sample(&mut sources[4]));
        assert_eq!(a, cached2.sample(&mut sources[5]));
    }
}
