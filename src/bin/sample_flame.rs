use ddg::{build_cached, build_encoding, build_matrix, BufferedBits, Rational};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    let p: Vec<Rational> = [(1, 10), (3, 10), (4, 10), (2, 10)]
        .iter()
        .map(|&(n, d)| Rational::new(n, d))
        .collect();
    let matrix = build_matrix(&p).unwrap();
    let encoding = build_encoding(&p).unwrap();
    let cached = build_cached(&p).unwrap();

    let mut bits = BufferedBits::new(StdRng::seed_from_u64(42));
    let mut counts = [0u64; 4];
    for _ in 0..10_000_000 {
        counts[matrix.sample(&mut bits) as usize - 1] += 1;
        counts[encoding.sample(&mut bits) as usize - 1] += 1;
        counts[cached.sample(&mut bits) as usize - 1] += 1;
    }
    println!("{counts:?}");
}
