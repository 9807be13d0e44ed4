//! Divergence-minimizing integer allocation.
//!
//! Given a bit budget `Z`, finds numerators `M_i >= 0` with `sum M_i = Z`
//! minimizing `sum kernel(p_i, M_i/Z)`. Three stages: a floor seed with a
//! per-kernel rounding bump, greedy pruning that moves single units of mass
//! from the cheapest decrement to the cheapest increment, and a shortfall
//! pass that restores the exact sum. Zero-probability outcomes are excluded
//! up front and forced to `M_i = 0`.

use num_traits::Zero;

use crate::divergence::Divergence;
use crate::error::{Error, Result};
use crate::Rational;

/// Marginal cost of moving `M` by `delta` (+1 or -1) against target `p`.
/// Moves past the boundary cost `+inf` and are never selected.
fn delta_error(z: u128, p: &Rational, m: u128, delta: i32, div: Divergence) -> Result<f64> {
    if delta < 0 && m == 0 {
        return Ok(f64::INFINITY);
    }
    if delta > 0 && m == z {
        return Ok(f64::INFINITY);
    }
    let m1 = if delta < 0 { m - 1 } else { m + 1 };
    let q1 = Rational::new(m1 as i128, z as i128);
    let q0 = Rational::new(m as i128, z as i128);
    Ok(div.kernel_exact(p, &q1)? - div.kernel_exact(p, &q0)?)
}

/// Indexes of the smallest two items. Requires a non-empty slice; with a
/// single item both indexes coincide.
fn argmin2(xs: &[f64]) -> (usize, usize) {
    let (mut j1, mut m1) = (0usize, f64::INFINITY);
    let (mut j2, mut m2) = (0usize, f64::INFINITY);
    for (ix, &x) in xs.iter().enumerate() {
        if x <= m1 {
            (j2, m2) = (j1, m1);
            (j1, m1) = (ix, x);
        } else if x < m2 {
            (j2, m2) = (ix, x);
        }
    }
    (j1, j2)
}

fn argmin(xs: &[f64]) -> usize {
    argmin2(xs).0
}

fn initial_ms(z: u128, p_target: &[Rational], div: Divergence) -> Result<Vec<u128>> {
    let zq = Rational::new(z as i128, 1);
    let mut ms = Vec::with_capacity(p_target.len());
    for p in p_target {
        let mut m = (p.clone() * zq.clone()).to_integer() as u128;
        // The floor is not always the cheaper side; kernels are not
        // symmetric around it.
        if delta_error(z, p, m, 1, div)? < 0.0 {
            m += 1;
        }
        ms.push(m);
    }
    Ok(ms)
}

/// Lowest-cost decrement/increment pair with distinct indexes: when the
/// single cheapest moves coincide, compare the two mixed second-best pairs.
fn optimal_indexes(errs_dec: &[f64], errs_inc: &[f64]) -> (usize, usize) {
    let (jd0, jd1) = argmin2(errs_dec);
    let (ji0, ji1) = argmin2(errs_inc);
    if jd0 != ji0 {
        (jd0, ji0)
    } else {
        let cost0 = errs_dec[jd0] + errs_inc[ji1];
        let cost1 = errs_dec[jd1] + errs_inc[ji0];
        if cost0 <= cost1 {
            (jd0, ji1)
        } else {
            (jd1, ji0)
        }
    }
}

fn prune(z: u128, p_target: &[Rational], mut ms: Vec<u128>, div: Divergence) -> Result<Vec<u128>> {
    let n = p_target.len();
    if n < 2 {
        return Ok(ms);
    }
    let mut errs_dec = Vec::with_capacity(n);
    let mut errs_inc = Vec::with_capacity(n);
    for (m, p) in ms.iter().zip(p_target) {
        errs_dec.push(delta_error(z, p, *m, -1, div)?);
        errs_inc.push(delta_error(z, p, *m, 1, div)?);
    }
    let (mut jd, mut ji) = optimal_indexes(&errs_dec, &errs_inc);
    // The theoretical bound on required swaps is n; exceeding it means the
    // kernel produced non-monotone marginal costs.
    let maxiter = n + 1;
    let mut iters = 0;
    while errs_dec[jd] + errs_inc[ji] < 0.0 {
        ms[jd] -= 1;
        ms[ji] += 1;
        errs_dec[jd] = delta_error(z, &p_target[jd], ms[jd], -1, div)?;
        errs_inc[ji] = delta_error(z, &p_target[ji], ms[ji], 1, div)?;
        (jd, ji) = optimal_indexes(&errs_dec, &errs_inc);
        iters += 1;
        if iters > maxiter {
            return Err(Error::NumericalInstability(maxiter));
        }
    }
    Ok(ms)
}

fn fix_shortfall(
    z: u128,
    p_target: &[Rational],
    mut ms: Vec<u128>,
    div: Divergence,
) -> Result<Vec<u128>> {
    let sum: u128 = ms.iter().sum();
    let mut shortfall = sum as i128 - z as i128;
    if shortfall == 0 {
        return Ok(ms);
    }
    let delta: i32 = if shortfall < 0 { 1 } else { -1 };
    let mut errs = Vec::with_capacity(ms.len());
    for (m, p) in ms.iter().zip(p_target) {
        errs.push(delta_error(z, p, *m, delta, div)?);
    }
    while shortfall != 0 {
        let j = argmin(&errs);
        if errs[j] == f64::INFINITY {
            // Every remaining move crosses a boundary or a strict-support
            // singularity; the budget cannot carry this support.
            return Err(Error::InsufficientPrecision(format!(
                "bit budget {} cannot represent {} outcomes under {}",
                z,
                p_target.len(),
                div.label()
            )));
        }
        ms[j] = if delta > 0 { ms[j] + 1 } else { ms[j] - 1 };
        errs[j] = delta_error(z, &p_target[j], ms[j], delta, div)?;
        shortfall += i128::from(delta);
    }
    Ok(ms)
}

fn optimize_strict(z: u128, p_target: &[Rational], div: Divergence) -> Result<Vec<u128>> {
    let ms = initial_ms(z, p_target, div)?;
    let ms = prune(z, p_target, ms, div)?;
    let ms = fix_shortfall(z, p_target, ms, div)?;
    debug_assert_eq!(ms.iter().sum::<u128>(), z);
    Ok(ms)
}

/// Optimal numerator allocation over `Z` for `p_target` under `div`.
///
/// Zero-probability entries are forced to `M_i = 0`; the optimization runs
/// on the non-zero support only.
pub fn optimize(z: u128, p_target: &[Rational], div: Divergence) -> Result<Vec<u128>> {
    if z == 0 {
        return Err(Error::DomainError("zero bit budget".into()));
    }
    // Marginal costs are evaluated over signed rationals; a budget past
    // i128 would wrap instead of allocating.
    if i128::try_from(z).is_err() {
        return Err(Error::DomainError(format!(
            "bit budget {z} exceeds the integer range"
        )));
    }
    let nonzero: Vec<(usize, Rational)> = p_target
        .iter()
        .enumerate()
        .filter(|(_, p)| **p > Rational::zero())
        .map(|(i, p)| (i, p.clone()))
        .collect();
    if nonzero.is_empty() {
        return Err(Error::DomainError("target distribution has empty support".into()));
    }
    let values: Vec<Rational> = nonzero.iter().map(|(_, p)| p.clone()).collect();
    let solved = optimize_strict(z, &values, div)?;
    let mut ms = vec![0u128; p_target.len()];
    for ((idx, _), m) in nonzero.iter().zip(solved) {
        ms[*idx] = m;
    }
    Ok(ms)
}

/// Optimal `Z`-type approximation of `p_target`, as exact rationals `M_i/Z`.
pub fn optimal_probabilities(
    z: u128,
    p_target: &[Rational],
    div: Divergence,
) -> Result<Vec<Rational>> {
    let ms = optimize(z, p_target, div)?;
    Ok(ms
        .into_iter()
        .map(|m| Rational::new(m as i128, z as i128))
        .collect())
}
