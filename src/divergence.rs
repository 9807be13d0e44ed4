//! f-divergence kernels and generators.
//!
//! Each divergence is a pointwise cost over a (target, approximation)
//! probability pair. The catalog is fixed; every variant carries a
//! generator-form definition `g(t)` with `t = q/p`, and the common ones
//! additionally carry a direct kernel `kernel(p, q)`. Variants without a
//! direct kernel fail with [`Error::UnimplementedKernel`] rather than
//! silently approximating.
//!
//! Definitions follow the standard f-divergence references:
//! - <https://arxiv.org/pdf/math/0505238.pdf>
//! - <https://arxiv.org/pdf/1309.3029.pdf>

use num_traits::{ToPrimitive, Zero};

use crate::error::{Error, Result};
use crate::Rational;

/// The catalog of supported statistical divergences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Divergence {
    /// Total variation distance.
    TotalVariation,
    /// Squared Hellinger divergence.
    Hellinger,
    /// Pearson chi-square divergence.
    PearsonChi2,
    /// Neyman chi-square divergence.
    NeymanChi2,
    /// Triangular discrimination (Vincze-Le Cam).
    Triangular,
    /// Relative entropy (Kullback-Leibler), in bits.
    Kl,
    /// Reverse relative entropy.
    ReverseKl,
    /// Jensen-Shannon divergence.
    JensenShannon,
    /// Jeffrey divergence (symmetric KL); generator form only.
    Jeffrey,
    /// Matern divergence; generator form only.
    Matern,
    /// Alpha divergence; generator form only.
    Alpha,
    /// Quadratic divergence; generator form only.
    Quadratic,
}

impl Divergence {
    /// Every divergence in the catalog, in canonical order.
    pub const ALL: [Divergence; 12] = [
        Divergence::TotalVariation,
        Divergence::Hellinger,
        Divergence::PearsonChi2,
        Divergence::NeymanChi2,
        Divergence::Triangular,
        Divergence::Kl,
        Divergence::ReverseKl,
        Divergence::JensenShannon,
        Divergence::Jeffrey,
        Divergence::Matern,
        Divergence::Alpha,
        Divergence::Quadratic,
    ];

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Divergence::TotalVariation => "Total Variation",
            Divergence::Hellinger => "Hellinger Divergence",
            Divergence::PearsonChi2 => "Pearson Chi-Square",
            Divergence::NeymanChi2 => "Neyman Chi-Square",
            Divergence::Triangular => "Triangular Discrimination",
            Divergence::Kl => "Relative Entropy",
            Divergence::ReverseKl => "Reverse Relative Entropy",
            Divergence::JensenShannon => "Jensen-Shannon",
            Divergence::Jeffrey => "Jeffrey (Symmetric KL)",
            Divergence::Matern => "Matern",
            Divergence::Alpha => "Alpha Divergence",
            Divergence::Quadratic => "Quadratic",
        }
    }

    /// Whether a direct kernel exists for this divergence.
    pub fn is_implemented(self) -> bool {
        !matches!(
            self,
            Divergence::Jeffrey | Divergence::Matern | Divergence::Alpha | Divergence::Quadratic
        )
    }

    /// Direct kernel `kernel(p, q)` over float probabilities.
    ///
    /// Returns `+inf` where the divergence diverges (e.g. KL with
    /// `q = 0, p > 0`) and [`Error::UnimplementedKernel`] for variants
    /// with a generator-form definition only.
    pub fn kernel(self, a: f64, b: f64) -> Result<f64> {
        match self {
            Divergence::TotalVariation => Ok(0.5 * (a - b).abs()),
            Divergence::Hellinger => {
                let d = a.sqrt() - b.sqrt();
                Ok(d * d)
            }
            Divergence::PearsonChi2 => {
                if a == 0.0 {
                    Ok(f64::INFINITY)
                } else if b == 0.0 {
                    Ok(a)
                } else {
                    let d = a - b;
                    Ok(d * d / a)
                }
            }
            Divergence::NeymanChi2 => Divergence::PearsonChi2.kernel(b, a),
            Divergence::Triangular => {
                if a + b == 0.0 {
                    Ok(0.0)
                } else {
                    let d = a - b;
                    Ok(d * d / (a + b))
                }
            }
            Divergence::Kl => {
                if a == 0.0 {
                    Ok(0.0)
                } else if b == 0.0 {
                    Ok(f64::INFINITY)
                } else {
                    Ok(a * (a.log2() - b.log2()))
                }
            }
            Divergence::ReverseKl => Divergence::Kl.kernel(b, a),
            Divergence::JensenShannon => {
                let m = (a + b) / 2.0;
                Ok(Divergence::Kl.kernel(a, m)? + Divergence::Kl.kernel(b, m)?)
            }
            Divergence::Jeffrey
            | Divergence::Matern
            | Divergence::Alpha
            | Divergence::Quadratic => Err(Error::UnimplementedKernel(self.label())),
        }
    }

    /// Kernel over exact rationals.
    ///
    /// The chi-square family and triangular discrimination lose digits to
    /// catastrophic cancellation when `p` and `q` are close; for those the
    /// difference (and sum) is taken in exact rational arithmetic before
    /// any float rounding. All other variants defer to [`Self::kernel`].
    pub fn kernel_exact(self, p: &Rational, q: &Rational) -> Result<f64> {
        match self {
            Divergence::PearsonChi2 => {
                if p.is_zero() {
                    Ok(f64::INFINITY)
                } else if q.is_zero() {
                    Ok(to_f64(p))
                } else {
                    let d = to_f64(&(p.clone() - q.clone()));
                    Ok(d * d / to_f64(p))
                }
            }
            Divergence::NeymanChi2 => Divergence::PearsonChi2.kernel_exact(q, p),
            Divergence::Triangular => {
                let s = p.clone() + q.clone();
                if s.is_zero() {
                    Ok(0.0)
                } else {
                    let d = to_f64(&(p.clone() - q.clone()));
                    Ok(d * d / to_f64(&s))
                }
            }
            _ => self.kernel(to_f64(p), to_f64(q)),
        }
    }

    /// Generator-form definition `g(t)` with `t = q/p`.
    ///
    /// Defined for every variant in the catalog, including those with no
    /// direct kernel.
    pub fn generator(self, t: f64) -> f64 {
        match self {
            Divergence::TotalVariation => 0.5 * (t - 1.0).abs(),
            Divergence::Hellinger => {
                let d = t.sqrt() - 1.0;
                d * d
            }
            Divergence::PearsonChi2 => {
                let d = t - 1.0;
                d * d
            }
            Divergence::NeymanChi2 => {
                if t > 0.0 {
                    let d = 1.0 - t;
                    d * d / t
                } else {
                    f64::INFINITY
                }
            }
            Divergence::Triangular => {
                let d = t - 1.0;
                d * d / (t + 1.0)
            }
            Divergence::Kl => {
                if t > 0.0 {
                    -t.log2()
                } else {
                    f64::INFINITY
                }
            }
            Divergence::ReverseKl => {
                if t > 0.0 {
                    t * t.log2()
                } else {
                    0.0
                }
            }
            Divergence::JensenShannon => {
                Divergence::ReverseKl.generator(t) - (1.0 + t) * ((1.0 + t) / 2.0).log2()
            }
            Divergence::Jeffrey => Divergence::Kl.generator(t) + Divergence::ReverseKl.generator(t),
            Divergence::Matern => {
                if t < 1.0 {
                    let d = t - 1.0;
                    d * d
                } else {
                    0.0
                }
            }
            Divergence::Alpha => {
                const A: f64 = 0.3;
                4.0 / (1.0 - A * A) * (1.0 - t.powf((1.0 + A) / 2.0))
            }
            Divergence::Quadratic => t * t - 1.0,
        }
    }
}

fn to_f64(r: &Rational) -> f64 {
    r.to_f64().unwrap_or(f64::NAN)
}

/// Total divergence between `p` and `q` under the direct kernel, summed
/// over the support of `p`.
pub fn divergence_kernel(p: &[Rational], q: &[Rational], div: Divergence) -> Result<f64> {
    let mut total = 0.0;
    for (a, b) in p.iter().zip(q) {
        if a > &Rational::zero() {
            total += div.kernel_exact(a, b)?;
        }
    }
    Ok(total)
}

/// Total divergence between `p` and `q` under the generator form, summed
/// over the support of `p`.
pub fn divergence_generator(p: &[Rational], q: &[Rational], div: Divergence) -> f64 {
    let mut total = 0.0;
    for (a, b) in p.iter().zip(q) {
        if a > &Rational::zero() {
            let t = to_f64(b) / to_f64(a);
            total += to_f64(a) * div.generator(t);
        }
    }
    total
}
