//! Rigorous fixed-point evaluation of field elements.
//!
//! Values are scaled integers `v ≈ x·10^digits` carrying an explicit error
//! bound `e` in the same scale (|x·10^digits − v| ≤ e). π comes from the
//! Machin formula, sines and cosines from octant-reduced Taylor series; a
//! linear combination of basis powers of ζ is then evaluated with the
//! bounds propagated through every operation. Sign decisions refine the
//! precision until the interval excludes zero; an exact zero never reaches
//! the numeric path because the reduced representation is tested first.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::error::{Result, UnfoldError};

use super::cyclotomic::{CycField, CycNum, Rat};

/// Scaled value with a rigorous absolute error bound (same scale).
#[derive(Clone, Debug)]
pub(crate) struct Approx {
    pub(crate) v: BigInt,
    pub(crate) e: BigInt,
}

impl Approx {
    fn exact(v: BigInt) -> Self {
        Approx {
            v,
            e: BigInt::zero(),
        }
    }

    fn add(&self, other: &Approx) -> Approx {
        Approx {
            v: &self.v + &other.v,
            e: &self.e + &other.e,
        }
    }

    /// Multiply by an exact rational, truncating to the working scale.
    fn mul_rat(&self, r: &Rat) -> Approx {
        Approx {
            v: (&self.v * r.numer()) / r.denom(),
            e: (&self.e * r.numer().abs()) / r.denom() + 1,
        }
    }
}

fn pow10(digits: u32) -> BigInt {
    let mut v = BigInt::one();
    for _ in 0..digits {
        v *= 10;
    }
    v
}

/// Fixed-precision evaluator for one field order, caching π and the
/// trigonometric values of the basis angles 2πk/N.
pub(crate) struct Evaluator {
    scale: BigInt,
    /// π at working scale, error ≤ 2 ulp.
    pi: Approx,
    /// (cos, sin)(2πk/N), lazily filled.
    trig: Vec<Option<(Approx, Approx)>>,
}

impl Evaluator {
    pub(crate) fn new(n: usize, digits: u32) -> Self {
        let scale = pow10(digits);
        let pi = machin_pi(&scale);
        Evaluator {
            scale,
            pi,
            trig: vec![None; n],
        }
    }

    /// Evaluate the real part of `z` (exact for real elements).
    pub(crate) fn eval_re(&mut self, field: &CycField, z: &CycNum) -> Approx {
        let n = field.order();
        let mut acc = Approx::exact(BigInt::zero());
        for (k, coeff) in z.c.iter().enumerate() {
            if coeff.is_zero() {
                continue;
            }
            let (cos_k, _) = self.trig_of(n, k);
            acc = acc.add(&cos_k.mul_rat(coeff));
        }
        acc
    }

    /// Rational snapshot of the real value of `z` at this precision. The
    /// dropped error bound is far below the caller's comparison margin.
    pub(crate) fn eval_rat(&mut self, field: &CycField, z: &CycNum) -> Rat {
        let approx = self.eval_re(field, z);
        Rat::new(approx.v, self.scale.clone())
    }

    /// cos/sin of 2πk/N with octant reduction; results are cached.
    fn trig_of(&mut self, n: usize, k: usize) -> (Approx, Approx) {
        if let Some(pair) = &self.trig[k] {
            return pair.clone();
        }
        let quarter = n / 4;
        let (quadrant, r) = (k / quarter, k % quarter);
        // Reduce to 2πr'/N ≤ π/4, swapping cos/sin when mirrored about π/4.
        let (r_small, swapped) = if 2 * r > quarter {
            (quarter - r, true)
        } else {
            (r, false)
        };
        let alpha = self
            .pi
            .mul_rat(&Rat::new(BigInt::from(2 * r_small as i64), BigInt::from(n as i64)));
        let (c, s) = taylor_cos_sin(&alpha, &self.scale);
        let (c, s) = if swapped { (s, c) } else { (c, s) };
        let neg = |a: &Approx| Approx {
            v: -&a.v,
            e: a.e.clone(),
        };
        let pair = match quadrant {
            0 => (c, s),
            1 => (neg(&s), c),
            2 => (neg(&c), neg(&s)),
            _ => (s, neg(&c)),
        };
        self.trig[k] = Some(pair.clone());
        pair
    }
}

/// π = 16·atan(1/5) − 4·atan(1/239) at the given scale.
fn machin_pi(scale: &BigInt) -> Approx {
    let a = atan_inv(5, scale);
    let b = atan_inv(239, scale);
    Approx {
        v: &a.v * 16 - &b.v * 4,
        e: &a.e * 16 + &b.e * 4 + 2,
    }
}

/// atan(1/x) by the alternating Taylor series, truncating integer division.
fn atan_inv(x: i64, scale: &BigInt) -> Approx {
    let xx = BigInt::from(x * x);
    let mut power = scale / x;
    let mut acc = BigInt::zero();
    let mut k: i64 = 0;
    let mut terms: i64 = 0;
    while !power.is_zero() {
        let term = &power / (2 * k + 1);
        if k % 2 == 0 {
            acc += &term;
        } else {
            acc -= &term;
        }
        power = &power / &xx;
        k += 1;
        terms += 1;
        if term.is_zero() {
            break;
        }
    }
    // Each truncation loses at most one ulp; the tail of the alternating
    // series is below the first dropped term (< 1 ulp).
    Approx {
        v: acc,
        e: BigInt::from(2 * terms + 2),
    }
}

/// cos and sin of a small non-negative angle (≤ π/4) by Taylor series.
fn taylor_cos_sin(alpha: &Approx, scale: &BigInt) -> (Approx, Approx) {
    // α² at scale, truncated.
    let alpha2 = (&alpha.v * &alpha.v) / scale;
    let mut cos_acc = scale.clone();
    let mut sin_acc = alpha.v.clone();
    let mut cos_term = scale.clone();
    let mut sin_term = alpha.v.clone();
    let mut ops: i64 = 2;
    let mut j: i64 = 1;
    loop {
        // cos term: ·(−α²)/((2j−1)(2j)); sin term: ·(−α²)/((2j)(2j+1)).
        cos_term = -((&cos_term * &alpha2) / scale) / ((2 * j - 1) * 2 * j);
        sin_term = -((&sin_term * &alpha2) / scale) / (2 * j * (2 * j + 1));
        cos_acc += &cos_term;
        sin_acc += &sin_term;
        ops += 4;
        if cos_term.is_zero() && sin_term.is_zero() {
            break;
        }
        j += 1;
    }
    // Error: per-op truncations, the sub-ulp series tails, and |sin'|,
    // |cos'| ≤ 1 propagating the argument error directly.
    let e = BigInt::from(ops) + &alpha.e + BigInt::from(2);
    (
        Approx {
            v: cos_acc,
            e: e.clone(),
        },
        Approx { v: sin_acc, e },
    )
}

/// Precision ladder for sign decisions on one field.
pub(crate) struct SignCtx {
    n: usize,
    levels: Vec<Evaluator>,
}

/// Refinement cap. A nonzero element of the field always separates from
/// zero long before this; hitting the cap is surfaced, never ignored.
const MAX_DIGITS: u32 = 40_960;

impl SignCtx {
    pub(crate) fn new(n: usize) -> Self {
        SignCtx {
            n,
            levels: Vec::new(),
        }
    }

    /// Evaluator at ladder level `i` (80·2^i digits), built on demand.
    pub(crate) fn level(&mut self, i: usize) -> &mut Evaluator {
        while self.levels.len() <= i {
            let digits = 80u32 << self.levels.len();
            self.levels.push(Evaluator::new(self.n, digits));
        }
        &mut self.levels[i]
    }

    /// Exact sign of a real field element.
    ///
    /// Zero is decided exactly on the reduced representation; otherwise the
    /// precision doubles until the certified interval excludes zero.
    pub(crate) fn sign(&mut self, field: &CycField, z: &CycNum) -> Result<Ordering> {
        if z.is_zero() {
            return Ok(Ordering::Equal);
        }
        debug_assert!(field.is_real(z), "sign of a non-real element");
        for i in 0.. {
            if (80u32 << i) > MAX_DIGITS {
                break;
            }
            let ev = self.level(i);
            let approx = ev.eval_re(field, z);
            if approx.v.abs() > approx.e {
                return Ok(if approx.v.is_positive() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                });
            }
        }
        Err(UnfoldError::Undecidable(format!(
            "sign of nonzero element not separated within {MAX_DIGITS} digits \
             (degree {} field of order {})",
            field.degree(),
            self.n
        )))
    }
}
