//! Exact arithmetic in the cyclotomic field ℚ(ζ_N).
//!
//! Every coordinate the verifier touches lives in the real subfield of
//! ℚ(ζ_N) for N = 2·lcm(2, gons): all angles are integer multiples of π/M
//! (N = 2M), so their sines and cosines are ℚ-linear combinations of powers
//! of ζ_N = e^{2πi/N}. Elements are polynomials in ζ_N reduced modulo the
//! N-th cyclotomic polynomial; addition and multiplication are polynomial
//! arithmetic, division is extended Euclid in ℚ[x], and conjugation maps
//! ζ^k to ζ^{N-k}. Zero tests on the reduced representation are exact.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

pub(crate) type Rat = BigRational;

#[inline]
pub(crate) fn rat(n: i64, d: i64) -> Rat {
    Rat::new(BigInt::from(n), BigInt::from(d))
}

/// Field element: coefficients of 1, ζ, ζ², … with trailing zeros trimmed.
/// The empty vector is zero. Reduced representatives are canonical, so
/// equality is coefficient equality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CycNum {
    pub(crate) c: Vec<Rat>,
}

impl CycNum {
    pub(crate) fn zero() -> Self {
        CycNum { c: Vec::new() }
    }

    pub(crate) fn from_rat(r: Rat) -> Self {
        if r.is_zero() {
            Self::zero()
        } else {
            CycNum { c: vec![r] }
        }
    }

    pub(crate) fn from_int(v: i64) -> Self {
        Self::from_rat(Rat::from_integer(BigInt::from(v)))
    }

    #[inline]
    pub(crate) fn is_zero(&self) -> bool {
        self.c.is_empty()
    }

    pub(crate) fn add(&self, other: &CycNum) -> CycNum {
        let mut c = vec![Rat::zero(); self.c.len().max(other.c.len())];
        for (i, v) in self.c.iter().enumerate() {
            c[i] += v;
        }
        for (i, v) in other.c.iter().enumerate() {
            c[i] += v;
        }
        CycNum { c: trim(c) }
    }

    pub(crate) fn sub(&self, other: &CycNum) -> CycNum {
        self.add(&other.neg())
    }

    pub(crate) fn neg(&self) -> CycNum {
        CycNum {
            c: self.c.iter().map(|v| -v).collect(),
        }
    }

    pub(crate) fn scale(&self, r: &Rat) -> CycNum {
        if r.is_zero() {
            return CycNum::zero();
        }
        CycNum {
            c: self.c.iter().map(|v| v * r).collect(),
        }
    }
}

fn trim(mut c: Vec<Rat>) -> Vec<Rat> {
    while c.last().is_some_and(|v| v.is_zero()) {
        c.pop();
    }
    c
}

/// ℚ(ζ_N) with precomputed modulus and reduced powers of ζ.
pub(crate) struct CycField {
    n: usize,
    /// Monic Φ_N over ℚ, little-endian, length degree+1.
    modulus: Vec<Rat>,
    degree: usize,
    /// ζ^k mod Φ_N for k in 0..N.
    zeta: Vec<CycNum>,
}

impl CycField {
    /// Build ℚ(ζ_n). `n` must be divisible by 4 so the field contains i.
    pub(crate) fn new(n: usize) -> Self {
        assert!(n >= 4 && n % 4 == 0, "field order must be a multiple of 4");
        let phi: Vec<Rat> = cyclotomic_int(n)
            .into_iter()
            .map(Rat::from_integer)
            .collect();
        let degree = phi.len() - 1;
        // ζ^{k+1} = shift(ζ^k), reduced as we go.
        let mut zeta = Vec::with_capacity(n);
        zeta.push(CycNum::from_int(1));
        for _ in 1..n {
            let prev = zeta.last().expect("nonempty");
            let mut c = Vec::with_capacity(prev.c.len() + 1);
            c.push(Rat::zero());
            c.extend(prev.c.iter().cloned());
            zeta.push(CycNum {
                c: trim(poly_rem(c, &phi)),
            });
        }
        CycField {
            n,
            modulus: phi,
            degree,
            zeta,
        }
    }

    #[inline]
    pub(crate) fn order(&self) -> usize {
        self.n
    }

    /// ζ^k for any integer exponent.
    pub(crate) fn zeta_pow(&self, k: i64) -> &CycNum {
        &self.zeta[k.rem_euclid(self.n as i64) as usize]
    }

    pub(crate) fn mul(&self, a: &CycNum, b: &CycNum) -> CycNum {
        if a.is_zero() || b.is_zero() {
            return CycNum::zero();
        }
        let mut c = vec![Rat::zero(); a.c.len() + b.c.len() - 1];
        for (i, av) in a.c.iter().enumerate() {
            if av.is_zero() {
                continue;
            }
            for (j, bv) in b.c.iter().enumerate() {
                c[i + j] += av * bv;
            }
        }
        CycNum {
            c: trim(poly_rem(c, &self.modulus)),
        }
    }

    /// Multiplicative inverse by extended Euclid in ℚ[x]. `None` for zero.
    pub(crate) fn inv(&self, a: &CycNum) -> Option<CycNum> {
        if a.is_zero() {
            return None;
        }
        // Invariant: s1·a ≡ r1 (mod Φ).
        let mut r0 = self.modulus.clone();
        let mut r1 = a.c.clone();
        let mut s0: Vec<Rat> = Vec::new();
        let mut s1: Vec<Rat> = vec![Rat::one()];
        while !r1.is_empty() {
            let (q, rem) = poly_divmod(&r0, &r1);
            let s_next = trim(poly_sub(&s0, &poly_mul_plain(&q, &s1)));
            r0 = r1;
            r1 = rem;
            s0 = s1;
            s1 = s_next;
        }
        // Φ_N is irreducible over ℚ, so the gcd is a nonzero constant.
        debug_assert_eq!(r0.len(), 1);
        let g = r0.first()?.clone();
        let inv_g = Rat::one() / g;
        let c = trim(s0.into_iter().map(|v| v * &inv_g).collect());
        Some(CycNum {
            c: trim(poly_rem(c, &self.modulus)),
        })
    }

    pub(crate) fn div(&self, a: &CycNum, b: &CycNum) -> Option<CycNum> {
        Some(self.mul(a, &self.inv(b)?))
    }

    /// Complex conjugation: ζ^k ↦ ζ^{N-k}, a field automorphism.
    pub(crate) fn conj(&self, a: &CycNum) -> CycNum {
        let mut out = CycNum::zero();
        for (k, v) in a.c.iter().enumerate() {
            if v.is_zero() {
                continue;
            }
            out = out.add(&self.zeta_pow(-(k as i64)).scale(v));
        }
        out
    }

    /// The imaginary unit i = ζ^{N/4}.
    pub(crate) fn i(&self) -> &CycNum {
        &self.zeta[self.n / 4]
    }

    /// Real part (z + z̄)/2; stays in the field.
    pub(crate) fn re(&self, z: &CycNum) -> CycNum {
        z.add(&self.conj(z)).scale(&rat(1, 2))
    }

    /// Imaginary part (z - z̄)/(2i) = -i(z - z̄)/2.
    pub(crate) fn im(&self, z: &CycNum) -> CycNum {
        let diff = z.sub(&self.conj(z));
        self.mul(&diff, self.i()).scale(&rat(-1, 2))
    }

    /// Whether conjugation fixes `z`, i.e. `z` represents a real number.
    pub(crate) fn is_real(&self, z: &CycNum) -> bool {
        self.conj(z) == *z
    }

    #[inline]
    pub(crate) fn degree(&self) -> usize {
        self.degree
    }
}

// --- polynomial helpers (little-endian coefficient vectors) ---

fn poly_sub(a: &[Rat], b: &[Rat]) -> Vec<Rat> {
    let mut c = vec![Rat::zero(); a.len().max(b.len())];
    for (i, v) in a.iter().enumerate() {
        c[i] += v;
    }
    for (i, v) in b.iter().enumerate() {
        c[i] -= v;
    }
    c
}

fn poly_mul_plain(a: &[Rat], b: &[Rat]) -> Vec<Rat> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut c = vec![Rat::zero(); a.len() + b.len() - 1];
    for (i, av) in a.iter().enumerate() {
        if av.is_zero() {
            continue;
        }
        for (j, bv) in b.iter().enumerate() {
            c[i + j] += av * bv;
        }
    }
    c
}

/// Remainder of `a` modulo a monic divisor.
fn poly_rem(mut a: Vec<Rat>, m: &[Rat]) -> Vec<Rat> {
    let d = m.len() - 1;
    while a.len() > d {
        let lead = a.pop().expect("nonempty");
        if lead.is_zero() {
            continue;
        }
        let shift = a.len() - d;
        for (i, mv) in m.iter().take(d).enumerate() {
            let delta = &lead * mv;
            a[shift + i] -= delta;
        }
    }
    a
}

/// Quotient and remainder over ℚ[x]; the divisor need not be monic.
fn poly_divmod(a: &[Rat], b: &[Rat]) -> (Vec<Rat>, Vec<Rat>) {
    let b = b.to_vec();
    let db = b.len() - 1;
    let lead_inv = Rat::one() / b.last().expect("nonzero divisor").clone();
    let mut rem: Vec<Rat> = a.to_vec();
    if rem.len() <= db {
        return (Vec::new(), trim(rem));
    }
    let mut quo = vec![Rat::zero(); rem.len() - db];
    while rem.len() > db {
        let lead = rem.pop().expect("nonempty");
        if lead.is_zero() {
            continue;
        }
        let q = lead * &lead_inv;
        let shift = rem.len() - db;
        for (i, bv) in b.iter().take(db).enumerate() {
            let delta = &q * bv;
            rem[shift + i] -= delta;
        }
        quo[shift] = q;
    }
    (trim(quo), trim(rem))
}

/// Integer cyclotomic polynomial Φ_n, little-endian, monic.
///
/// Φ_n = (x^n - 1) / Π_{d|n, d<n} Φ_d, computed over divisors in increasing
/// order; all divisions are exact.
pub(crate) fn cyclotomic_int(n: usize) -> Vec<BigInt> {
    let mut memo: std::collections::HashMap<usize, Vec<BigInt>> = std::collections::HashMap::new();
    for d in 1..=n {
        if n % d != 0 {
            continue;
        }
        // x^d - 1
        let mut num = vec![BigInt::zero(); d + 1];
        num[0] = BigInt::from(-1);
        num[d] = BigInt::one();
        let mut phi = num;
        for (e, other) in &memo {
            if d % e == 0 {
                phi = int_poly_div_exact(&phi, other);
            }
        }
        memo.insert(d, phi);
    }
    memo.remove(&n).expect("n divides n")
}

/// Exact division of integer polynomials (divisor monic, remainder zero).
fn int_poly_div_exact(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let db = b.len() - 1;
    let mut rem: Vec<BigInt> = a.to_vec();
    let mut quo = vec![BigInt::zero(); rem.len() - db];
    while rem.len() > db {
        let lead = rem.pop().expect("nonempty");
        if lead.is_zero() {
            continue;
        }
        let shift = rem.len() - db;
        for (i, bv) in b.iter().take(db).enumerate() {
            let delta = &lead * bv;
            rem[shift + i] -= delta;
        }
        quo[shift] = lead;
    }
    debug_assert!(rem.iter().all(|v| v.is_zero()), "division must be exact");
    quo
}
