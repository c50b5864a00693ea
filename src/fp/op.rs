// Exact ARM floating-point semantics on raw encodings.
//
// Every routine computes the round-to-nearest result on the host, derives the sign of
// the rounding error with an error-free transformation on power-of-two scaled operands, and
// then applies the FPCR rounding mode, flush-to-zero and default-NaN controls on top of it.
// Status bits accumulate into the FPSR passed in.

use std::cmp::Ordering;

use super::info::{self, FPInfo};
use super::{FPExc, RoundingMode, FPCR, FPSR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FPType {
    Zero,
    Nonzero,
    Infinity,
    QNaN,
    SNaN,
}

impl FPType {
    fn is_nan(self) -> bool {
        matches!(self, FPType::QNaN | FPType::SNaN)
    }
}

struct Unpacked<F> {
    ty: FPType,
    sign: bool,
    value: F,
}

impl<F: FPInfo> Unpacked<F> {
    fn is_zero(&self) -> bool { self.ty == FPType::Zero }
    fn is_inf(&self) -> bool { self.ty == FPType::Infinity }
}

// ---------------------------------------------------------------------------
// Classification, NaN propagation and rounding
// ---------------------------------------------------------------------------

fn unpack<F: FPInfo>(bits: u64, fpcr: FPCR, fpsr: &mut FPSR) -> Unpacked<F> {
    let sign = info::sign_bit::<F>(bits);
    let exponent = bits & F::EXPONENT_MASK;
    let mantissa = bits & F::MANTISSA_MASK;

    let ty = if exponent == 0 {
        if mantissa == 0 {
            FPType::Zero
        } else if fpcr.fz() {
            fpsr.set(FPExc::IDC);
            return Unpacked { ty: FPType::Zero, sign, value: F::from_raw(info::zero::<F>(sign)) };
        } else {
            FPType::Nonzero
        }
    } else if exponent == F::EXPONENT_MASK {
        if mantissa == 0 {
            FPType::Infinity
        } else if mantissa & F::QUIET_BIT != 0 {
            FPType::QNaN
        } else {
            FPType::SNaN
        }
    } else {
        FPType::Nonzero
    };

    Unpacked { ty, sign, value: F::from_raw(bits) }
}

fn process_nan<F: FPInfo>(ty: FPType, bits: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let mut result = bits;
    if ty == FPType::SNaN {
        result |= F::QUIET_BIT;
        fpsr.set(FPExc::IOC);
    }
    if fpcr.dn() {
        F::DEFAULT_NAN
    } else {
        result
    }
}

/// Signalling NaNs take priority over quiet ones; ties go to the earlier operand.
fn process_nans<F: FPInfo>(ops: &[(FPType, u64)], fpcr: FPCR, fpsr: &mut FPSR) -> Option<u64> {
    let pick = ops
        .iter()
        .find(|(ty, _)| *ty == FPType::SNaN)
        .or_else(|| ops.iter().find(|(ty, _)| *ty == FPType::QNaN))?;
    Some(process_nan::<F>(pick.0, pick.1, fpcr, fpsr))
}

fn invalid<F: FPInfo>(fpsr: &mut FPSR) -> u64 {
    fpsr.set(FPExc::IOC);
    F::DEFAULT_NAN
}

/// Sign of `exact - rounded`, given the error term.
fn error_order<F: FPInfo>(error: F) -> Ordering {
    if error > F::ZERO {
        Ordering::Greater
    } else if error < F::ZERO {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

fn pow2<F: FPInfo>(exp: i64) -> F {
    F::from_raw(((F::EXPONENT_BIAS + exp) as u64) << F::MANTISSA_WIDTH)
}

/// Unbiased exponent of a nonzero finite value, subnormals included.
fn exponent_of<F: FPInfo>(x: F) -> i64 {
    let bits = x.to_raw();
    let field = ((bits & F::EXPONENT_MASK) >> F::MANTISSA_WIDTH) as i64;
    if field != 0 {
        return field - F::EXPONENT_BIAS;
    }
    let top = 63 - (bits & F::MANTISSA_MASK).leading_zeros() as i64;
    top - F::MANTISSA_WIDTH as i64 + 1 - F::EXPONENT_BIAS
}

/// `x * 2^n`, exact as long as the result is a normal number.
///
/// Steps stay within the normal exponent range, so intermediates move monotonically from `x`
/// toward the result and never round.
fn scale<F: FPInfo>(mut x: F, mut n: i64) -> F {
    let step = F::EXPONENT_BIAS - 1;
    while n > step {
        x = x * pow2::<F>(step);
        n -= step;
    }
    while n < -step {
        x = x * pow2::<F>(-step);
        n += step;
    }
    x * pow2::<F>(n)
}

/// Splits a nonzero finite value into a significand in [1, 2) and its exponent.
fn normalize<F: FPInfo>(x: F) -> (F, i64) {
    let exp = exponent_of(x);
    (scale(x, -exp), exp)
}

/// Lowest product exponent for which the error terms of `a * b + c` stay clear of the
/// subnormal range.
fn min_exact_product_exponent<F: FPInfo>() -> i64 {
    1 - F::EXPONENT_BIAS + 2 * F::MANTISSA_WIDTH as i64 + 4
}

fn two_sum<F: FPInfo>(a: F, b: F) -> (F, F) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

fn overflow<F: FPInfo>(sign: bool, mode: RoundingMode, fpsr: &mut FPSR) -> u64 {
    fpsr.set(FPExc::OFC | FPExc::IXC);
    let to_infinity = match mode {
        RoundingMode::ToNearest_TieEven | RoundingMode::ToNearest_TieAwayFromZero => true,
        RoundingMode::TowardsPlusInfinity => !sign,
        RoundingMode::TowardsMinusInfinity => sign,
        RoundingMode::TowardsZero => false,
    };
    if to_infinity {
        info::infinity::<F>(sign)
    } else {
        info::max_normal::<F>(sign)
    }
}

/// Rounds a nonzero-or-inexact real given as its round-to-nearest value plus the
/// ordering of the exact value relative to it.
fn round_result<F: FPInfo>(nearest: F, error: Ordering, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    debug_assert!(!nearest.is_nan());

    let mode = fpcr.rmode();
    let bits = nearest.to_raw();
    let sign = info::sign_bit::<F>(bits);
    let magnitude = bits & !F::SIGN_MASK;
    let inexact = error != Ordering::Equal;

    if nearest.is_infinite() {
        return overflow::<F>(sign, mode, fpsr);
    }

    let toward_zero = (!sign && error == Ordering::Less) || (sign && error == Ordering::Greater);
    let tiny = (magnitude < F::MIN_NORMAL && (magnitude != 0 || inexact))
        || (magnitude == F::MIN_NORMAL && toward_zero);

    if tiny && fpcr.fz() {
        fpsr.set(FPExc::UFC);
        return info::zero::<F>(sign);
    }

    let rounded = match mode {
        RoundingMode::TowardsPlusInfinity if error == Ordering::Greater => info::next_up(nearest),
        RoundingMode::TowardsMinusInfinity if error == Ordering::Less => info::next_down(nearest),
        RoundingMode::TowardsZero if toward_zero => info::next_toward_zero(nearest),
        _ => nearest,
    };

    if rounded.is_infinite() {
        return overflow::<F>(sign, mode, fpsr);
    }

    if inexact {
        fpsr.set(FPExc::IXC);
        if tiny {
            fpsr.set(FPExc::UFC);
        }
    }
    rounded.to_raw()
}

/// An exact zero sum is negative only when rounding toward minus infinity.
fn exact_zero<F: FPInfo>(fpcr: FPCR) -> u64 {
    info::zero::<F>(fpcr.rmode() == RoundingMode::TowardsMinusInfinity)
}

/// Sign of `a * b + c - r1` for the round-to-nearest `r1`, exact when neither the product
/// error nor the final error falls below the smallest subnormal.
fn fused_error<F: FPInfo>(a: F, b: F, c: F, r1: F) -> Ordering {
    let u1 = a * b;
    let u2 = a.mul_add(b, -u1);
    let (alpha1, z) = two_sum(c, u2);
    let (beta1, beta2) = two_sum(u1, alpha1);
    let gamma = (beta1 - r1) + beta2;
    let (r2, r3) = two_sum(gamma, z);
    match error_order(r2) {
        Ordering::Equal => error_order(r3),
        order => order,
    }
}

/// Round-to-nearest `a * b + c` together with the sign of its rounding error.
fn fused<F: FPInfo>(a: F, b: F, c: F) -> (F, Ordering) {
    let r1 = a.mul_add(b, c);
    if a == F::ZERO || b == F::ZERO {
        return (r1, Ordering::Equal);
    }
    if r1.is_infinite() {
        return (r1, Ordering::Equal);
    }

    let (a1, ea) = normalize(a);
    let (b1, eb) = normalize(b);
    let product_exp = ea + eb;
    if product_exp >= min_exact_product_exponent::<F>() {
        return (r1, fused_error(a, b, c, r1));
    }

    // The product vanished into the addend: the whole product is the error.
    if r1 == c {
        let negative = (a < F::ZERO) != (b < F::ZERO);
        return (r1, if negative { Ordering::Less } else { Ordering::Greater });
    }

    // Product moved to [1, 4); c is within a few binades of it here. A nonzero difference
    // between the full-precision result and the scaled r1 is exact and outweighs the
    // full-precision error.
    let shift = -product_exp;
    let c1 = scale(c, shift);
    let r1_scaled = scale(r1, shift);
    let full = a1.mul_add(b1, c1);
    let full_error = fused_error(a1, b1, c1, full);
    let error = match error_order(full - r1_scaled) {
        Ordering::Equal => full_error,
        order => order,
    };
    (r1, error)
}

fn finish_fused<F: FPInfo>(nearest: F, error: Ordering, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    if nearest == F::ZERO && error == Ordering::Equal {
        return exact_zero::<F>(fpcr);
    }
    round_result(nearest, error, fpcr, fpsr)
}

// ---------------------------------------------------------------------------
// Sign manipulation
// ---------------------------------------------------------------------------

pub fn fp_abs<F: FPInfo>(op: u64) -> u64 {
    op & !F::SIGN_MASK
}

pub fn fp_neg<F: FPInfo>(op: u64) -> u64 {
    op ^ F::SIGN_MASK
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

fn add_impl<F: FPInfo>(op1: u64, op2: u64, negate: bool, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let a = unpack::<F>(op1, fpcr, fpsr);
    let mut b = unpack::<F>(op2, fpcr, fpsr);
    if let Some(nan) = process_nans::<F>(&[(a.ty, op1), (b.ty, op2)], fpcr, fpsr) {
        return nan;
    }
    if negate {
        b.sign = !b.sign;
        b.value = -b.value;
    }

    if a.is_inf() && b.is_inf() && a.sign != b.sign {
        return invalid::<F>(fpsr);
    }
    if a.is_inf() {
        return info::infinity::<F>(a.sign);
    }
    if b.is_inf() {
        return info::infinity::<F>(b.sign);
    }
    if a.is_zero() && b.is_zero() && a.sign == b.sign {
        return info::zero::<F>(a.sign);
    }

    let (sum, error) = two_sum(a.value, b.value);
    finish_fused(sum, error_order(error), fpcr, fpsr)
}

pub fn fp_add<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    add_impl::<F>(op1, op2, false, fpcr, fpsr)
}

pub fn fp_sub<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    add_impl::<F>(op1, op2, true, fpcr, fpsr)
}

fn mul_impl<F: FPInfo>(op1: u64, op2: u64, extended: bool, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let a = unpack::<F>(op1, fpcr, fpsr);
    let b = unpack::<F>(op2, fpcr, fpsr);
    if let Some(nan) = process_nans::<F>(&[(a.ty, op1), (b.ty, op2)], fpcr, fpsr) {
        return nan;
    }

    let sign = a.sign != b.sign;
    if (a.is_inf() && b.is_zero()) || (a.is_zero() && b.is_inf()) {
        if extended {
            return info::zero::<F>(sign) | F::TWO.to_raw();
        }
        return invalid::<F>(fpsr);
    }
    if a.is_inf() || b.is_inf() {
        return info::infinity::<F>(sign);
    }
    if a.is_zero() || b.is_zero() {
        return info::zero::<F>(sign);
    }

    let product = a.value * b.value;
    let error = if product == F::ZERO {
        if sign { Ordering::Less } else { Ordering::Greater }
    } else if product.is_infinite() {
        Ordering::Equal
    } else {
        // Residual on normalized significands, which cannot underflow.
        let (a1, ea) = normalize(a.value);
        let (b1, eb) = normalize(b.value);
        let p1 = scale(product, -(ea + eb));
        error_order(a1.mul_add(b1, -p1))
    };
    round_result(product, error, fpcr, fpsr)
}

pub fn fp_mul<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    mul_impl::<F>(op1, op2, false, fpcr, fpsr)
}

/// FPMulX: like multiply but 0 * inf = +-2.0.
pub fn fp_mul_x<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    mul_impl::<F>(op1, op2, true, fpcr, fpsr)
}

pub fn fp_div<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let a = unpack::<F>(op1, fpcr, fpsr);
    let b = unpack::<F>(op2, fpcr, fpsr);
    if let Some(nan) = process_nans::<F>(&[(a.ty, op1), (b.ty, op2)], fpcr, fpsr) {
        return nan;
    }

    let sign = a.sign != b.sign;
    if (a.is_inf() && b.is_inf()) || (a.is_zero() && b.is_zero()) {
        return invalid::<F>(fpsr);
    }
    if a.is_inf() || b.is_zero() {
        if !a.is_inf() {
            fpsr.set(FPExc::DZC);
        }
        return info::infinity::<F>(sign);
    }
    if a.is_zero() || b.is_inf() {
        return info::zero::<F>(sign);
    }

    let quotient = a.value / b.value;
    if quotient.is_infinite() {
        return overflow::<F>(sign, fpcr.rmode(), fpsr);
    }
    let error = if quotient == F::ZERO {
        if sign { Ordering::Less } else { Ordering::Greater }
    } else {
        let (a1, ea) = normalize(a.value);
        let (b1, eb) = normalize(b.value);
        let q1 = scale(quotient, eb - ea);
        let remainder = (-q1).mul_add(b1, a1);
        let order = error_order(remainder);
        if b.sign { order.reverse() } else { order }
    };
    round_result(quotient, error, fpcr, fpsr)
}

pub fn fp_sqrt<F: FPInfo>(op: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let a = unpack::<F>(op, fpcr, fpsr);
    if a.ty.is_nan() {
        return process_nan::<F>(a.ty, op, fpcr, fpsr);
    }
    if a.is_zero() {
        return info::zero::<F>(a.sign);
    }
    if a.sign {
        return invalid::<F>(fpsr);
    }
    if a.is_inf() {
        return F::INFINITY;
    }

    let root = a.value.sqrt();
    // Even exponent keeps the scaled root exact.
    let (mut x1, mut exp) = normalize(a.value);
    if exp.rem_euclid(2) == 1 {
        x1 = x1 * F::TWO;
        exp -= 1;
    }
    let root1 = scale(root, -exp / 2);
    let residual = (-root1).mul_add(root1, x1);
    round_result(root, error_order(residual), fpcr, fpsr)
}

/// `addend + op1 * op2` with a single rounding.
pub fn fp_mul_add<F: FPInfo>(addend: u64, op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let c = unpack::<F>(addend, fpcr, fpsr);
    let a = unpack::<F>(op1, fpcr, fpsr);
    let b = unpack::<F>(op2, fpcr, fpsr);

    let inf_times_zero = (a.is_inf() && b.is_zero()) || (a.is_zero() && b.is_inf());
    if c.ty == FPType::QNaN && inf_times_zero {
        return invalid::<F>(fpsr);
    }
    if let Some(nan) = process_nans::<F>(&[(c.ty, addend), (a.ty, op1), (b.ty, op2)], fpcr, fpsr) {
        return nan;
    }

    let product_sign = a.sign != b.sign;
    let product_inf = a.is_inf() || b.is_inf();
    let product_zero = a.is_zero() || b.is_zero();

    if inf_times_zero || (c.is_inf() && product_inf && c.sign != product_sign) {
        return invalid::<F>(fpsr);
    }
    if c.is_inf() {
        return info::infinity::<F>(c.sign);
    }
    if product_inf {
        return info::infinity::<F>(product_sign);
    }
    if c.is_zero() && product_zero && c.sign == product_sign {
        return info::zero::<F>(c.sign);
    }

    let (nearest, error) = fused(a.value, b.value, c.value);
    finish_fused(nearest, error, fpcr, fpsr)
}

// ---------------------------------------------------------------------------
// Min / max
// ---------------------------------------------------------------------------

fn min_max_impl<F: FPInfo>(op1: u64, op2: u64, max: bool, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let a = unpack::<F>(op1, fpcr, fpsr);
    let b = unpack::<F>(op2, fpcr, fpsr);
    if let Some(nan) = process_nans::<F>(&[(a.ty, op1), (b.ty, op2)], fpcr, fpsr) {
        return nan;
    }

    let take_first = if max { a.value > b.value } else { a.value < b.value };
    let chosen = if take_first { &a } else { &b };
    match chosen.ty {
        FPType::Infinity => info::infinity::<F>(chosen.sign),
        FPType::Zero => {
            let sign = if max { a.sign && b.sign } else { a.sign || b.sign };
            info::zero::<F>(sign)
        }
        _ => round_result(chosen.value, Ordering::Equal, fpcr, fpsr),
    }
}

pub fn fp_max<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    min_max_impl::<F>(op1, op2, true, fpcr, fpsr)
}

pub fn fp_min<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    min_max_impl::<F>(op1, op2, false, fpcr, fpsr)
}

/// A single quiet NaN operand loses to the number.
fn numeric_operands<F: FPInfo>(op1: u64, op2: u64, replacement: u64) -> (u64, u64) {
    match (info::is_qnan::<F>(op1), info::is_qnan::<F>(op2)) {
        (true, false) => (replacement, op2),
        (false, true) => (op1, replacement),
        _ => (op1, op2),
    }
}

pub fn fp_max_numeric<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let (op1, op2) = numeric_operands::<F>(op1, op2, info::infinity::<F>(true));
    fp_max::<F>(op1, op2, fpcr, fpsr)
}

pub fn fp_min_numeric<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let (op1, op2) = numeric_operands::<F>(op1, op2, info::infinity::<F>(false));
    fp_min::<F>(op1, op2, fpcr, fpsr)
}

// ---------------------------------------------------------------------------
// Newton-Raphson steps
// ---------------------------------------------------------------------------

fn step_impl<F: FPInfo>(
    op1: u64,
    op2: u64,
    constant: F,
    inf_times_zero: F,
    halve: bool,
    fpcr: FPCR,
    fpsr: &mut FPSR,
) -> u64 {
    let op1 = fp_neg::<F>(op1);
    let a = unpack::<F>(op1, fpcr, fpsr);
    let b = unpack::<F>(op2, fpcr, fpsr);
    if let Some(nan) = process_nans::<F>(&[(a.ty, op1), (b.ty, op2)], fpcr, fpsr) {
        return nan;
    }

    if (a.is_inf() && b.is_zero()) || (a.is_zero() && b.is_inf()) {
        return inf_times_zero.to_raw();
    }
    if a.is_inf() || b.is_inf() {
        return info::infinity::<F>(a.sign != b.sign);
    }

    let (nearest, error) = fused(a.value, b.value, constant);
    let nearest = if halve { nearest * F::HALF } else { nearest };
    finish_fused(nearest, error, fpcr, fpsr)
}

/// FPRecipStepFused: 2.0 - op1 * op2.
pub fn fp_recip_step_fused<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    step_impl::<F>(op1, op2, F::TWO, F::TWO, false, fpcr, fpsr)
}

/// FPRSqrtStepFused: (3.0 - op1 * op2) / 2.0.
pub fn fp_rsqrt_step_fused<F: FPInfo>(op1: u64, op2: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    step_impl::<F>(op1, op2, F::THREE, F::THREE * F::HALF, true, fpcr, fpsr)
}

// ---------------------------------------------------------------------------
// Round to integral
// ---------------------------------------------------------------------------

/// Rounds to an integral value in `mode`. `exact` raises IXC when the value changes.
pub fn fp_round_int<F: FPInfo>(op: u64, mode: RoundingMode, exact: bool, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let a = unpack::<F>(op, fpcr, fpsr);
    match a.ty {
        FPType::QNaN | FPType::SNaN => return process_nan::<F>(a.ty, op, fpcr, fpsr),
        FPType::Infinity => return info::infinity::<F>(a.sign),
        FPType::Zero => return info::zero::<F>(a.sign),
        FPType::Nonzero => {}
    }

    let rounded = match mode {
        RoundingMode::ToNearest_TieEven => a.value.round_ties_even(),
        RoundingMode::TowardsPlusInfinity => a.value.ceil(),
        RoundingMode::TowardsMinusInfinity => a.value.floor(),
        RoundingMode::TowardsZero => a.value.trunc(),
        RoundingMode::ToNearest_TieAwayFromZero => a.value.round_ties_away(),
    };

    if exact && rounded != a.value {
        fpsr.set(FPExc::IXC);
    }
    if rounded == F::ZERO {
        info::zero::<F>(a.sign)
    } else {
        rounded.to_raw()
    }
}

// ---------------------------------------------------------------------------
// Estimates
// ---------------------------------------------------------------------------

/// 9-bit input in [256, 511] to 9-bit estimate in [256, 511].
fn recip_estimate_table(a: u64) -> u64 {
    let a = a * 2 + 1;
    let b = (1 << 19) / a;
    (b + 1) / 2
}

fn recip_sqrt_estimate_table(a: u64) -> u64 {
    let a = if a < 256 { a * 2 + 1 } else { ((a >> 1) << 1) * 2 + 2 };
    let mut b = 512u64;
    while a * (b + 1) * (b + 1) < (1 << 28) {
        b += 1;
    }
    (b + 1) / 2
}

/// Fraction widened to 52 bits with the biased exponent.
fn widen_fraction<F: FPInfo>(op: u64) -> (u64, i64) {
    let shift = 52 - F::MANTISSA_WIDTH;
    let fraction = (op & F::MANTISSA_MASK) << shift;
    let exp = ((op & F::EXPONENT_MASK) >> F::MANTISSA_WIDTH) as i64;
    (fraction, exp)
}

fn narrow_fraction<F: FPInfo>(fraction: u64) -> u64 {
    (fraction & ((1 << 52) - 1)) >> (52 - F::MANTISSA_WIDTH)
}

/// FPRecipEstimate: 8-bit accurate 1/x.
pub fn fp_recip_estimate<F: FPInfo>(op: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let a = unpack::<F>(op, fpcr, fpsr);
    match a.ty {
        FPType::QNaN | FPType::SNaN => return process_nan::<F>(a.ty, op, fpcr, fpsr),
        FPType::Infinity => return info::zero::<F>(a.sign),
        FPType::Zero => {
            fpsr.set(FPExc::DZC);
            return info::infinity::<F>(a.sign);
        }
        FPType::Nonzero => {}
    }

    let magnitude = op & !F::SIGN_MASK;
    if magnitude < 1 << (F::MANTISSA_WIDTH - 2) {
        return overflow::<F>(a.sign, fpcr.rmode(), fpsr);
    }
    let (mut fraction, mut exp) = widen_fraction::<F>(op);
    if fpcr.fz() && exp >= 2 * F::EXPONENT_BIAS - 1 {
        fpsr.set(FPExc::UFC);
        return info::zero::<F>(a.sign);
    }

    if exp == 0 {
        if fraction & (1 << 51) == 0 {
            exp = -1;
            fraction <<= 2;
        } else {
            fraction <<= 1;
        }
        fraction &= (1 << 52) - 1;
    }

    let scaled = 0x100 | (fraction >> 44);
    let mut result_exp = 2 * F::EXPONENT_BIAS - 1 - exp;
    let estimate = recip_estimate_table(scaled);

    let mut fraction = (estimate & 0xFF) << 44;
    if result_exp == 0 {
        fraction = (1 << 51) | (fraction >> 1);
    } else if result_exp == -1 {
        fraction = (1 << 50) | (fraction >> 2);
        result_exp = 0;
    }

    info::zero::<F>(a.sign) | ((result_exp as u64) << F::MANTISSA_WIDTH) | narrow_fraction::<F>(fraction)
}

/// FPRSqrtEstimate: 8-bit accurate 1/sqrt(x).
pub fn fp_rsqrt_estimate<F: FPInfo>(op: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let a = unpack::<F>(op, fpcr, fpsr);
    match a.ty {
        FPType::QNaN | FPType::SNaN => return process_nan::<F>(a.ty, op, fpcr, fpsr),
        FPType::Zero => {
            fpsr.set(FPExc::DZC);
            return info::infinity::<F>(a.sign);
        }
        _ if a.sign => return invalid::<F>(fpsr),
        FPType::Infinity => return 0,
        FPType::Nonzero => {}
    }

    let (mut fraction, mut exp) = widen_fraction::<F>(op);
    if exp == 0 {
        while fraction & (1 << 51) == 0 {
            fraction <<= 1;
            exp -= 1;
        }
        fraction = (fraction << 1) & ((1 << 52) - 1);
    }

    let scaled = if exp & 1 == 0 {
        0x100 | (fraction >> 44)
    } else {
        0x80 | (fraction >> 45)
    };
    let result_exp = (3 * F::EXPONENT_BIAS - 1 - exp) / 2;
    let estimate = recip_sqrt_estimate_table(scaled);

    ((result_exp as u64) << F::MANTISSA_WIDTH) | narrow_fraction::<F>((estimate & 0xFF) << 44)
}

/// FPRecpX: reciprocal exponent, mantissa cleared.
pub fn fp_recip_exponent<F: FPInfo>(op: u64, fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    let a = unpack::<F>(op, fpcr, fpsr);
    if a.ty.is_nan() {
        return process_nan::<F>(a.ty, op, fpcr, fpsr);
    }

    let exponent = op & F::EXPONENT_MASK;
    let result_exp = if exponent == 0 {
        F::MAX_NORMAL & F::EXPONENT_MASK
    } else {
        !exponent & F::EXPONENT_MASK
    };
    info::zero::<F>(a.sign) | result_exp
}
