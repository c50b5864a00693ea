use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Format parameters and host operations for one IEEE binary format.
///
/// Raw encodings are carried as `u64` (single precision zero-extended) so the soft-float
/// routines can be written once for both widths.
pub trait FPInfo:
    Copy
    + Debug
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    const TOTAL_WIDTH: u32;
    const EXPONENT_WIDTH: u32;
    const MANTISSA_WIDTH: u32;
    const EXPONENT_BIAS: i64;

    const SIGN_MASK: u64 = 1 << (Self::TOTAL_WIDTH - 1);
    const EXPONENT_MASK: u64 = ((1 << Self::EXPONENT_WIDTH) - 1) << Self::MANTISSA_WIDTH;
    const MANTISSA_MASK: u64 = (1 << Self::MANTISSA_WIDTH) - 1;
    const QUIET_BIT: u64 = 1 << (Self::MANTISSA_WIDTH - 1);
    const DEFAULT_NAN: u64 = Self::EXPONENT_MASK | Self::QUIET_BIT;
    const INFINITY: u64 = Self::EXPONENT_MASK;
    const MAX_NORMAL: u64 = Self::EXPONENT_MASK - 1;
    const MIN_NORMAL: u64 = 1 << Self::MANTISSA_WIDTH;

    const ZERO: Self;
    const HALF: Self;
    const TWO: Self;
    const THREE: Self;

    fn from_raw(bits: u64) -> Self;
    fn to_raw(self) -> u64;

    fn sqrt(self) -> Self;
    /// Single-rounding `self * a + b`.
    fn mul_add(self, a: Self, b: Self) -> Self;
    fn floor(self) -> Self;
    fn ceil(self) -> Self;
    fn trunc(self) -> Self;
    fn round_ties_away(self) -> Self;
    fn round_ties_even(self) -> Self;
    fn is_nan(self) -> bool;
    fn is_infinite(self) -> bool;
}

macro_rules! impl_fp_info {
    ($float:ty, $bits:ty, $total:expr, $exp:expr, $mant:expr) => {
        impl FPInfo for $float {
            const TOTAL_WIDTH: u32 = $total;
            const EXPONENT_WIDTH: u32 = $exp;
            const MANTISSA_WIDTH: u32 = $mant;
            const EXPONENT_BIAS: i64 = (1 << ($exp - 1)) - 1;

            const ZERO: Self = 0.0;
            const HALF: Self = 0.5;
            const TWO: Self = 2.0;
            const THREE: Self = 3.0;

            fn from_raw(bits: u64) -> Self { <$float>::from_bits(bits as $bits) }
            fn to_raw(self) -> u64 { self.to_bits() as u64 }

            fn sqrt(self) -> Self { <$float>::sqrt(self) }
            fn mul_add(self, a: Self, b: Self) -> Self { <$float>::mul_add(self, a, b) }
            fn floor(self) -> Self { <$float>::floor(self) }
            fn ceil(self) -> Self { <$float>::ceil(self) }
            fn trunc(self) -> Self { <$float>::trunc(self) }
            fn round_ties_away(self) -> Self { <$float>::round(self) }
            fn round_ties_even(self) -> Self { <$float>::round_ties_even(self) }
            fn is_nan(self) -> bool { <$float>::is_nan(self) }
            fn is_infinite(self) -> bool { <$float>::is_infinite(self) }
        }
    };
}

impl_fp_info!(f32, u32, 32, 8, 23);
impl_fp_info!(f64, u64, 64, 11, 52);

pub fn sign_bit<F: FPInfo>(bits: u64) -> bool {
    bits & F::SIGN_MASK != 0
}

pub fn zero<F: FPInfo>(sign: bool) -> u64 {
    if sign { F::SIGN_MASK } else { 0 }
}

pub fn infinity<F: FPInfo>(sign: bool) -> u64 {
    zero::<F>(sign) | F::INFINITY
}

pub fn max_normal<F: FPInfo>(sign: bool) -> u64 {
    zero::<F>(sign) | F::MAX_NORMAL
}

pub fn is_snan<F: FPInfo>(bits: u64) -> bool {
    bits & F::EXPONENT_MASK == F::EXPONENT_MASK
        && bits & F::MANTISSA_MASK != 0
        && bits & F::QUIET_BIT == 0
}

pub fn is_qnan<F: FPInfo>(bits: u64) -> bool {
    bits & F::EXPONENT_MASK == F::EXPONENT_MASK && bits & F::QUIET_BIT != 0
}

/// Smallest representable value greater than `x`.
pub fn next_up<F: FPInfo>(x: F) -> F {
    let bits = x.to_raw();
    if x.is_nan() || bits == F::INFINITY {
        return x;
    }
    if bits == F::SIGN_MASK {
        return F::from_raw(1);
    }
    if sign_bit::<F>(bits) {
        F::from_raw(bits - 1)
    } else {
        F::from_raw(bits + 1)
    }
}

/// Largest representable value less than `x`.
pub fn next_down<F: FPInfo>(x: F) -> F {
    -next_up(-x)
}

/// One step toward zero.
pub fn next_toward_zero<F: FPInfo>(x: F) -> F {
    let bits = x.to_raw();
    if bits & !F::SIGN_MASK == 0 {
        return x;
    }
    F::from_raw(bits - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_constants() {
        assert_eq!(<f32 as FPInfo>::DEFAULT_NAN, 0x7FC0_0000);
        assert_eq!(<f64 as FPInfo>::DEFAULT_NAN, 0x7FF8_0000_0000_0000);
        assert_eq!(<f32 as FPInfo>::MAX_NORMAL, f32::MAX.to_bits() as u64);
        assert_eq!(<f64 as FPInfo>::MIN_NORMAL, f64::MIN_POSITIVE.to_bits());
        assert_eq!(<f32 as FPInfo>::EXPONENT_BIAS, 127);
        assert_eq!(<f64 as FPInfo>::EXPONENT_BIAS, 1023);
    }

    #[test]
    fn test_nan_classification() {
        assert!(is_snan::<f32>(0x7F80_0001));
        assert!(!is_snan::<f32>(0x7FC0_0000));
        assert!(is_qnan::<f32>(0xFFC0_0001));
        assert!(!is_qnan::<f32>(0x7F80_0000));
    }

    #[test]
    fn test_next_up_down() {
        assert_eq!(next_up(1.0f32), 1.0 + f32::EPSILON);
        assert_eq!(next_down(1.0f64), 1.0 - f64::EPSILON / 2.0);
        assert_eq!(next_up(-0.0f32).to_bits(), 1);
        assert_eq!(next_up(f32::MAX), f32::INFINITY);
        assert_eq!(next_toward_zero(-1.0f32), -(1.0 - f32::EPSILON / 2.0));
    }
}
