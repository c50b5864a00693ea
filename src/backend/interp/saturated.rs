//! Saturating integer arithmetic.
//!
//! Operands are raw lane bit patterns held in the low `esize` bits of a `u64`; upper bits are
//! ignored. Results are `esize`-bit patterns zero-extended to 64 bits, paired with whether the
//! result was clamped.

use crate::ir::opcode::Opcode;

// ---------------------------------------------------------------------------
// Add / subtract / accumulate
// ---------------------------------------------------------------------------

macro_rules! define_saturated_binary {
    ($name:ident, $aty:ty, $bty:ty, $uty:ty, $checked:ident, $saturating:ident) => {
        fn $name(a: u64, b: u64) -> (u64, bool) {
            let (a, b) = (a as $aty, b as $bty);
            let saturated = a.$checked(b).is_none();
            (a.$saturating(b) as $uty as u64, saturated)
        }
    };
}

define_saturated_binary!(signed_add8, i8, i8, u8, checked_add, saturating_add);
define_saturated_binary!(signed_add16, i16, i16, u16, checked_add, saturating_add);
define_saturated_binary!(signed_add32, i32, i32, u32, checked_add, saturating_add);
define_saturated_binary!(signed_add64, i64, i64, u64, checked_add, saturating_add);

define_saturated_binary!(signed_sub8, i8, i8, u8, checked_sub, saturating_sub);
define_saturated_binary!(signed_sub16, i16, i16, u16, checked_sub, saturating_sub);
define_saturated_binary!(signed_sub32, i32, i32, u32, checked_sub, saturating_sub);
define_saturated_binary!(signed_sub64, i64, i64, u64, checked_sub, saturating_sub);

define_saturated_binary!(unsigned_add8, u8, u8, u8, checked_add, saturating_add);
define_saturated_binary!(unsigned_add16, u16, u16, u16, checked_add, saturating_add);
define_saturated_binary!(unsigned_add32, u32, u32, u32, checked_add, saturating_add);
define_saturated_binary!(unsigned_add64, u64, u64, u64, checked_add, saturating_add);

define_saturated_binary!(unsigned_sub8, u8, u8, u8, checked_sub, saturating_sub);
define_saturated_binary!(unsigned_sub16, u16, u16, u16, checked_sub, saturating_sub);
define_saturated_binary!(unsigned_sub32, u32, u32, u32, checked_sub, saturating_sub);
define_saturated_binary!(unsigned_sub64, u64, u64, u64, checked_sub, saturating_sub);

// SUQADD: signed accumulator, unsigned addend
define_saturated_binary!(signed_acc_unsigned8, i8, u8, u8, checked_add_unsigned, saturating_add_unsigned);
define_saturated_binary!(signed_acc_unsigned16, i16, u16, u16, checked_add_unsigned, saturating_add_unsigned);
define_saturated_binary!(signed_acc_unsigned32, i32, u32, u32, checked_add_unsigned, saturating_add_unsigned);
define_saturated_binary!(signed_acc_unsigned64, i64, u64, u64, checked_add_unsigned, saturating_add_unsigned);

// USQADD: unsigned accumulator, signed addend
define_saturated_binary!(unsigned_acc_signed8, u8, i8, u8, checked_add_signed, saturating_add_signed);
define_saturated_binary!(unsigned_acc_signed16, u16, i16, u16, checked_add_signed, saturating_add_signed);
define_saturated_binary!(unsigned_acc_signed32, u32, i32, u32, checked_add_signed, saturating_add_signed);
define_saturated_binary!(unsigned_acc_signed64, u64, i64, u64, checked_add_signed, saturating_add_signed);

// ---------------------------------------------------------------------------
// Negate / absolute value
// ---------------------------------------------------------------------------

macro_rules! define_saturated_unary {
    ($name:ident, $sty:ty, $uty:ty, $checked:ident, $saturating:ident) => {
        fn $name(a: u64) -> (u64, bool) {
            let a = a as $sty;
            let saturated = a.$checked().is_none();
            (a.$saturating() as $uty as u64, saturated)
        }
    };
}

define_saturated_unary!(signed_neg8, i8, u8, checked_neg, saturating_neg);
define_saturated_unary!(signed_neg16, i16, u16, checked_neg, saturating_neg);
define_saturated_unary!(signed_neg32, i32, u32, checked_neg, saturating_neg);
define_saturated_unary!(signed_neg64, i64, u64, checked_neg, saturating_neg);

define_saturated_unary!(signed_abs8, i8, u8, checked_abs, saturating_abs);
define_saturated_unary!(signed_abs16, i16, u16, checked_abs, saturating_abs);
define_saturated_unary!(signed_abs32, i32, u32, checked_abs, saturating_abs);
define_saturated_unary!(signed_abs64, i64, u64, checked_abs, saturating_abs);

// ---------------------------------------------------------------------------
// Doubling multiply returning the high half (SQDMULH / SQRDMULH)
// ---------------------------------------------------------------------------

macro_rules! define_doubling_multiply_high {
    ($name:ident, $sty:ty, $uty:ty, $wty:ty, $round:expr) => {
        fn $name(a: u64, b: u64) -> (u64, bool) {
            const BITS: u32 = <$sty>::BITS;
            let product = 2 * (a as $sty as $wty) * (b as $sty as $wty);
            let product = if $round { product + (1 << (BITS - 1)) } else { product };
            let high = product >> BITS;
            // Only MIN * MIN escapes the range; it becomes MAX rather than wrapping to MIN.
            if high > <$sty>::MAX as $wty {
                (<$sty>::MAX as $uty as u64, true)
            } else {
                (high as $sty as $uty as u64, false)
            }
        }
    };
}

define_doubling_multiply_high!(doubling_multiply_high16, i16, u16, i64, false);
define_doubling_multiply_high!(doubling_multiply_high32, i32, u32, i128, false);
define_doubling_multiply_high!(rounding_doubling_multiply_high16, i16, u16, i64, true);
define_doubling_multiply_high!(rounding_doubling_multiply_high32, i32, u32, i128, true);

// ---------------------------------------------------------------------------
// Narrowing (SQXTN / SQXTUN / UQXTN)
// ---------------------------------------------------------------------------

fn narrow_bounds_check(esize: u32) {
    assert!(matches!(esize, 8 | 16 | 32), "Invalid narrowing esize {}", esize);
}

fn sign_extend(value: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

fn clamp_signed(value: i64, esize: u32) -> (u64, bool) {
    let max = (1i64 << (esize - 1)) - 1;
    let min = -(1i64 << (esize - 1));
    let clamped = value.clamp(min, max);
    let mask = (1u64 << esize) - 1;
    (clamped as u64 & mask, clamped != value)
}

fn narrow_to_signed(value: u64, esize: u32) -> (u64, bool) {
    narrow_bounds_check(esize);
    clamp_signed(sign_extend(value, esize * 2), esize)
}

fn narrow_signed_to_unsigned(value: u64, esize: u32) -> (u64, bool) {
    narrow_bounds_check(esize);
    let value = sign_extend(value, esize * 2);
    let max = (1i64 << esize) - 1;
    let clamped = value.clamp(0, max);
    (clamped as u64, clamped != value)
}

fn narrow_unsigned(value: u64, esize: u32) -> (u64, bool) {
    narrow_bounds_check(esize);
    let wide_mask = if esize == 32 { u64::MAX } else { (1u64 << (esize * 2)) - 1 };
    let value = value & wide_mask;
    let max = (1u64 << esize) - 1;
    (value.min(max), value > max)
}

/// Evaluate a saturating opcode. `b` is the second operand, or the narrowing width.
pub fn execute(opcode: Opcode, a: u64, b: u64) -> (u64, bool) {
    use Opcode::*;
    match opcode {
        SignedSaturatedAdd8 => signed_add8(a, b),
        SignedSaturatedAdd16 => signed_add16(a, b),
        SignedSaturatedAdd32 => signed_add32(a, b),
        SignedSaturatedAdd64 => signed_add64(a, b),
        SignedSaturatedSub8 => signed_sub8(a, b),
        SignedSaturatedSub16 => signed_sub16(a, b),
        SignedSaturatedSub32 => signed_sub32(a, b),
        SignedSaturatedSub64 => signed_sub64(a, b),
        UnsignedSaturatedAdd8 => unsigned_add8(a, b),
        UnsignedSaturatedAdd16 => unsigned_add16(a, b),
        UnsignedSaturatedAdd32 => unsigned_add32(a, b),
        UnsignedSaturatedAdd64 => unsigned_add64(a, b),
        UnsignedSaturatedSub8 => unsigned_sub8(a, b),
        UnsignedSaturatedSub16 => unsigned_sub16(a, b),
        UnsignedSaturatedSub32 => unsigned_sub32(a, b),
        UnsignedSaturatedSub64 => unsigned_sub64(a, b),
        SignedSaturatedNeg8 => signed_neg8(a),
        SignedSaturatedNeg16 => signed_neg16(a),
        SignedSaturatedNeg32 => signed_neg32(a),
        SignedSaturatedNeg64 => signed_neg64(a),
        SignedSaturatedAbs8 => signed_abs8(a),
        SignedSaturatedAbs16 => signed_abs16(a),
        SignedSaturatedAbs32 => signed_abs32(a),
        SignedSaturatedAbs64 => signed_abs64(a),
        SignedSaturatedAccumulateUnsigned8 => signed_acc_unsigned8(a, b),
        SignedSaturatedAccumulateUnsigned16 => signed_acc_unsigned16(a, b),
        SignedSaturatedAccumulateUnsigned32 => signed_acc_unsigned32(a, b),
        SignedSaturatedAccumulateUnsigned64 => signed_acc_unsigned64(a, b),
        UnsignedSaturatedAccumulateSigned8 => unsigned_acc_signed8(a, b),
        UnsignedSaturatedAccumulateSigned16 => unsigned_acc_signed16(a, b),
        UnsignedSaturatedAccumulateSigned32 => unsigned_acc_signed32(a, b),
        UnsignedSaturatedAccumulateSigned64 => unsigned_acc_signed64(a, b),
        SignedSaturatedDoublingMultiplyReturnHigh16 => doubling_multiply_high16(a, b),
        SignedSaturatedDoublingMultiplyReturnHigh32 => doubling_multiply_high32(a, b),
        SignedSaturatedRoundingDoublingMultiplyReturnHigh16 => rounding_doubling_multiply_high16(a, b),
        SignedSaturatedRoundingDoublingMultiplyReturnHigh32 => rounding_doubling_multiply_high32(a, b),
        SignedSaturatedNarrowToSigned => narrow_to_signed(a, b as u32),
        SignedSaturatedNarrowToUnsigned => narrow_signed_to_unsigned(a, b as u32),
        UnsignedSaturatedNarrow => narrow_unsigned(a, b as u32),
        _ => panic!("{} is not a saturating opcode", opcode),
    }
}
