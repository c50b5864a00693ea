//! Scalar integer operations in the 64-bit canonical domain, and bit counting.

use crate::ir::opcode::Opcode;

/// Leading zeros per nibble value.
const CLZ_NIBBLE: [u64; 16] = [4, 3, 2, 2, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0];

/// Leading zeros of the low `width` bits, one nibble at a time.
pub fn count_leading_zeros_fallback(value: u64, width: u32) -> u64 {
    assert!(width % 4 == 0 && (4..=64).contains(&width), "Invalid count width {}", width);
    let mut count = 0;
    let mut shift = width;
    while shift > 0 {
        shift -= 4;
        let nibble = CLZ_NIBBLE[((value >> shift) & 0xF) as usize];
        count += nibble;
        if nibble != 4 {
            break;
        }
    }
    count
}

/// Set bits of the low byte.
pub fn population_count_fallback_8(value: u64) -> u64 {
    let mut value = value & 0xFF;
    let mut count = 0;
    while value != 0 {
        value &= value - 1;
        count += 1;
    }
    count
}

pub fn execute(opcode: Opcode, args: &[u128]) -> u64 {
    use Opcode::*;
    let a = args.first().copied().unwrap_or(0) as u64;
    let b = args.get(1).copied().unwrap_or(0) as u64;
    match opcode {
        SignExtendByteToLong => a as u8 as i8 as i64 as u64,
        SignExtendHalfToLong => a as u16 as i16 as i64 as u64,
        SignExtendWordToLong => a as u32 as i32 as i64 as u64,
        ZeroExtendByteToLong => a & 0xFF,
        ZeroExtendHalfToLong => a & 0xFFFF,
        ZeroExtendWordToLong => a & 0xFFFF_FFFF,
        LeastSignificantByte => a & 0xFF,
        Add64 => a.wrapping_add(b),
        Sub64 => a.wrapping_sub(b),
        Mul64 => a.wrapping_mul(b),
        And64 => a & b,
        Eor64 => a ^ b,
        LogicalShiftLeft64 => a.checked_shl(b as u32).unwrap_or(0),
        LogicalShiftRight64 => a.checked_shr(b as u32).unwrap_or(0),
        ArithmeticShiftRight64 => ((a as i64) >> b.min(63)) as u64,
        Abs64 => (a as i64).wrapping_abs() as u64,
        MaxSigned64 => (a as i64).max(b as i64) as u64,
        MaxUnsigned64 => a.max(b),
        MinSigned64 => (a as i64).min(b as i64) as u64,
        MinUnsigned64 => a.min(b),

        CountLeadingZeros32 => (a as u32).leading_zeros() as u64,
        CountLeadingZeros64 => a.leading_zeros() as u64,
        CountLeadingZerosFallback => count_leading_zeros_fallback(a, b as u32),
        PopulationCount => a.count_ones() as u64,
        PopulationCountFallback8 => population_count_fallback_8(a),

        _ => panic!("{} is not a scalar integer opcode", opcode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clz_fallback_matches_native() {
        for value in [0u64, 1, 0x0F, 0x10, 0x80, 0x7FFF, 0x0001_0000, u64::MAX >> 3, 1 << 63] {
            assert_eq!(count_leading_zeros_fallback(value, 64), value.leading_zeros() as u64);
            let low = value as u32;
            assert_eq!(count_leading_zeros_fallback(low as u64, 32), low.leading_zeros() as u64);
        }
        assert_eq!(count_leading_zeros_fallback(0, 8), 8);
        assert_eq!(count_leading_zeros_fallback(0x01, 8), 7);
        assert_eq!(count_leading_zeros_fallback(0x0100, 16), 7);
    }

    #[test]
    fn test_popcount_fallback() {
        assert_eq!(population_count_fallback_8(0), 0);
        assert_eq!(population_count_fallback_8(0xFF), 8);
        assert_eq!(population_count_fallback_8(0x1A5), 4);
    }

    #[test]
    fn test_extension_and_shifts() {
        assert_eq!(execute(Opcode::SignExtendByteToLong, &[0x80]), 0xFFFF_FFFF_FFFF_FF80);
        assert_eq!(execute(Opcode::ZeroExtendHalfToLong, &[0x1_8000]), 0x8000);
        assert_eq!(execute(Opcode::ArithmeticShiftRight64, &[1 << 63, 70]), u64::MAX);
        assert_eq!(execute(Opcode::LogicalShiftRight64, &[u64::MAX as u128, 64]), 0);
        assert_eq!(execute(Opcode::MaxSigned64, &[u64::MAX as u128, 1]), 1);
        assert_eq!(execute(Opcode::MaxUnsigned64, &[u64::MAX as u128, 1]), u64::MAX);
    }
}
