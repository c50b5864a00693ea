//! Whole-register vector operations and lane access.

use crate::ir::opcode::Opcode;

/// A lane type that can be read from and written to the little-endian bytes of a register.
pub trait Lane: Copy {
    const BYTES: usize;
    fn read(bytes: &[u8]) -> Self;
    fn write(self, bytes: &mut [u8]);
}

macro_rules! impl_lane {
    ($($ty:ty),*) => {
        $(
            impl Lane for $ty {
                const BYTES: usize = std::mem::size_of::<$ty>();

                fn read(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                fn write(self, bytes: &mut [u8]) {
                    bytes.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_lane!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

pub fn map<T: Lane>(a: u128, f: impl Fn(T) -> T) -> u128 {
    let src = a.to_le_bytes();
    let mut out = [0u8; 16];
    for (s, d) in src.chunks_exact(T::BYTES).zip(out.chunks_exact_mut(T::BYTES)) {
        f(T::read(s)).write(d);
    }
    u128::from_le_bytes(out)
}

pub fn zip<T: Lane>(a: u128, b: u128, f: impl Fn(T, T) -> T) -> u128 {
    let (a, b) = (a.to_le_bytes(), b.to_le_bytes());
    let mut out = [0u8; 16];
    for ((sa, sb), d) in a
        .chunks_exact(T::BYTES)
        .zip(b.chunks_exact(T::BYTES))
        .zip(out.chunks_exact_mut(T::BYTES))
    {
        f(T::read(sa), T::read(sb)).write(d);
    }
    u128::from_le_bytes(out)
}

pub fn zip3<T: Lane>(a: u128, b: u128, c: u128, f: impl Fn(T, T, T) -> T) -> u128 {
    let (a, b, c) = (a.to_le_bytes(), b.to_le_bytes(), c.to_le_bytes());
    let mut out = [0u8; 16];
    for (i, d) in out.chunks_exact_mut(T::BYTES).enumerate() {
        let range = i * T::BYTES..(i + 1) * T::BYTES;
        f(T::read(&a[range.clone()]), T::read(&b[range.clone()]), T::read(&c[range])).write(d);
    }
    u128::from_le_bytes(out)
}

/// Widens the low-half lanes of `a` from `N` to `W`.
pub fn widen<N: Lane, W: Lane>(a: u128, f: impl Fn(N) -> W) -> u128 {
    let src = a.to_le_bytes();
    let mut out = [0u8; 16];
    for (s, d) in src.chunks_exact(N::BYTES).zip(out.chunks_exact_mut(W::BYTES)) {
        f(N::read(s)).write(d);
    }
    u128::from_le_bytes(out)
}

fn lane_mask(esize: usize) -> u128 {
    if esize >= 128 {
        u128::MAX
    } else {
        (1u128 << esize) - 1
    }
}

/// Zero-extended value of lane `index`.
pub fn get_element(v: u128, esize: usize, index: usize) -> u64 {
    assert!((index + 1) * esize <= 128, "Lane {} out of range for esize {}", index, esize);
    ((v >> (index * esize)) & lane_mask(esize)) as u64
}

/// Replaces lane `index` with the low `esize` bits of `value`.
pub fn set_element(v: u128, esize: usize, index: usize, value: u64) -> u128 {
    assert!((index + 1) * esize <= 128, "Lane {} out of range for esize {}", index, esize);
    let shift = index * esize;
    let mask = lane_mask(esize) << shift;
    (v & !mask) | (((value as u128) << shift) & mask)
}

fn broadcast(v: u128, esize: usize, index: usize) -> u128 {
    let lane = get_element(v, esize, index) as u128;
    (0..128 / esize).fold(0, |acc, i| acc | (lane << (i * esize)))
}

/// Bits `[position, position + 128)` of the concatenation `b:a`.
fn extract(a: u128, b: u128, position: u32) -> u128 {
    assert!(position < 128, "Invalid extract position {}", position);
    if position == 0 {
        a
    } else {
        (a >> position) | (b << (128 - position))
    }
}

fn round_int_32(v: u128, mode: u8) -> u128 {
    match mode {
        0 => map::<f32>(v, f32::round_ties_even),
        1 => map::<f32>(v, f32::ceil),
        2 => map::<f32>(v, f32::floor),
        3 => map::<f32>(v, f32::trunc),
        _ => panic!("Invalid native rounding mode {}", mode),
    }
}

fn round_int_64(v: u128, mode: u8) -> u128 {
    match mode {
        0 => map::<f64>(v, f64::round_ties_even),
        1 => map::<f64>(v, f64::ceil),
        2 => map::<f64>(v, f64::floor),
        3 => map::<f64>(v, f64::trunc),
        _ => panic!("Invalid native rounding mode {}", mode),
    }
}

/// Evaluate a vector opcode. Lane indices and other immediates arrive zero-extended in `args`.
pub fn execute(opcode: Opcode, args: &[u128]) -> u128 {
    use Opcode::*;
    let a = args.first().copied().unwrap_or(0);
    let b = args.get(1).copied().unwrap_or(0);
    let c = args.get(2).copied().unwrap_or(0);
    match opcode {
        // Lane access
        VectorGetElement8 => get_element(a, 8, b as usize) as u128,
        VectorGetElement16 => get_element(a, 16, b as usize) as u128,
        VectorGetElement32 => get_element(a, 32, b as usize) as u128,
        VectorGetElement64 => get_element(a, 64, b as usize) as u128,
        VectorSetElement8 => set_element(a, 8, b as usize, c as u64),
        VectorSetElement16 => set_element(a, 16, b as usize, c as u64),
        VectorSetElement32 => set_element(a, 32, b as usize, c as u64),
        VectorSetElement64 => set_element(a, 64, b as usize, c as u64),
        VectorBroadcastElement32 => broadcast(a, 32, b as usize),
        VectorBroadcastElement64 => broadcast(a, 64, b as usize),
        VectorExtract => extract(a, b, c as u32),
        VectorZeroUpper => a & u64::MAX as u128,
        ZeroVector => 0,

        // Integer
        VectorAbs8 => map::<i8>(a, i8::wrapping_abs),
        VectorAbs16 => map::<i16>(a, i16::wrapping_abs),
        VectorAbs32 => map::<i32>(a, i32::wrapping_abs),
        VectorAdd8 => zip::<u8>(a, b, u8::wrapping_add),
        VectorAdd16 => zip::<u16>(a, b, u16::wrapping_add),
        VectorAdd32 => zip::<u32>(a, b, u32::wrapping_add),
        VectorAdd64 => zip::<u64>(a, b, u64::wrapping_add),
        VectorSub8 => zip::<u8>(a, b, u8::wrapping_sub),
        VectorSub16 => zip::<u16>(a, b, u16::wrapping_sub),
        VectorSub32 => zip::<u32>(a, b, u32::wrapping_sub),
        VectorSub64 => zip::<u64>(a, b, u64::wrapping_sub),
        VectorMultiply8 => zip::<u8>(a, b, u8::wrapping_mul),
        VectorMultiply16 => zip::<u16>(a, b, u16::wrapping_mul),
        VectorMultiply32 => zip::<u32>(a, b, u32::wrapping_mul),
        VectorMaxSigned8 => zip::<i8>(a, b, i8::max),
        VectorMaxSigned16 => zip::<i16>(a, b, i16::max),
        VectorMaxSigned32 => zip::<i32>(a, b, i32::max),
        VectorMaxUnsigned8 => zip::<u8>(a, b, u8::max),
        VectorMaxUnsigned16 => zip::<u16>(a, b, u16::max),
        VectorMaxUnsigned32 => zip::<u32>(a, b, u32::max),
        VectorMinSigned8 => zip::<i8>(a, b, i8::min),
        VectorMinSigned16 => zip::<i16>(a, b, i16::min),
        VectorMinSigned32 => zip::<i32>(a, b, i32::min),
        VectorMinUnsigned8 => zip::<u8>(a, b, u8::min),
        VectorMinUnsigned16 => zip::<u16>(a, b, u16::min),
        VectorMinUnsigned32 => zip::<u32>(a, b, u32::min),
        VectorRoundingHalvingAddUnsigned8 => {
            zip::<u8>(a, b, |x, y| ((x as u16 + y as u16 + 1) >> 1) as u8)
        }
        VectorRoundingHalvingAddUnsigned16 => {
            zip::<u16>(a, b, |x, y| ((x as u32 + y as u32 + 1) >> 1) as u16)
        }
        VectorSignExtend8 => widen::<i8, i16>(a, i16::from),
        VectorSignExtend16 => widen::<i16, i32>(a, i32::from),
        VectorSignExtend32 => widen::<i32, i64>(a, i64::from),
        VectorZeroExtend8 => widen::<u8, u16>(a, u16::from),
        VectorZeroExtend16 => widen::<u16, u32>(a, u32::from),
        VectorZeroExtend32 => widen::<u32, u64>(a, u64::from),

        // Floating point
        FPVectorAbs32 => map::<f32>(a, f32::abs),
        FPVectorAbs64 => map::<f64>(a, f64::abs),
        FPVectorNeg32 => map::<f32>(a, |x| -x),
        FPVectorNeg64 => map::<f64>(a, |x| -x),
        FPVectorSqrt32 => map::<f32>(a, f32::sqrt),
        FPVectorSqrt64 => map::<f64>(a, f64::sqrt),
        FPVectorAdd32 => zip::<f32>(a, b, |x, y| x + y),
        FPVectorAdd64 => zip::<f64>(a, b, |x, y| x + y),
        FPVectorSub32 => zip::<f32>(a, b, |x, y| x - y),
        FPVectorSub64 => zip::<f64>(a, b, |x, y| x - y),
        FPVectorMul32 => zip::<f32>(a, b, |x, y| x * y),
        FPVectorMul64 => zip::<f64>(a, b, |x, y| x * y),
        FPVectorDiv32 => zip::<f32>(a, b, |x, y| x / y),
        FPVectorDiv64 => zip::<f64>(a, b, |x, y| x / y),
        FPVectorMax32 => zip::<f32>(a, b, f32::max),
        FPVectorMax64 => zip::<f64>(a, b, f64::max),
        FPVectorMin32 => zip::<f32>(a, b, f32::min),
        FPVectorMin64 => zip::<f64>(a, b, f64::min),
        FPVectorMulAdd32 => zip3::<f32>(a, b, c, |acc, x, y| x.mul_add(y, acc)),
        FPVectorMulAdd64 => zip3::<f64>(a, b, c, |acc, x, y| x.mul_add(y, acc)),
        FPVectorRoundInt32 => round_int_32(a, b as u8),
        FPVectorRoundInt64 => round_int_64(a, b as u8),

        _ => panic!("{} is not a vector opcode", opcode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: u128 = 0xF0E1_D2C3_B4A5_9687_7869_5A4B_3C2D_1E0F;

    #[test]
    fn test_set_of_get_is_identity_per_lane() {
        for esize in [8, 16, 32, 64] {
            for index in 0..128 / esize {
                let lane = get_element(PATTERN, esize, index);
                assert_eq!(set_element(PATTERN, esize, index, lane), PATTERN);

                let changed = set_element(PATTERN, esize, index, !lane);
                for other in (0..128 / esize).filter(|&i| i != index) {
                    assert_eq!(get_element(changed, esize, other), get_element(PATTERN, esize, other));
                }
            }
        }
    }

    #[test]
    fn test_set_element_truncates_value() {
        let v = set_element(0, 8, 1, 0x1FF);
        assert_eq!(v, 0xFF00);
    }

    #[test]
    fn test_extend_reads_low_half() {
        let v: u128 = 0x0000_0000_0000_0000_0000_0000_80FF_7F01;
        assert_eq!(get_element(execute(Opcode::VectorSignExtend8, &[v]), 16, 3), 0xFF80);
        assert_eq!(get_element(execute(Opcode::VectorZeroExtend8, &[v]), 16, 3), 0x0080);
        assert_eq!(get_element(execute(Opcode::VectorSignExtend8, &[v]), 16, 2), 0xFFFF);
        assert_eq!(get_element(execute(Opcode::VectorSignExtend8, &[v]), 16, 1), 0x007F);
    }

    #[test]
    fn test_extract() {
        let a = 0x1111_1111_1111_1111_2222_2222_2222_2222u128;
        let b = 0x3333_3333_3333_3333_4444_4444_4444_4444u128;
        assert_eq!(extract(a, b, 0), a);
        assert_eq!(extract(a, b, 64), 0x4444_4444_4444_4444_1111_1111_1111_1111);
    }

    #[test]
    fn test_broadcast() {
        let v = execute(Opcode::VectorBroadcastElement32, &[PATTERN, 1]);
        assert_eq!(v, 0x7869_5A4B_7869_5A4B_7869_5A4B_7869_5A4B);
        assert_eq!(get_element(v, 32, 3), get_element(PATTERN, 32, 1));
    }

    #[test]
    fn test_fp_round_int_modes() {
        let v = (2.5f32.to_bits() as u128) | ((-2.5f32).to_bits() as u128) << 32;
        let even = execute(Opcode::FPVectorRoundInt32, &[v, 0]);
        assert_eq!(f32::from_bits(get_element(even, 32, 0) as u32), 2.0);
        assert_eq!(f32::from_bits(get_element(even, 32, 1) as u32), -2.0);
        let floor = execute(Opcode::FPVectorRoundInt32, &[v, 2]);
        assert_eq!(f32::from_bits(get_element(floor, 32, 1) as u32), -3.0);
    }

    #[test]
    fn test_rounding_halving_add() {
        let v = execute(Opcode::VectorRoundingHalvingAddUnsigned8, &[0xFF, 0x02]);
        assert_eq!(get_element(v, 8, 0), 0x81);
    }
}
