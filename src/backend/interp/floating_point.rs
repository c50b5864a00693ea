//! Architecturally exact floating-point opcodes, backed by `fp::op`.

use crate::fp::op;
use crate::fp::{RoundingMode, FPCR, FPSR};
use crate::ir::opcode::Opcode;

macro_rules! unary {
    ($f:ident, $ty:ty, $a:expr, $fpcr:expr, $fpsr:expr) => {
        op::$f::<$ty>($a, $fpcr, $fpsr)
    };
}

macro_rules! binary {
    ($f:ident, $ty:ty, $a:expr, $b:expr, $fpcr:expr, $fpsr:expr) => {
        op::$f::<$ty>($a, $b, $fpcr, $fpsr)
    };
}

/// Evaluate a software floating-point opcode against the live FPCR, accumulating into `fpsr`.
pub fn execute(opcode: Opcode, args: &[u128], fpcr: FPCR, fpsr: &mut FPSR) -> u64 {
    use Opcode::*;
    let a = args.first().copied().unwrap_or(0) as u64;
    let b = args.get(1).copied().unwrap_or(0) as u64;
    let c = args.get(2).copied().unwrap_or(0) as u64;
    match opcode {
        FPAbs32 => op::fp_abs::<f32>(a),
        FPAbs64 => op::fp_abs::<f64>(a),
        FPNeg32 => op::fp_neg::<f32>(a),
        FPNeg64 => op::fp_neg::<f64>(a),

        FPSqrt32 => unary!(fp_sqrt, f32, a, fpcr, fpsr),
        FPSqrt64 => unary!(fp_sqrt, f64, a, fpcr, fpsr),
        FPRecipEstimate32 => unary!(fp_recip_estimate, f32, a, fpcr, fpsr),
        FPRecipEstimate64 => unary!(fp_recip_estimate, f64, a, fpcr, fpsr),
        FPRecipExponent32 => unary!(fp_recip_exponent, f32, a, fpcr, fpsr),
        FPRecipExponent64 => unary!(fp_recip_exponent, f64, a, fpcr, fpsr),
        FPRSqrtEstimate32 => unary!(fp_rsqrt_estimate, f32, a, fpcr, fpsr),
        FPRSqrtEstimate64 => unary!(fp_rsqrt_estimate, f64, a, fpcr, fpsr),

        FPAdd32 => binary!(fp_add, f32, a, b, fpcr, fpsr),
        FPAdd64 => binary!(fp_add, f64, a, b, fpcr, fpsr),
        FPSub32 => binary!(fp_sub, f32, a, b, fpcr, fpsr),
        FPSub64 => binary!(fp_sub, f64, a, b, fpcr, fpsr),
        FPMul32 => binary!(fp_mul, f32, a, b, fpcr, fpsr),
        FPMul64 => binary!(fp_mul, f64, a, b, fpcr, fpsr),
        FPMulX32 => binary!(fp_mul_x, f32, a, b, fpcr, fpsr),
        FPMulX64 => binary!(fp_mul_x, f64, a, b, fpcr, fpsr),
        FPDiv32 => binary!(fp_div, f32, a, b, fpcr, fpsr),
        FPDiv64 => binary!(fp_div, f64, a, b, fpcr, fpsr),
        FPMax32 => binary!(fp_max, f32, a, b, fpcr, fpsr),
        FPMax64 => binary!(fp_max, f64, a, b, fpcr, fpsr),
        FPMin32 => binary!(fp_min, f32, a, b, fpcr, fpsr),
        FPMin64 => binary!(fp_min, f64, a, b, fpcr, fpsr),
        FPMaxNumeric32 => binary!(fp_max_numeric, f32, a, b, fpcr, fpsr),
        FPMaxNumeric64 => binary!(fp_max_numeric, f64, a, b, fpcr, fpsr),
        FPMinNumeric32 => binary!(fp_min_numeric, f32, a, b, fpcr, fpsr),
        FPMinNumeric64 => binary!(fp_min_numeric, f64, a, b, fpcr, fpsr),
        FPRecipStepFused32 => binary!(fp_recip_step_fused, f32, a, b, fpcr, fpsr),
        FPRecipStepFused64 => binary!(fp_recip_step_fused, f64, a, b, fpcr, fpsr),
        FPRSqrtStepFused32 => binary!(fp_rsqrt_step_fused, f32, a, b, fpcr, fpsr),
        FPRSqrtStepFused64 => binary!(fp_rsqrt_step_fused, f64, a, b, fpcr, fpsr),

        FPMulAdd32 => op::fp_mul_add::<f32>(a, b, c, fpcr, fpsr),
        FPMulAdd64 => op::fp_mul_add::<f64>(a, b, c, fpcr, fpsr),

        FPRoundInt32 => op::fp_round_int::<f32>(a, RoundingMode::from_u8(b as u8), c != 0, fpcr, fpsr),
        FPRoundInt64 => op::fp_round_int::<f64>(a, RoundingMode::from_u8(b as u8), c != 0, fpcr, fpsr),

        _ => panic!("{} is not a floating-point opcode", opcode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_accumulates_fpsr() {
        let mut fpsr = FPSR::default();
        let one_third = execute(
            Opcode::FPDiv32,
            &[1.0f32.to_bits() as u128, 3.0f32.to_bits() as u128],
            FPCR::default(),
            &mut fpsr,
        );
        assert_eq!(one_third as u32, (1.0f32 / 3.0).to_bits());
        assert!(fpsr.ixc());
    }

    #[test]
    fn test_round_int_mode_argument() {
        let mut fpsr = FPSR::default();
        let x = 2.5f64.to_bits() as u128;
        let away = execute(Opcode::FPRoundInt64, &[x, 4, 0], FPCR::default(), &mut fpsr);
        let even = execute(Opcode::FPRoundInt64, &[x, 0, 0], FPCR::default(), &mut fpsr);
        assert_eq!(f64::from_bits(away), 3.0);
        assert_eq!(f64::from_bits(even), 2.0);
        assert!(!fpsr.ixc());
    }
}
