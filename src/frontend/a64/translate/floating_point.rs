//! Scalar floating-point instructions and the strategy helpers shared with the vector forms.
//!
//! Native forms run the host float unit on whole registers; scalar native forms place the
//! operand in lane 0 of an otherwise zero register and read lane 0 back. Software forms use
//! the exact `FP*` opcodes, which honour FPCR and accumulate FPSR.

use crate::fp::RoundingMode;
use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::translate::visitor::TranslatorVisitor;
use crate::ir::emitter::IREmitter;
use crate::ir::value::Value;

pub(crate) type FpUnary<'a> = fn(&mut IREmitter<'a>, usize, Value) -> Value;
pub(crate) type FpBinary<'a> = fn(&mut IREmitter<'a>, usize, Value, Value) -> Value;

/// Where a round-to-integral instruction takes its rounding rule from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rounding {
    Fixed(RoundingMode),
    /// FPCR.RMode at the time the instruction executes.
    Dynamic,
}

fn native_abs_difference(ir: &mut IREmitter<'_>, fsize: usize, a: Value, b: Value) -> Value {
    let diff = ir.fp_vector_sub(fsize, a, b);
    ir.fp_vector_abs(fsize, diff)
}

fn soft_abs_difference(ir: &mut IREmitter<'_>, fsize: usize, a: Value, b: Value) -> Value {
    let diff = ir.fp_sub(fsize, a, b);
    ir.fp_abs(fsize, diff)
}

fn native_negated_product(ir: &mut IREmitter<'_>, fsize: usize, a: Value, b: Value) -> Value {
    let product = ir.fp_vector_mul(fsize, a, b);
    ir.fp_vector_neg(fsize, product)
}

fn soft_negated_product(ir: &mut IREmitter<'_>, fsize: usize, a: Value, b: Value) -> Value {
    let product = ir.fp_mul(fsize, a, b);
    ir.fp_neg(fsize, product)
}

impl<'a> TranslatorVisitor<'a> {
    // --- Strategy helpers ---

    /// The rounding rule as a U8 operand of `FPRoundInt`.
    pub(crate) fn rounding_operand(&mut self, rounding: Rounding) -> Value {
        match rounding {
            Rounding::Fixed(mode) => self.ir.imm8(mode as u8),
            Rounding::Dynamic => {
                let fpcr = self.ir.get_fpcr();
                let fpcr = self.ir.extend_to_long(fpcr, 32, false);
                let rmode = self.ir.logical_shift_right_64(fpcr, 22);
                let mask = self.ir.imm64(0x3);
                let rmode = self.ir.and_64(rmode, mask);
                self.ir.least_significant_byte(rmode)
            }
        }
    }

    /// Immediate mode for a native rounding instruction, if one can honour `rounding`.
    /// Dynamic modes and FRINTX's inexact signalling always need the software routine.
    pub(crate) fn native_rounding(&self, fsize: usize, rounding: Rounding, exact: bool) -> Option<u8> {
        match rounding {
            Rounding::Fixed(mode) if !exact && (mode as u8) < 4 && self.native_fp(fsize) => {
                Some(mode as u8)
            }
            _ => None,
        }
    }

    pub(crate) fn native_mul_add_available(&self, fsize: usize) -> bool {
        self.native_fused_multiply_add(fsize) || self.native_unfused_multiply_add(fsize)
    }

    /// `acc + n * m` on whole registers, fused when the host can.
    pub(crate) fn native_mul_add(&mut self, fsize: usize, acc: Value, n: Value, m: Value) -> Value {
        if self.native_fused_multiply_add(fsize) {
            self.ir.fp_vector_mul_add(fsize, acc, n, m)
        } else {
            let product = self.ir.fp_vector_mul(fsize, n, m);
            self.ir.fp_vector_add(fsize, acc, product)
        }
    }

    /// Lane 0 of a host-computed register result.
    fn native_lane(&mut self, fsize: usize, vector: Value) -> Value {
        self.extract_raw(vector, 0, fsize)
    }

    fn fp_scalar_arith(&mut self, op: &OpDescriptor, native: Option<FpBinary<'a>>, soft: FpBinary<'a>) {
        let fsize = op.fp_esize();
        let native = native.filter(|_| self.native_fp(fsize));
        log::trace!("{}: {} path", op.name, if native.is_some() { "native" } else { "software" });
        self.fp_scalar_binary(op, |v, fsize, a, b| match native {
            Some(f) => {
                let a = v.scalar_result(fsize, a);
                let b = v.scalar_result(fsize, b);
                let r = f(&mut v.ir, fsize, a, b);
                v.native_lane(fsize, r)
            }
            None => soft(&mut v.ir, fsize, a, b),
        });
    }

    fn fp_scalar_unary_arith(&mut self, op: &OpDescriptor, native: Option<FpUnary<'a>>, soft: FpUnary<'a>) {
        let fsize = op.fp_esize();
        let native = native.filter(|_| self.native_fp(fsize));
        self.fp_scalar_unary(op, |v, fsize, a| match native {
            Some(f) => {
                let a = v.scalar_result(fsize, a);
                let r = f(&mut v.ir, fsize, a);
                v.native_lane(fsize, r)
            }
            None => soft(&mut v.ir, fsize, a),
        });
    }

    /// `addend + op1 * op2` on scalar lanes with a single rounding in the software path.
    fn scalar_mul_add(&mut self, fsize: usize, addend: Value, op1: Value, op2: Value) -> Value {
        if self.native_mul_add_available(fsize) {
            let addend = self.scalar_result(fsize, addend);
            let op1 = self.scalar_result(fsize, op1);
            let op2 = self.scalar_result(fsize, op2);
            let r = self.native_mul_add(fsize, addend, op1, op2);
            self.native_lane(fsize, r)
        } else {
            self.ir.fp_mul_add(fsize, addend, op1, op2)
        }
    }

    // --- Arithmetic ---

    pub fn fadd_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, Some(IREmitter::fp_vector_add), IREmitter::fp_add);
        true
    }

    pub fn fsub_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, Some(IREmitter::fp_vector_sub), IREmitter::fp_sub);
        true
    }

    pub fn fmul_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, Some(IREmitter::fp_vector_mul), IREmitter::fp_mul);
        true
    }

    pub fn fdiv_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, Some(IREmitter::fp_vector_div), IREmitter::fp_div);
        true
    }

    pub fn fmax_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, Some(IREmitter::fp_vector_max), IREmitter::fp_max);
        true
    }

    pub fn fmin_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, Some(IREmitter::fp_vector_min), IREmitter::fp_min);
        true
    }

    pub fn fmaxnm_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, None, IREmitter::fp_max_numeric);
        true
    }

    pub fn fminnm_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, None, IREmitter::fp_min_numeric);
        true
    }

    pub fn fmulx_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, None, IREmitter::fp_mul_x);
        true
    }

    pub fn frecps_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, None, IREmitter::fp_recip_step_fused);
        true
    }

    pub fn frsqrts_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, None, IREmitter::fp_rsqrt_step_fused);
        true
    }

    /// FABD: `|n - m|`
    pub fn fabd_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, Some(native_abs_difference), soft_abs_difference);
        true
    }

    /// FNMUL: `-(n * m)`
    pub fn fnmul_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_arith(op, Some(native_negated_product), soft_negated_product);
        true
    }

    // --- Unary ---

    pub fn fabs_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_unary(op, |v, fsize, a| v.ir.fp_abs(fsize, a));
        true
    }

    pub fn fneg_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_unary(op, |v, fsize, a| v.ir.fp_neg(fsize, a));
        true
    }

    pub fn fsqrt_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_unary_arith(op, Some(IREmitter::fp_vector_sqrt), IREmitter::fp_sqrt);
        true
    }

    pub fn frecpe_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_unary_arith(op, None, IREmitter::fp_recip_estimate);
        true
    }

    pub fn frsqrte_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_unary_arith(op, None, IREmitter::fp_rsqrt_estimate);
        true
    }

    pub fn frecpx_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_unary_arith(op, None, IREmitter::fp_recip_exponent);
        true
    }

    // --- Fused multiply-add (Rd = result, Ra = addend) ---

    /// `(-1)^negate_addend * a + (-1)^negate_product * n * m`
    fn fp_scalar_fused(&mut self, op: &OpDescriptor, negate_addend: bool, negate_product: bool) {
        self.check_fp_scalar(op);
        let fsize = op.fp_esize();
        let a = self.v(op.ra);
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let mut addend = self.extract_raw(a, 0, fsize);
        let mut op1 = self.extract_raw(n, 0, fsize);
        let op2 = self.extract_raw(m, 0, fsize);
        if negate_addend {
            addend = self.ir.fp_neg(fsize, addend);
        }
        if negate_product {
            op1 = self.ir.fp_neg(fsize, op1);
        }
        let r = self.scalar_mul_add(fsize, addend, op1, op2);
        let result = self.scalar_result(fsize, r);
        self.set_v_full(op.rd, result);
    }

    pub fn fmadd_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_fused(op, false, false);
        true
    }

    pub fn fmsub_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_fused(op, false, true);
        true
    }

    pub fn fnmadd_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_fused(op, true, true);
        true
    }

    pub fn fnmsub_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_fused(op, true, false);
        true
    }

    // --- Scalar by element ---

    fn fp_scalar_by_element(&mut self, op: &OpDescriptor, f: impl FnOnce(&mut Self, usize, Value, Value, Value) -> Value) {
        self.check_fp_scalar(op);
        let fsize = op.fp_esize();
        let d = self.v(op.rd);
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let element = self.fp_element(op, m);
        let acc = self.extract_raw(d, 0, fsize);
        let a = self.extract_raw(n, 0, fsize);
        let r = f(self, fsize, acc, a, element);
        let result = self.scalar_result(fsize, r);
        self.set_v_full(op.rd, result);
    }

    pub fn fmla_se(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_by_element(op, |v, fsize, acc, a, b| v.scalar_mul_add(fsize, acc, a, b));
        true
    }

    pub fn fmls_se(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_by_element(op, |v, fsize, acc, a, b| {
            let a = v.ir.fp_neg(fsize, a);
            v.scalar_mul_add(fsize, acc, a, b)
        });
        true
    }

    pub fn fmul_se(&mut self, op: &OpDescriptor) -> bool {
        let native = self.native_fp(op.fp_esize());
        self.fp_scalar_by_element(op, |v, fsize, _, a, b| {
            if native {
                let a = v.scalar_result(fsize, a);
                let b = v.scalar_result(fsize, b);
                let r = v.ir.fp_vector_mul(fsize, a, b);
                v.native_lane(fsize, r)
            } else {
                v.ir.fp_mul(fsize, a, b)
            }
        });
        true
    }

    pub fn fmulx_se(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_by_element(op, |v, fsize, _, a, b| v.ir.fp_mul_x(fsize, a, b));
        true
    }

    // --- Round to integral ---

    fn fp_scalar_round(&mut self, op: &OpDescriptor, rounding: Rounding, exact: bool) {
        let native = self.native_rounding(op.fp_esize(), rounding, exact);
        self.fp_scalar_unary(op, |v, fsize, a| match native {
            Some(mode) => {
                let a = v.scalar_result(fsize, a);
                let r = v.ir.fp_vector_round_int(fsize, a, mode);
                v.native_lane(fsize, r)
            }
            None => {
                let mode = v.rounding_operand(rounding);
                v.ir.fp_round_int(fsize, a, mode, exact)
            }
        });
    }

    pub fn frinta_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_round(op, Rounding::Fixed(RoundingMode::ToNearest_TieAwayFromZero), false);
        true
    }

    pub fn frinti_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_round(op, Rounding::Dynamic, false);
        true
    }

    pub fn frintm_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_round(op, Rounding::Fixed(RoundingMode::TowardsMinusInfinity), false);
        true
    }

    pub fn frintn_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_round(op, Rounding::Fixed(RoundingMode::ToNearest_TieEven), false);
        true
    }

    pub fn frintp_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_round(op, Rounding::Fixed(RoundingMode::TowardsPlusInfinity), false);
        true
    }

    pub fn frintx_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_round(op, Rounding::Dynamic, true);
        true
    }

    pub fn frintz_s(&mut self, op: &OpDescriptor) -> bool {
        self.fp_scalar_round(op, Rounding::Fixed(RoundingMode::TowardsZero), false);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitConfig;
    use crate::frontend::a64::types::InstName;
    use crate::host_features::HostFeature;
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    fn emit(config: EmitConfig, op: OpDescriptor, f: fn(&mut TranslatorVisitor<'_>, &OpDescriptor) -> bool) -> Block {
        let mut block = Block::new(0);
        {
            let mut v = TranslatorVisitor::new(&mut block, config);
            f(&mut v, &op);
        }
        block
    }

    fn fast(host: HostFeature) -> EmitConfig {
        EmitConfig::portable().with_host(host).with_fast_fp(true)
    }

    #[test]
    fn test_fadd_path_follows_fast_fp() {
        let op = OpDescriptor::new(InstName::FADD_S).with_size(1);
        let exact = emit(EmitConfig::portable().with_host(HostFeature::SSE2), op, |v, op| v.fadd_s(op));
        assert!(exact.contains_opcode(Opcode::FPAdd64));
        assert!(!exact.contains_opcode(Opcode::FPVectorAdd64));

        let native = emit(fast(HostFeature::SSE2), op, |v, op| v.fadd_s(op));
        assert!(native.contains_opcode(Opcode::FPVectorAdd64));
        assert!(!native.contains_opcode(Opcode::FPAdd64));
    }

    #[test]
    fn test_fmadd_prefers_host_fma() {
        let op = OpDescriptor::new(InstName::FMADD_S);
        let fused = emit(fast(HostFeature::SSE2 | HostFeature::FMA), op, |v, op| v.fmadd_s(op));
        assert!(fused.contains_opcode(Opcode::FPVectorMulAdd32));

        // Without host FMA and without permission to unfuse, the exact routine is kept.
        let soft = emit(fast(HostFeature::SSE2), op, |v, op| v.fmadd_s(op));
        assert!(soft.contains_opcode(Opcode::FPMulAdd32));
        assert!(!soft.contains_opcode(Opcode::FPVectorMul32));
    }

    #[test]
    fn test_frinti_reads_fpcr() {
        let op = OpDescriptor::new(InstName::FRINTI_S);
        let block = emit(fast(HostFeature::SSE2), op, |v, op| v.frinti_s(op));
        assert!(block.contains_opcode(Opcode::A64GetFPCR));
        assert!(block.contains_opcode(Opcode::FPRoundInt32));
        assert!(!block.contains_opcode(Opcode::FPVectorRoundInt32));
    }

    #[test]
    fn test_frintm_native_with_fast_fp() {
        let op = OpDescriptor::new(InstName::FRINTM_S);
        let block = emit(fast(HostFeature::SSE2), op, |v, op| v.frintm_s(op));
        assert!(block.contains_opcode(Opcode::FPVectorRoundInt32));
        assert!(!block.contains_opcode(Opcode::A64GetFPCR));
    }

    #[test]
    #[should_panic(expected = "FADD_S: reserved encoding")]
    fn test_half_precision_is_reserved() {
        emit(EmitConfig::portable(), OpDescriptor::new(InstName::FADD_S).with_size(3), |v, op| v.fadd_s(op));
    }
}
