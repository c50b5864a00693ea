use crate::fp::RoundingMode;
use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::translate::floating_point::{FpBinary, FpUnary, Rounding};
use crate::frontend::a64::translate::visitor::TranslatorVisitor;
use crate::ir::emitter::IREmitter;
use crate::ir::value::Value;

impl<'a> TranslatorVisitor<'a> {
    fn fp_vector_arith(&mut self, op: &OpDescriptor, native: Option<FpBinary<'a>>, soft: FpBinary<'a>) {
        self.check_fp_vector(op);
        let fsize = op.fp_esize();
        match native {
            Some(f) if self.native_fp(fsize) => {
                log::trace!("{}: native path", op.name);
                let n = self.v(op.rn);
                let m = self.v(op.rm);
                let result = f(&mut self.ir, fsize, n, m);
                self.set_v(op, op.rd, result);
            }
            _ => self.fp_lanes_binary(op, |v, fsize, a, b| soft(&mut v.ir, fsize, a, b)),
        }
    }

    fn fp_vector_unary_arith(&mut self, op: &OpDescriptor, native: Option<FpUnary<'a>>, soft: FpUnary<'a>) {
        self.check_fp_vector(op);
        let fsize = op.fp_esize();
        match native {
            Some(f) if self.native_fp(fsize) => {
                let n = self.v(op.rn);
                let result = f(&mut self.ir, fsize, n);
                self.set_v(op, op.rd, result);
            }
            _ => self.fp_lanes_unary(op, |v, fsize, a| soft(&mut v.ir, fsize, a)),
        }
    }

    /// `n op m[index]` for every lane of `n`.
    fn fp_vector_by_element(&mut self, op: &OpDescriptor, native: Option<FpBinary<'a>>, soft: FpBinary<'a>) {
        self.check_fp_vector(op);
        let fsize = op.fp_esize();
        match native {
            Some(f) if self.native_fp(fsize) => {
                let n = self.v(op.rn);
                let m = self.v(op.rm);
                let index = op.index as usize;
                if index >= 128 / fsize {
                    self.reserved(op);
                }
                let element = self.ir.vector_broadcast_element(fsize, m, index);
                let result = f(&mut self.ir, fsize, n, element);
                self.set_v(op, op.rd, result);
            }
            _ => self.fp_lanes_ternary(op, true, |v, fsize, _, a, b| soft(&mut v.ir, fsize, a, b)),
        }
    }

    // --- Arithmetic ---

    pub fn fadd_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, Some(IREmitter::fp_vector_add), IREmitter::fp_add);
        true
    }

    pub fn fsub_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, Some(IREmitter::fp_vector_sub), IREmitter::fp_sub);
        true
    }

    pub fn fmul_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, Some(IREmitter::fp_vector_mul), IREmitter::fp_mul);
        true
    }

    pub fn fdiv_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, Some(IREmitter::fp_vector_div), IREmitter::fp_div);
        true
    }

    pub fn fmax_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, Some(IREmitter::fp_vector_max), IREmitter::fp_max);
        true
    }

    pub fn fmin_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, Some(IREmitter::fp_vector_min), IREmitter::fp_min);
        true
    }

    pub fn fmaxnm_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, None, IREmitter::fp_max_numeric);
        true
    }

    pub fn fminnm_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, None, IREmitter::fp_min_numeric);
        true
    }

    pub fn fmulx_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, None, IREmitter::fp_mul_x);
        true
    }

    pub fn frecps_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, None, IREmitter::fp_recip_step_fused);
        true
    }

    pub fn frsqrts_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_arith(op, None, IREmitter::fp_rsqrt_step_fused);
        true
    }

    pub fn fmul_ve(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_by_element(op, Some(IREmitter::fp_vector_mul), IREmitter::fp_mul);
        true
    }

    pub fn fmulx_ve(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_by_element(op, None, IREmitter::fp_mul_x);
        true
    }

    // --- Unary ---

    pub fn fabs_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_unary_arith(op, Some(IREmitter::fp_vector_abs), IREmitter::fp_abs);
        true
    }

    pub fn fneg_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_unary_arith(op, Some(IREmitter::fp_vector_neg), IREmitter::fp_neg);
        true
    }

    pub fn fsqrt_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_unary_arith(op, Some(IREmitter::fp_vector_sqrt), IREmitter::fp_sqrt);
        true
    }

    pub fn frecpe_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_unary_arith(op, None, IREmitter::fp_recip_estimate);
        true
    }

    pub fn frsqrte_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_unary_arith(op, None, IREmitter::fp_rsqrt_estimate);
        true
    }

    // --- Fused multiply-add ---

    /// `d[i] = d[i] ± n[i] * m[i]` (or `m[index]`), with the product negated for FMLS.
    fn fp_vector_fused(&mut self, op: &OpDescriptor, subtract: bool, by_element: bool) {
        self.check_fp_vector(op);
        let fsize = op.fp_esize();
        if self.native_mul_add_available(fsize) {
            let d = self.v(op.rd);
            let mut n = self.v(op.rn);
            let mut m = self.v(op.rm);
            if by_element {
                let index = op.index as usize;
                if index >= 128 / fsize {
                    self.reserved(op);
                }
                m = self.ir.vector_broadcast_element(fsize, m, index);
            }
            if subtract {
                n = self.ir.fp_vector_neg(fsize, n);
            }
            let result = self.native_mul_add(fsize, d, n, m);
            self.set_v(op, op.rd, result);
            return;
        }
        self.fp_lanes_ternary(op, by_element, |v, fsize, acc, a, b| {
            let a = if subtract { v.ir.fp_neg(fsize, a) } else { a };
            v.ir.fp_mul_add(fsize, acc, a, b)
        });
    }

    pub fn fmla_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_fused(op, false, false);
        true
    }

    pub fn fmls_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_fused(op, true, false);
        true
    }

    pub fn fmla_ve(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_fused(op, false, true);
        true
    }

    pub fn fmls_ve(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_fused(op, true, true);
        true
    }

    // --- Round to integral ---

    fn fp_vector_round(&mut self, op: &OpDescriptor, rounding: Rounding, exact: bool) {
        self.check_fp_vector(op);
        let fsize = op.fp_esize();
        if let Some(mode) = self.native_rounding(fsize, rounding, exact) {
            let n = self.v(op.rn);
            let result = self.ir.fp_vector_round_int(fsize, n, mode);
            self.set_v(op, op.rd, result);
            return;
        }
        // One FPCR read serves every lane.
        let mode = self.rounding_operand(rounding);
        self.fp_lanes_unary(op, |v, fsize, a| v.ir.fp_round_int(fsize, a, mode, exact));
    }

    pub fn frinta_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_round(op, Rounding::Fixed(RoundingMode::ToNearest_TieAwayFromZero), false);
        true
    }

    pub fn frinti_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_round(op, Rounding::Dynamic, false);
        true
    }

    pub fn frintm_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_round(op, Rounding::Fixed(RoundingMode::TowardsMinusInfinity), false);
        true
    }

    pub fn frintn_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_round(op, Rounding::Fixed(RoundingMode::ToNearest_TieEven), false);
        true
    }

    pub fn frintp_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_round(op, Rounding::Fixed(RoundingMode::TowardsPlusInfinity), false);
        true
    }

    pub fn frintx_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_round(op, Rounding::Dynamic, true);
        true
    }

    pub fn frintz_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_vector_round(op, Rounding::Fixed(RoundingMode::TowardsZero), false);
        true
    }
}
