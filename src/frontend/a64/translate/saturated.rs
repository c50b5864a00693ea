//! Saturating arithmetic. Every clamped result is folded into FPSR.QC when saturation
//! tracking is enabled.

use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::translate::visitor::TranslatorVisitor;
use crate::ir::value::Value;

type SaturatedBinary<'a> = fn(&mut TranslatorVisitor<'a>, Value, Value, usize) -> Value;
type SaturatedUnary<'a> = fn(&mut TranslatorVisitor<'a>, Value, usize) -> Value;

impl<'a> TranslatorVisitor<'a> {
    /// Scalar form on lane 0 of `n` and `m`; the rest of `d` is zeroed.
    fn saturated_scalar(&mut self, op: &OpDescriptor, f: SaturatedBinary<'a>) {
        let esize = op.esize();
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let a = self.extract(n, 0, esize, false);
        let b = self.extract(m, 0, esize, false);
        let r = f(self, a, b, esize);
        self.track_saturation(r);
        let result = self.scalar_result(esize, r);
        self.set_v_full(op.rd, result);
    }

    fn saturated_vector(&mut self, op: &OpDescriptor, f: SaturatedBinary<'a>) {
        if op.size == 3 && op.is_half() {
            self.reserved(op);
        }
        let esize = op.esize();
        self.lanes_binary(op, false, |v, a, b| {
            let r = f(v, a, b, esize);
            v.track_saturation(r);
            r
        });
    }

    fn saturated_scalar_unary(&mut self, op: &OpDescriptor, f: SaturatedUnary<'a>) {
        let esize = op.esize();
        let n = self.v(op.rn);
        let a = self.extract(n, 0, esize, false);
        let r = f(self, a, esize);
        self.track_saturation(r);
        let result = self.scalar_result(esize, r);
        self.set_v_full(op.rd, result);
    }

    fn saturated_vector_unary(&mut self, op: &OpDescriptor, f: SaturatedUnary<'a>) {
        if op.size == 3 && op.is_half() {
            self.reserved(op);
        }
        let esize = op.esize();
        self.lanes_unary(op, false, |v, a| {
            let r = f(v, a, esize);
            v.track_saturation(r);
            r
        });
    }

    // --- Add / subtract ---

    pub fn sqadd_s(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_scalar(op, |v, a, b, esize| v.ir.signed_saturated_add(a, b, esize));
        true
    }

    pub fn sqadd_v(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_vector(op, |v, a, b, esize| v.ir.signed_saturated_add(a, b, esize));
        true
    }

    pub fn uqadd_s(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_scalar(op, |v, a, b, esize| v.ir.unsigned_saturated_add(a, b, esize));
        true
    }

    pub fn uqadd_v(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_vector(op, |v, a, b, esize| v.ir.unsigned_saturated_add(a, b, esize));
        true
    }

    pub fn sqsub_s(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_scalar(op, |v, a, b, esize| v.ir.signed_saturated_sub(a, b, esize));
        true
    }

    pub fn sqsub_v(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_vector(op, |v, a, b, esize| v.ir.signed_saturated_sub(a, b, esize));
        true
    }

    pub fn uqsub_s(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_scalar(op, |v, a, b, esize| v.ir.unsigned_saturated_sub(a, b, esize));
        true
    }

    pub fn uqsub_v(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_vector(op, |v, a, b, esize| v.ir.unsigned_saturated_sub(a, b, esize));
        true
    }

    // --- Accumulate (d is both accumulator and destination) ---

    pub fn suqadd_s(&mut self, op: &OpDescriptor) -> bool {
        let op = op.with_regs(op.rd, op.rd, op.rn);
        self.saturated_scalar(&op, |v, acc, addend, esize| {
            v.ir.signed_saturated_accumulate_unsigned(acc, addend, esize)
        });
        true
    }

    pub fn suqadd_v(&mut self, op: &OpDescriptor) -> bool {
        let op = op.with_regs(op.rd, op.rd, op.rn);
        self.saturated_vector(&op, |v, acc, addend, esize| {
            v.ir.signed_saturated_accumulate_unsigned(acc, addend, esize)
        });
        true
    }

    pub fn usqadd_s(&mut self, op: &OpDescriptor) -> bool {
        let op = op.with_regs(op.rd, op.rd, op.rn);
        self.saturated_scalar(&op, |v, acc, addend, esize| {
            v.ir.unsigned_saturated_accumulate_signed(acc, addend, esize)
        });
        true
    }

    pub fn usqadd_v(&mut self, op: &OpDescriptor) -> bool {
        let op = op.with_regs(op.rd, op.rd, op.rn);
        self.saturated_vector(&op, |v, acc, addend, esize| {
            v.ir.unsigned_saturated_accumulate_signed(acc, addend, esize)
        });
        true
    }

    // --- Negate / absolute ---

    pub fn sqabs_s(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_scalar_unary(op, |v, a, esize| v.ir.signed_saturated_abs(a, esize));
        true
    }

    pub fn sqabs_v(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_vector_unary(op, |v, a, esize| v.ir.signed_saturated_abs(a, esize));
        true
    }

    pub fn sqneg_s(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_scalar_unary(op, |v, a, esize| v.ir.signed_saturated_neg(a, esize));
        true
    }

    pub fn sqneg_v(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_vector_unary(op, |v, a, esize| v.ir.signed_saturated_neg(a, esize));
        true
    }

    // --- Doubling multiply high ---

    fn check_doubling_size(&self, op: &OpDescriptor) {
        if op.size != 1 && op.size != 2 {
            self.reserved(op);
        }
    }

    pub fn sqdmulh_s(&mut self, op: &OpDescriptor) -> bool {
        self.check_doubling_size(op);
        self.saturated_scalar(op, |v, a, b, esize| {
            v.ir.signed_saturated_doubling_multiply_return_high(a, b, esize, false)
        });
        true
    }

    pub fn sqdmulh_v(&mut self, op: &OpDescriptor) -> bool {
        self.check_doubling_size(op);
        self.saturated_vector(op, |v, a, b, esize| {
            v.ir.signed_saturated_doubling_multiply_return_high(a, b, esize, false)
        });
        true
    }

    pub fn sqrdmulh_s(&mut self, op: &OpDescriptor) -> bool {
        self.check_doubling_size(op);
        self.saturated_scalar(op, |v, a, b, esize| {
            v.ir.signed_saturated_doubling_multiply_return_high(a, b, esize, true)
        });
        true
    }

    pub fn sqrdmulh_v(&mut self, op: &OpDescriptor) -> bool {
        self.check_doubling_size(op);
        self.saturated_vector(op, |v, a, b, esize| {
            v.ir.signed_saturated_doubling_multiply_return_high(a, b, esize, true)
        });
        true
    }

    // --- Saturating extract narrow ---

    /// Scalar narrow: lane 0 of `n` (double width) into lane 0 of `d`.
    fn saturated_narrow_scalar(&mut self, op: &OpDescriptor, f: SaturatedUnary<'a>) {
        let esize = op.esize();
        if esize == 64 {
            self.reserved(op);
        }
        let n = self.v(op.rn);
        let a = self.extract(n, 0, esize * 2, false);
        let r = f(self, a, esize);
        self.track_saturation(r);
        let result = self.scalar_result(esize, r);
        self.set_v_full(op.rd, result);
    }

    fn saturated_narrow_vector(&mut self, op: &OpDescriptor, f: SaturatedUnary<'a>) {
        let esize = op.esize();
        self.lanes_narrow(op, false, false, |v, a, _| {
            let r = f(v, a, esize);
            v.track_saturation(r);
            r
        });
    }

    pub fn sqxtn_s(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_narrow_scalar(op, |v, a, esize| v.ir.signed_saturated_narrow_to_signed(a, esize));
        true
    }

    pub fn sqxtn_v(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_narrow_vector(op, |v, a, esize| v.ir.signed_saturated_narrow_to_signed(a, esize));
        true
    }

    pub fn sqxtun_s(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_narrow_scalar(op, |v, a, esize| v.ir.signed_saturated_narrow_to_unsigned(a, esize));
        true
    }

    pub fn sqxtun_v(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_narrow_vector(op, |v, a, esize| v.ir.signed_saturated_narrow_to_unsigned(a, esize));
        true
    }

    pub fn uqxtn_s(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_narrow_scalar(op, |v, a, esize| v.ir.unsigned_saturated_narrow(a, esize));
        true
    }

    pub fn uqxtn_v(&mut self, op: &OpDescriptor) -> bool {
        self.saturated_narrow_vector(op, |v, a, esize| v.ir.unsigned_saturated_narrow(a, esize));
        true
    }
}
