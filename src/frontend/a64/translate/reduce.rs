//! Pairwise operations and reductions across lanes. Floating-point folds always take the
//! software path; their rounding depends on the ascending evaluation order.

use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::translate::visitor::TranslatorVisitor;
use crate::ir::value::Value;

impl<'a> TranslatorVisitor<'a> {
    /// Across-lane integer forms: 8B, 16B, 4H, 8H and 4S.
    fn check_across(&self, op: &OpDescriptor) {
        if op.size == 3 || (op.size == 2 && op.is_half()) {
            self.reserved(op);
        }
    }

    /// Across-lane float forms exist for 4S only.
    fn check_fp_across(&self, op: &OpDescriptor) {
        if op.size != 0 || op.is_half() {
            self.reserved(op);
        }
    }

    fn max_min_op(&mut self, a: Value, b: Value, signed: bool, max: bool) -> Value {
        if max {
            self.ir.max_64(a, b, signed)
        } else {
            self.ir.min_64(a, b, signed)
        }
    }

    // --- Integer pairwise ---

    pub fn addp_s(&mut self, op: &OpDescriptor) -> bool {
        if op.size != 3 {
            self.reserved(op);
        }
        let n = self.v(op.rn);
        let a = self.extract(n, 0, 64, false);
        let b = self.extract(n, 1, 64, false);
        let sum = self.ir.add_64(a, b);
        let result = self.scalar_result(64, sum);
        self.set_v_full(op.rd, result);
        true
    }

    pub fn addp_v(&mut self, op: &OpDescriptor) -> bool {
        if op.size == 3 && op.is_half() {
            self.reserved(op);
        }
        self.lanes_pairwise(op, false, |v, a, b| v.ir.add_64(a, b));
        true
    }

    fn max_min_pairwise(&mut self, op: &OpDescriptor, signed: bool, max: bool) {
        if op.size == 3 {
            self.reserved(op);
        }
        self.lanes_pairwise(op, signed, |v, a, b| v.max_min_op(a, b, signed, max));
    }

    pub fn smaxp(&mut self, op: &OpDescriptor) -> bool {
        self.max_min_pairwise(op, true, true);
        true
    }

    pub fn umaxp(&mut self, op: &OpDescriptor) -> bool {
        self.max_min_pairwise(op, false, true);
        true
    }

    pub fn sminp(&mut self, op: &OpDescriptor) -> bool {
        self.max_min_pairwise(op, true, false);
        true
    }

    pub fn uminp(&mut self, op: &OpDescriptor) -> bool {
        self.max_min_pairwise(op, false, false);
        true
    }

    /// `d[i] = n[2i] + n[2i+1]` at double width, optionally added to the existing `d[i]`.
    fn add_long_pairwise(&mut self, op: &OpDescriptor, signed: bool, accumulate: bool) {
        if op.size == 3 {
            self.reserved(op);
        }
        let esize = op.esize();
        let n = self.v(op.rn);
        let d = self.v(op.rd);
        let mut result = self.ir.zero_vector();
        for i in 0..op.lanes() / 2 {
            let a = self.extract(n, 2 * i, esize, signed);
            let b = self.extract(n, 2 * i + 1, esize, signed);
            let mut sum = self.ir.add_64(a, b);
            if accumulate {
                let acc = self.extract(d, i, esize * 2, signed);
                sum = self.ir.add_64(acc, sum);
            }
            result = self.insert(result, i, esize * 2, sum);
        }
        self.set_v(op, op.rd, result);
    }

    pub fn saddlp(&mut self, op: &OpDescriptor) -> bool {
        self.add_long_pairwise(op, true, false);
        true
    }

    pub fn uaddlp(&mut self, op: &OpDescriptor) -> bool {
        self.add_long_pairwise(op, false, false);
        true
    }

    pub fn sadalp(&mut self, op: &OpDescriptor) -> bool {
        self.add_long_pairwise(op, true, true);
        true
    }

    pub fn uadalp(&mut self, op: &OpDescriptor) -> bool {
        self.add_long_pairwise(op, false, true);
        true
    }

    // --- Integer across ---

    pub fn addv(&mut self, op: &OpDescriptor) -> bool {
        self.check_across(op);
        let sum = self.reduce_across(op, false, |v, a, b| v.ir.add_64(a, b));
        let result = self.scalar_result(op.esize(), sum);
        self.set_v_full(op.rd, result);
        true
    }

    fn add_long_across(&mut self, op: &OpDescriptor, signed: bool) {
        self.check_across(op);
        let sum = self.reduce_across(op, signed, |v, a, b| v.ir.add_64(a, b));
        let result = self.scalar_result(op.esize() * 2, sum);
        self.set_v_full(op.rd, result);
    }

    pub fn saddlv(&mut self, op: &OpDescriptor) -> bool {
        self.add_long_across(op, true);
        true
    }

    pub fn uaddlv(&mut self, op: &OpDescriptor) -> bool {
        self.add_long_across(op, false);
        true
    }

    fn max_min_across(&mut self, op: &OpDescriptor, signed: bool, max: bool) {
        self.check_across(op);
        let r = self.reduce_across(op, signed, |v, a, b| v.max_min_op(a, b, signed, max));
        let result = self.scalar_result(op.esize(), r);
        self.set_v_full(op.rd, result);
    }

    pub fn smaxv(&mut self, op: &OpDescriptor) -> bool {
        self.max_min_across(op, true, true);
        true
    }

    pub fn umaxv(&mut self, op: &OpDescriptor) -> bool {
        self.max_min_across(op, false, true);
        true
    }

    pub fn sminv(&mut self, op: &OpDescriptor) -> bool {
        self.max_min_across(op, true, false);
        true
    }

    pub fn uminv(&mut self, op: &OpDescriptor) -> bool {
        self.max_min_across(op, false, false);
        true
    }

    // --- Floating-point pairwise ---

    fn fp_pairwise(
        &mut self,
        op: &OpDescriptor,
        f: fn(&mut TranslatorVisitor<'a>, usize, Value, Value) -> Value,
    ) {
        self.check_fp_vector(op);
        let fsize = op.fp_esize();
        let lanes = op.fp_lanes();
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let mut result = self.ir.zero_vector();
        for i in 0..lanes {
            let (source, j) = if i < lanes / 2 { (n, 2 * i) } else { (m, 2 * (i - lanes / 2)) };
            let a = self.extract_raw(source, j, fsize);
            let b = self.extract_raw(source, j + 1, fsize);
            let r = f(self, fsize, a, b);
            result = self.insert(result, i, fsize, r);
        }
        self.set_v(op, op.rd, result);
    }

    pub fn faddp_s(&mut self, op: &OpDescriptor) -> bool {
        self.check_fp_scalar(op);
        let fsize = op.fp_esize();
        let n = self.v(op.rn);
        let a = self.extract_raw(n, 0, fsize);
        let b = self.extract_raw(n, 1, fsize);
        let sum = self.ir.fp_add(fsize, a, b);
        let result = self.scalar_result(fsize, sum);
        self.set_v_full(op.rd, result);
        true
    }

    pub fn faddp_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_pairwise(op, |v, fsize, a, b| v.ir.fp_add(fsize, a, b));
        true
    }

    pub fn fmaxp_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_pairwise(op, |v, fsize, a, b| v.ir.fp_max(fsize, a, b));
        true
    }

    pub fn fminp_v(&mut self, op: &OpDescriptor) -> bool {
        self.fp_pairwise(op, |v, fsize, a, b| v.ir.fp_min(fsize, a, b));
        true
    }

    // --- Floating-point across ---

    fn fp_across(
        &mut self,
        op: &OpDescriptor,
        f: fn(&mut TranslatorVisitor<'a>, usize, Value, Value) -> Value,
    ) {
        self.check_fp_across(op);
        let r = self.fp_reduce_across(op, f);
        let result = self.scalar_result(32, r);
        self.set_v_full(op.rd, result);
    }

    pub fn fmaxv(&mut self, op: &OpDescriptor) -> bool {
        self.fp_across(op, |v, fsize, a, b| v.ir.fp_max(fsize, a, b));
        true
    }

    pub fn fminv(&mut self, op: &OpDescriptor) -> bool {
        self.fp_across(op, |v, fsize, a, b| v.ir.fp_min(fsize, a, b));
        true
    }

    pub fn fmaxnmv(&mut self, op: &OpDescriptor) -> bool {
        self.fp_across(op, |v, fsize, a, b| v.ir.fp_max_numeric(fsize, a, b));
        true
    }

    pub fn fminnmv(&mut self, op: &OpDescriptor) -> bool {
        self.fp_across(op, |v, fsize, a, b| v.ir.fp_min_numeric(fsize, a, b));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitConfig;
    use crate::frontend::a64::types::InstName;
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    #[test]
    fn test_addv_folds_every_lane() {
        let mut block = Block::new(0);
        {
            let mut v = TranslatorVisitor::new(&mut block, EmitConfig::portable());
            v.addv(&OpDescriptor::new(InstName::ADDV).with_size(0));
        }
        assert_eq!(block.count_opcode(Opcode::Add64), 15);
        assert_eq!(block.count_opcode(Opcode::VectorSetElement8), 1);
    }

    #[test]
    fn test_fp_reduction_is_software_even_with_fast_fp() {
        let mut block = Block::new(0);
        let config = EmitConfig::portable()
            .with_host(crate::host_features::HostFeature::SSE | crate::host_features::HostFeature::SSE2)
            .with_fast_fp(true);
        {
            let mut v = TranslatorVisitor::new(&mut block, config);
            v.fmaxv(&OpDescriptor::new(InstName::FMAXV));
        }
        assert_eq!(block.count_opcode(Opcode::FPMax32), 3);
        assert!(!block.contains_opcode(Opcode::FPVectorMax32));
    }

    #[test]
    #[should_panic(expected = "ADDV: reserved encoding")]
    fn test_addv_rejects_2s() {
        let mut block = Block::new(0);
        let mut v = TranslatorVisitor::new(&mut block, EmitConfig::portable());
        v.addv(&OpDescriptor::new(InstName::ADDV).with_size(2).half());
    }
}
