use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::translate::visitor::TranslatorVisitor;
use crate::host_features::HostFeature;
use crate::ir::value::Value;

/// x86 tier needed for a native lane-wise max/min.
fn max_min_tier(esize: usize, signed: bool) -> HostFeature {
    match (esize, signed) {
        (8, false) | (16, true) => HostFeature::SSE2,
        _ => HostFeature::SSE41,
    }
}

/// x86 tier needed for a native lane-wise multiply. There is no x86 byte multiply.
fn multiply_tier(esize: usize) -> HostFeature {
    match esize {
        16 => HostFeature::SSE2,
        32 => HostFeature::SSE41,
        _ => HostFeature::empty(),
    }
}

impl<'a> TranslatorVisitor<'a> {
    /// Vector forms without a 1D arrangement.
    fn check_no_1d(&self, op: &OpDescriptor) {
        if op.size == 3 && op.is_half() {
            self.reserved(op);
        }
    }

    /// Integer forms limited to 8, 16 and 32-bit lanes.
    fn check_no_64(&self, op: &OpDescriptor) {
        if op.size == 3 {
            self.reserved(op);
        }
    }

    /// Scalar forms that only exist for 64-bit elements.
    fn scalar_d_only(
        &mut self,
        op: &OpDescriptor,
        f: impl FnOnce(&mut Self, Value, Value) -> Value,
    ) -> bool {
        if op.size != 3 {
            self.reserved(op);
        }
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let a = self.extract(n, 0, 64, false);
        let b = self.extract(m, 0, 64, false);
        let r = f(self, a, b);
        let result = self.scalar_result(64, r);
        self.set_v_full(op.rd, result);
        true
    }

    /// Upper half of `vector` moved down to the low half, for native "2" widening forms.
    fn upper_to_lower(&mut self, vector: Value) -> Value {
        let zero = self.ir.zero_vector();
        self.ir.vector_extract(vector, zero, 64)
    }

    // --- Basic arithmetic ---

    pub fn abs_s(&mut self, op: &OpDescriptor) -> bool {
        self.scalar_d_only(op, |v, a, _| v.ir.abs_64(a))
    }

    pub fn abs_v(&mut self, op: &OpDescriptor) -> bool {
        self.check_no_1d(op);
        let esize = op.esize();
        if esize <= 32 && self.native_integer(HostFeature::SSSE3) {
            let n = self.v(op.rn);
            let result = self.ir.vector_abs(esize, n);
            self.set_v(op, op.rd, result);
            return true;
        }
        self.lanes_unary(op, true, |v, a| v.ir.abs_64(a));
        true
    }

    pub fn add_s(&mut self, op: &OpDescriptor) -> bool {
        self.scalar_d_only(op, |v, a, b| v.ir.add_64(a, b))
    }

    pub fn add_v(&mut self, op: &OpDescriptor) -> bool {
        self.check_no_1d(op);
        if self.native_integer(HostFeature::SSE2) {
            let n = self.v(op.rn);
            let m = self.v(op.rm);
            let result = self.ir.vector_add(op.esize(), n, m);
            self.set_v(op, op.rd, result);
            return true;
        }
        self.lanes_binary(op, false, |v, a, b| v.ir.add_64(a, b));
        true
    }

    pub fn sub_s(&mut self, op: &OpDescriptor) -> bool {
        self.scalar_d_only(op, |v, a, b| v.ir.sub_64(a, b))
    }

    pub fn sub_v(&mut self, op: &OpDescriptor) -> bool {
        self.check_no_1d(op);
        if self.native_integer(HostFeature::SSE2) {
            let n = self.v(op.rn);
            let m = self.v(op.rm);
            let result = self.ir.vector_sub(op.esize(), n, m);
            self.set_v(op, op.rd, result);
            return true;
        }
        self.lanes_binary(op, false, |v, a, b| v.ir.sub_64(a, b));
        true
    }

    pub fn neg_s(&mut self, op: &OpDescriptor) -> bool {
        self.scalar_d_only(op, |v, a, _| {
            let zero = v.ir.imm64(0);
            v.ir.sub_64(zero, a)
        })
    }

    pub fn neg_v(&mut self, op: &OpDescriptor) -> bool {
        self.check_no_1d(op);
        if self.native_integer(HostFeature::SSE2) {
            let zero = self.ir.zero_vector();
            let n = self.v(op.rn);
            let result = self.ir.vector_sub(op.esize(), zero, n);
            self.set_v(op, op.rd, result);
            return true;
        }
        self.lanes_unary(op, false, |v, a| {
            let zero = v.ir.imm64(0);
            v.ir.sub_64(zero, a)
        });
        true
    }

    // --- Multiply ---

    pub fn mul_v(&mut self, op: &OpDescriptor) -> bool {
        self.check_no_64(op);
        let esize = op.esize();
        if self.native_integer(multiply_tier(esize)) {
            let n = self.v(op.rn);
            let m = self.v(op.rm);
            let result = self.ir.vector_multiply(esize, n, m);
            self.set_v(op, op.rd, result);
            return true;
        }
        self.lanes_binary(op, false, |v, a, b| v.ir.mul_64(a, b));
        true
    }

    fn multiply_accumulate(&mut self, op: &OpDescriptor, subtract: bool) {
        self.check_no_64(op);
        let esize = op.esize();
        if self.native_integer(multiply_tier(esize)) {
            let d = self.v(op.rd);
            let n = self.v(op.rn);
            let m = self.v(op.rm);
            let product = self.ir.vector_multiply(esize, n, m);
            let result = if subtract {
                self.ir.vector_sub(esize, d, product)
            } else {
                self.ir.vector_add(esize, d, product)
            };
            self.set_v(op, op.rd, result);
            return;
        }
        self.lanes_ternary(op, false, |v, acc, a, b| {
            let product = v.ir.mul_64(a, b);
            if subtract {
                v.ir.sub_64(acc, product)
            } else {
                v.ir.add_64(acc, product)
            }
        });
    }

    pub fn mla_v(&mut self, op: &OpDescriptor) -> bool {
        self.multiply_accumulate(op, false);
        true
    }

    pub fn mls_v(&mut self, op: &OpDescriptor) -> bool {
        self.multiply_accumulate(op, true);
        true
    }

    /// By-element multiplies exist for 16 and 32-bit lanes only.
    fn check_by_element_size(&self, op: &OpDescriptor) {
        if op.size != 1 && op.size != 2 {
            self.reserved(op);
        }
    }

    pub fn mul_ve(&mut self, op: &OpDescriptor) -> bool {
        self.check_by_element_size(op);
        self.lanes_by_element(op, false, |v, _, a, b| v.ir.mul_64(a, b));
        true
    }

    pub fn mla_ve(&mut self, op: &OpDescriptor) -> bool {
        self.check_by_element_size(op);
        self.lanes_by_element(op, false, |v, acc, a, b| {
            let product = v.ir.mul_64(a, b);
            v.ir.add_64(acc, product)
        });
        true
    }

    pub fn mls_ve(&mut self, op: &OpDescriptor) -> bool {
        self.check_by_element_size(op);
        self.lanes_by_element(op, false, |v, acc, a, b| {
            let product = v.ir.mul_64(a, b);
            v.ir.sub_64(acc, product)
        });
        true
    }

    // --- High narrowing ---

    /// `(n ± m [+ half]) >> esize` into half-width lanes.
    fn high_narrow(&mut self, op: &OpDescriptor, subtract: bool, round: bool) {
        let esize = op.esize();
        self.lanes_narrow(op, false, true, |v, a, b| {
            let mut sum = if subtract { v.ir.sub_64(a, b) } else { v.ir.add_64(a, b) };
            if round {
                let half = v.ir.imm64(1 << (esize - 1));
                sum = v.ir.add_64(sum, half);
            }
            v.ir.logical_shift_right_64(sum, esize as u8)
        });
    }

    pub fn addhn(&mut self, op: &OpDescriptor) -> bool {
        self.high_narrow(op, false, false);
        true
    }

    pub fn raddhn(&mut self, op: &OpDescriptor) -> bool {
        self.high_narrow(op, false, true);
        true
    }

    pub fn subhn(&mut self, op: &OpDescriptor) -> bool {
        self.high_narrow(op, true, false);
        true
    }

    pub fn rsubhn(&mut self, op: &OpDescriptor) -> bool {
        self.high_narrow(op, true, true);
        true
    }

    // --- Absolute difference ---

    fn absolute_difference(&mut self, op: &OpDescriptor, signed: bool, accumulate: bool) {
        self.check_no_64(op);
        self.lanes_ternary(op, signed, |v, acc, a, b| {
            let diff = v.ir.sub_64(a, b);
            let diff = v.ir.abs_64(diff);
            if accumulate {
                v.ir.add_64(acc, diff)
            } else {
                diff
            }
        });
    }

    pub fn sabd(&mut self, op: &OpDescriptor) -> bool {
        self.absolute_difference(op, true, false);
        true
    }

    pub fn uabd(&mut self, op: &OpDescriptor) -> bool {
        self.absolute_difference(op, false, false);
        true
    }

    pub fn saba(&mut self, op: &OpDescriptor) -> bool {
        self.absolute_difference(op, true, true);
        true
    }

    pub fn uaba(&mut self, op: &OpDescriptor) -> bool {
        self.absolute_difference(op, false, true);
        true
    }

    fn absolute_difference_long(&mut self, op: &OpDescriptor, signed: bool, accumulate: bool) {
        self.lanes_widen(op, signed, accumulate, |v, acc, a, b| {
            let diff = v.ir.sub_64(a, b);
            let diff = v.ir.abs_64(diff);
            if accumulate {
                v.ir.add_64(acc, diff)
            } else {
                diff
            }
        });
    }

    pub fn sabdl(&mut self, op: &OpDescriptor) -> bool {
        self.absolute_difference_long(op, true, false);
        true
    }

    pub fn uabdl(&mut self, op: &OpDescriptor) -> bool {
        self.absolute_difference_long(op, false, false);
        true
    }

    pub fn sabal(&mut self, op: &OpDescriptor) -> bool {
        self.absolute_difference_long(op, true, true);
        true
    }

    pub fn uabal(&mut self, op: &OpDescriptor) -> bool {
        self.absolute_difference_long(op, false, true);
        true
    }

    // --- Long and wide add/subtract ---

    fn add_sub_long(&mut self, op: &OpDescriptor, signed: bool, subtract: bool) {
        let esize = op.esize();
        if esize < 64 && self.native_integer(HostFeature::SSE41) {
            let mut n = self.v(op.rn);
            let mut m = self.v(op.rm);
            if op.register_size.is_full() {
                n = self.upper_to_lower(n);
                m = self.upper_to_lower(m);
            }
            let n = self.ir.vector_extend(esize, n, signed);
            let m = self.ir.vector_extend(esize, m, signed);
            let result = if subtract {
                self.ir.vector_sub(esize * 2, n, m)
            } else {
                self.ir.vector_add(esize * 2, n, m)
            };
            self.set_v_full(op.rd, result);
            return;
        }
        self.lanes_widen(op, signed, false, |v, _, a, b| {
            if subtract {
                v.ir.sub_64(a, b)
            } else {
                v.ir.add_64(a, b)
            }
        });
    }

    pub fn saddl(&mut self, op: &OpDescriptor) -> bool {
        self.add_sub_long(op, true, false);
        true
    }

    pub fn uaddl(&mut self, op: &OpDescriptor) -> bool {
        self.add_sub_long(op, false, false);
        true
    }

    pub fn ssubl(&mut self, op: &OpDescriptor) -> bool {
        self.add_sub_long(op, true, true);
        true
    }

    pub fn usubl(&mut self, op: &OpDescriptor) -> bool {
        self.add_sub_long(op, false, true);
        true
    }

    pub fn saddw(&mut self, op: &OpDescriptor) -> bool {
        self.lanes_wide(op, true, |v, a, b| v.ir.add_64(a, b));
        true
    }

    pub fn uaddw(&mut self, op: &OpDescriptor) -> bool {
        self.lanes_wide(op, false, |v, a, b| v.ir.add_64(a, b));
        true
    }

    pub fn ssubw(&mut self, op: &OpDescriptor) -> bool {
        self.lanes_wide(op, true, |v, a, b| v.ir.sub_64(a, b));
        true
    }

    pub fn usubw(&mut self, op: &OpDescriptor) -> bool {
        self.lanes_wide(op, false, |v, a, b| v.ir.sub_64(a, b));
        true
    }

    // --- Long multiply ---

    fn multiply_long(&mut self, op: &OpDescriptor, signed: bool, accumulate: Option<bool>) {
        self.lanes_widen(op, signed, accumulate.is_some(), |v, acc, a, b| {
            let product = v.ir.mul_64(a, b);
            match accumulate {
                Some(true) => v.ir.sub_64(acc, product),
                Some(false) => v.ir.add_64(acc, product),
                None => product,
            }
        });
    }

    pub fn smull(&mut self, op: &OpDescriptor) -> bool {
        self.multiply_long(op, true, None);
        true
    }

    pub fn umull(&mut self, op: &OpDescriptor) -> bool {
        self.multiply_long(op, false, None);
        true
    }

    pub fn smlal(&mut self, op: &OpDescriptor) -> bool {
        self.multiply_long(op, true, Some(false));
        true
    }

    pub fn umlal(&mut self, op: &OpDescriptor) -> bool {
        self.multiply_long(op, false, Some(false));
        true
    }

    pub fn smlsl(&mut self, op: &OpDescriptor) -> bool {
        self.multiply_long(op, true, Some(true));
        true
    }

    pub fn umlsl(&mut self, op: &OpDescriptor) -> bool {
        self.multiply_long(op, false, Some(true));
        true
    }

    // --- Halving add/subtract ---

    fn halving(&mut self, op: &OpDescriptor, signed: bool, subtract: bool, round: bool) {
        self.check_no_64(op);
        self.lanes_binary(op, signed, |v, a, b| {
            let mut r = if subtract { v.ir.sub_64(a, b) } else { v.ir.add_64(a, b) };
            if round {
                let one = v.ir.imm64(1);
                r = v.ir.add_64(r, one);
            }
            // Lanes are at most 32 bits, so the 64-bit intermediate holds the carry and sign.
            v.ir.arithmetic_shift_right_64(r, 1)
        });
    }

    pub fn shadd(&mut self, op: &OpDescriptor) -> bool {
        self.halving(op, true, false, false);
        true
    }

    pub fn uhadd(&mut self, op: &OpDescriptor) -> bool {
        self.halving(op, false, false, false);
        true
    }

    pub fn shsub(&mut self, op: &OpDescriptor) -> bool {
        self.halving(op, true, true, false);
        true
    }

    pub fn uhsub(&mut self, op: &OpDescriptor) -> bool {
        self.halving(op, false, true, false);
        true
    }

    pub fn srhadd(&mut self, op: &OpDescriptor) -> bool {
        self.halving(op, true, false, true);
        true
    }

    pub fn urhadd(&mut self, op: &OpDescriptor) -> bool {
        let esize = op.esize();
        if esize <= 16 && self.native_integer(HostFeature::SSE2) {
            let n = self.v(op.rn);
            let m = self.v(op.rm);
            let result = self.ir.vector_rounding_halving_add_unsigned(esize, n, m);
            self.set_v(op, op.rd, result);
            return true;
        }
        self.halving(op, false, false, true);
        true
    }

    // --- Max/min ---

    fn max_min(&mut self, op: &OpDescriptor, signed: bool, max: bool) {
        self.check_no_64(op);
        let esize = op.esize();
        if self.native_integer(max_min_tier(esize, signed)) {
            let n = self.v(op.rn);
            let m = self.v(op.rm);
            let result = if max {
                self.ir.vector_max(esize, n, m, signed)
            } else {
                self.ir.vector_min(esize, n, m, signed)
            };
            self.set_v(op, op.rd, result);
            return;
        }
        self.lanes_binary(op, signed, |v, a, b| {
            if max {
                v.ir.max_64(a, b, signed)
            } else {
                v.ir.min_64(a, b, signed)
            }
        });
    }

    pub fn smax(&mut self, op: &OpDescriptor) -> bool {
        self.max_min(op, true, true);
        true
    }

    pub fn umax(&mut self, op: &OpDescriptor) -> bool {
        self.max_min(op, false, true);
        true
    }

    pub fn smin(&mut self, op: &OpDescriptor) -> bool {
        self.max_min(op, true, false);
        true
    }

    pub fn umin(&mut self, op: &OpDescriptor) -> bool {
        self.max_min(op, false, false);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmitConfig, OptimizationFlag};
    use crate::frontend::a64::types::{InstName, Vec};
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    fn emit(config: EmitConfig, f: impl FnOnce(&mut TranslatorVisitor<'_>)) -> Block {
        let mut block = Block::new(0);
        {
            let mut v = TranslatorVisitor::new(&mut block, config);
            f(&mut v);
        }
        block
    }

    fn native_sse41() -> EmitConfig {
        let mut config = EmitConfig::portable().with_host(
            HostFeature::SSE | HostFeature::SSE2 | HostFeature::SSSE3 | HostFeature::SSE41,
        );
        config.optimizations |= OptimizationFlag::NATIVE_INTEGER_VECTORS;
        config
    }

    #[test]
    fn test_add_v_path_selection() {
        let op = OpDescriptor::new(InstName::ADD_V).with_size(2);
        let native = emit(native_sse41(), |v| {
            v.add_v(&op);
        });
        assert!(native.contains_opcode(Opcode::VectorAdd32));
        assert!(!native.contains_opcode(Opcode::Add64));

        let portable = emit(EmitConfig::portable(), |v| {
            v.add_v(&op);
        });
        assert!(!portable.contains_opcode(Opcode::VectorAdd32));
        assert_eq!(portable.count_opcode(Opcode::Add64), 4);
    }

    #[test]
    fn test_byte_multiply_has_no_x86_form() {
        let op = OpDescriptor::new(InstName::MUL_V).with_size(0);
        let block = emit(native_sse41(), |v| {
            v.mul_v(&op);
        });
        assert!(!block.contains_opcode(Opcode::VectorMultiply8));
        assert_eq!(block.count_opcode(Opcode::Mul64), 16);
    }

    #[test]
    fn test_signed_byte_max_needs_sse41() {
        let op = OpDescriptor::new(InstName::SMAX).with_size(0);
        let mut config = native_sse41();
        config.host = HostFeature::SSE | HostFeature::SSE2;
        let block = emit(config, |v| {
            v.smax(&op);
        });
        assert!(!block.contains_opcode(Opcode::VectorMaxSigned8));
        assert!(block.contains_opcode(Opcode::MaxSigned64));
    }

    #[test]
    fn test_long_upper_form_reads_high_half() {
        let op = OpDescriptor::new(InstName::SADDL)
            .with_size(1)
            .with_regs(Vec::V0, Vec::V1, Vec::V2);
        let block = emit(EmitConfig::portable(), |v| {
            v.saddl(&op);
        });
        let text = block.to_string();
        assert!(text.contains("VectorGetElement16 %0, #0x4"));
        assert!(!text.contains("VectorGetElement16 %0, #0x0"));
    }

    #[test]
    #[should_panic(expected = "MUL_V: reserved encoding")]
    fn test_mul_64_is_reserved() {
        let op = OpDescriptor::new(InstName::MUL_V).with_size(3);
        emit(EmitConfig::portable(), |v| {
            v.mul_v(&op);
        });
    }

    #[test]
    #[should_panic(expected = "ADD_S: reserved encoding")]
    fn test_scalar_add_needs_64_bit_lanes() {
        let op = OpDescriptor::new(InstName::ADD_S).with_size(2);
        emit(EmitConfig::portable(), |v| {
            v.add_s(&op);
        });
    }
}
