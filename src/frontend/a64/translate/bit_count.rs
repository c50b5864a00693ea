use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::translate::visitor::TranslatorVisitor;
use crate::ir::value::Value;

impl<'a> TranslatorVisitor<'a> {
    /// Leading zeros of a 64-bit value, native when the host has a count instruction.
    fn count_leading_zeros_64(&mut self, value: Value) -> Value {
        if self.native_count_leading_zeros() {
            self.ir.count_leading_zeros_64(value)
        } else {
            self.ir.count_leading_zeros_fallback(value, 64)
        }
    }

    /// CLS: leading bits equal to the sign bit, not counting the sign bit itself.
    pub fn cls(&mut self, op: &OpDescriptor) -> bool {
        if op.size == 3 {
            self.reserved(op);
        }
        let esize = op.esize();
        self.lanes_unary(op, true, |v, a| {
            // Bit k of `a ^ (a >> 1)` is set where bits k and k+1 of the lane differ.
            let shifted = v.ir.arithmetic_shift_right_64(a, 1);
            let changes = v.ir.eor_64(a, shifted);
            let zeros = v.count_leading_zeros_64(changes);
            let bias = v.ir.imm64((64 - esize + 1) as u64);
            v.ir.sub_64(zeros, bias)
        });
        true
    }

    pub fn clz(&mut self, op: &OpDescriptor) -> bool {
        if op.size == 3 {
            self.reserved(op);
        }
        let esize = op.esize();
        if esize == 32 && self.native_count_leading_zeros() {
            let n = self.v(op.rn);
            let mut result = self.ir.zero_vector();
            for i in 0..op.lanes() {
                let lane = self.extract_raw(n, i, 32);
                let zeros = self.ir.count_leading_zeros_32(lane);
                result = self.insert(result, i, 32, zeros);
            }
            self.set_v(op, op.rd, result);
            return true;
        }
        self.lanes_unary(op, false, |v, a| v.ir.count_leading_zeros_fallback(a, esize as u8));
        true
    }

    pub fn cnt(&mut self, op: &OpDescriptor) -> bool {
        if op.size != 0 {
            self.reserved(op);
        }
        let native = self.native_population_count();
        self.lanes_unary(op, false, |v, a| {
            if native {
                v.ir.population_count(a)
            } else {
                v.ir.population_count_fallback_8(a)
            }
        });
        true
    }
}
