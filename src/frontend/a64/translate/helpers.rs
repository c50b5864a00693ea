//! Lane-wise emission templates.
//!
//! Integer templates hand lanes to the per-lane operator sign- or zero-extended to 64 bits and
//! insert the low `esize` bits of its result. Floating-point templates pass raw lane patterns.
//! Lanes are always visited in ascending index order.

use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::translate::visitor::TranslatorVisitor;
use crate::ir::value::Value;

impl<'a> TranslatorVisitor<'a> {
    // --- Integer: same-width ---

    /// `d[i] = f(n[i])`
    pub(crate) fn lanes_unary(
        &mut self,
        op: &OpDescriptor,
        signed: bool,
        mut f: impl FnMut(&mut Self, Value) -> Value,
    ) {
        let esize = op.esize();
        let n = self.v(op.rn);
        let mut result = self.ir.zero_vector();
        for i in 0..op.lanes() {
            let a = self.extract(n, i, esize, signed);
            let r = f(self, a);
            result = self.insert(result, i, esize, r);
        }
        self.set_v(op, op.rd, result);
    }

    /// `d[i] = f(n[i], m[i])`
    pub(crate) fn lanes_binary(
        &mut self,
        op: &OpDescriptor,
        signed: bool,
        mut f: impl FnMut(&mut Self, Value, Value) -> Value,
    ) {
        let esize = op.esize();
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let mut result = self.ir.zero_vector();
        for i in 0..op.lanes() {
            let a = self.extract(n, i, esize, signed);
            let b = self.extract(m, i, esize, signed);
            let r = f(self, a, b);
            result = self.insert(result, i, esize, r);
        }
        self.set_v(op, op.rd, result);
    }

    /// `d[i] = f(d[i], n[i], m[i])`
    pub(crate) fn lanes_ternary(
        &mut self,
        op: &OpDescriptor,
        signed: bool,
        mut f: impl FnMut(&mut Self, Value, Value, Value) -> Value,
    ) {
        let esize = op.esize();
        let d = self.v(op.rd);
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let mut result = self.ir.zero_vector();
        for i in 0..op.lanes() {
            let acc = self.extract(d, i, esize, signed);
            let a = self.extract(n, i, esize, signed);
            let b = self.extract(m, i, esize, signed);
            let r = f(self, acc, a, b);
            result = self.insert(result, i, esize, r);
        }
        self.set_v(op, op.rd, result);
    }

    /// `d[i] = f(d[i], n[i], m[index])`
    pub(crate) fn lanes_by_element(
        &mut self,
        op: &OpDescriptor,
        signed: bool,
        mut f: impl FnMut(&mut Self, Value, Value, Value) -> Value,
    ) {
        let esize = op.esize();
        let index = op.index as usize;
        if index >= 128 / esize {
            self.reserved(op);
        }
        let d = self.v(op.rd);
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let element = self.extract(m, index, esize, signed);
        let mut result = self.ir.zero_vector();
        for i in 0..op.lanes() {
            let acc = self.extract(d, i, esize, signed);
            let a = self.extract(n, i, esize, signed);
            let r = f(self, acc, a, element);
            result = self.insert(result, i, esize, r);
        }
        self.set_v(op, op.rd, result);
    }

    // --- Integer: widening and narrowing ---

    /// Long forms. Reads `64 / esize` lanes of `n` and `m` from the low half, or from the high
    /// half for the "2" variant, and produces double-width lanes:
    /// `d[i] = f(d[i], n[i], m[i])` with `d[i]` read only when `accumulate`.
    pub(crate) fn lanes_widen(
        &mut self,
        op: &OpDescriptor,
        signed: bool,
        accumulate: bool,
        mut f: impl FnMut(&mut Self, Value, Value, Value) -> Value,
    ) {
        let esize = op.esize();
        if esize == 64 {
            self.reserved(op);
        }
        let lanes = 64 / esize;
        let base = if op.register_size.is_full() { lanes } else { 0 };
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let d = if accumulate { Some(self.v(op.rd)) } else { None };
        let mut result = self.ir.zero_vector();
        for i in 0..lanes {
            let acc = match d {
                Some(d) => self.extract(d, i, esize * 2, signed),
                None => self.ir.imm64(0),
            };
            let a = self.extract(n, base + i, esize, signed);
            let b = self.extract(m, base + i, esize, signed);
            let r = f(self, acc, a, b);
            result = self.insert(result, i, esize * 2, r);
        }
        self.set_v_full(op.rd, result);
    }

    /// Wide forms: `d[i] = f(n[i], m[i])` with `n` already double width and `m` read from the
    /// low or high half.
    pub(crate) fn lanes_wide(
        &mut self,
        op: &OpDescriptor,
        signed: bool,
        mut f: impl FnMut(&mut Self, Value, Value) -> Value,
    ) {
        let esize = op.esize();
        if esize == 64 {
            self.reserved(op);
        }
        let lanes = 64 / esize;
        let base = if op.register_size.is_full() { lanes } else { 0 };
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let mut result = self.ir.zero_vector();
        for i in 0..lanes {
            let a = self.extract(n, i, esize * 2, signed);
            let b = self.extract(m, base + i, esize, signed);
            let r = f(self, a, b);
            result = self.insert(result, i, esize * 2, r);
        }
        self.set_v_full(op.rd, result);
    }

    /// Narrowing forms: `esize` is the destination lane width. Double-width lanes of `n` (and
    /// `m` when `binary`) feed `f`, whose result is truncated to `esize`. The plain form writes
    /// the low half and clears the upper half; the "2" form writes the upper half and keeps the
    /// existing low half of `d`.
    pub(crate) fn lanes_narrow(
        &mut self,
        op: &OpDescriptor,
        signed: bool,
        binary: bool,
        mut f: impl FnMut(&mut Self, Value, Value) -> Value,
    ) {
        let esize = op.esize();
        if esize == 64 {
            self.reserved(op);
        }
        let lanes = 64 / esize;
        let upper = op.register_size.is_full();
        let n = self.v(op.rn);
        let m = if binary { Some(self.v(op.rm)) } else { None };
        let mut result = if upper { self.v(op.rd) } else { self.ir.zero_vector() };
        let base = if upper { lanes } else { 0 };
        for i in 0..lanes {
            let a = self.extract(n, i, esize * 2, signed);
            let b = match m {
                Some(m) => self.extract(m, i, esize * 2, signed),
                None => self.ir.imm64(0),
            };
            let r = f(self, a, b);
            result = self.insert(result, base + i, esize, r);
        }
        if !upper {
            result = self.clear_upper_half(result);
        }
        self.set_v_full(op.rd, result);
    }

    // --- Integer: pairwise and across ---

    /// `d = [f(n[0], n[1]), f(n[2], n[3]), ..., f(m[0], m[1]), ...]`
    pub(crate) fn lanes_pairwise(
        &mut self,
        op: &OpDescriptor,
        signed: bool,
        mut f: impl FnMut(&mut Self, Value, Value) -> Value,
    ) {
        let esize = op.esize();
        let lanes = op.lanes();
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let mut result = self.ir.zero_vector();
        for i in 0..lanes {
            let (source, j) = if i < lanes / 2 { (n, 2 * i) } else { (m, 2 * (i - lanes / 2)) };
            let a = self.extract(source, j, esize, signed);
            let b = self.extract(source, j + 1, esize, signed);
            let r = f(self, a, b);
            result = self.insert(result, i, esize, r);
        }
        self.set_v(op, op.rd, result);
    }

    /// Left-to-right fold of every lane of `n`: `f(f(f(n[0], n[1]), n[2]), ...)`.
    pub(crate) fn reduce_across(
        &mut self,
        op: &OpDescriptor,
        signed: bool,
        mut f: impl FnMut(&mut Self, Value, Value) -> Value,
    ) -> Value {
        let esize = op.esize();
        let n = self.v(op.rn);
        let mut acc = self.extract(n, 0, esize, signed);
        for i in 1..op.lanes() {
            let b = self.extract(n, i, esize, signed);
            acc = f(self, acc, b);
        }
        acc
    }

    // --- Floating point ---

    /// Reject encodings with no floating-point vector form (1D).
    pub(crate) fn check_fp_vector(&self, op: &OpDescriptor) {
        if op.size > 1 || (op.fp_esize() == 64 && op.is_half()) {
            self.reserved(op);
        }
    }

    pub(crate) fn check_fp_scalar(&self, op: &OpDescriptor) {
        if op.size > 1 {
            self.reserved(op);
        }
    }

    /// `d[i] = f(n[i])` on raw float lanes.
    pub(crate) fn fp_lanes_unary(
        &mut self,
        op: &OpDescriptor,
        mut f: impl FnMut(&mut Self, usize, Value) -> Value,
    ) {
        let fsize = op.fp_esize();
        let n = self.v(op.rn);
        let mut result = self.ir.zero_vector();
        for i in 0..op.fp_lanes() {
            let a = self.extract_raw(n, i, fsize);
            let r = f(self, fsize, a);
            result = self.insert(result, i, fsize, r);
        }
        self.set_v(op, op.rd, result);
    }

    /// `d[i] = f(n[i], m[i])` on raw float lanes.
    pub(crate) fn fp_lanes_binary(
        &mut self,
        op: &OpDescriptor,
        mut f: impl FnMut(&mut Self, usize, Value, Value) -> Value,
    ) {
        let fsize = op.fp_esize();
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let mut result = self.ir.zero_vector();
        for i in 0..op.fp_lanes() {
            let a = self.extract_raw(n, i, fsize);
            let b = self.extract_raw(m, i, fsize);
            let r = f(self, fsize, a, b);
            result = self.insert(result, i, fsize, r);
        }
        self.set_v(op, op.rd, result);
    }

    /// `d[i] = f(d[i], n[i], m[i])`, or `m[index]` for by-element forms.
    pub(crate) fn fp_lanes_ternary(
        &mut self,
        op: &OpDescriptor,
        by_element: bool,
        mut f: impl FnMut(&mut Self, usize, Value, Value, Value) -> Value,
    ) {
        let fsize = op.fp_esize();
        let d = self.v(op.rd);
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let element = if by_element {
            Some(self.fp_element(op, m))
        } else {
            None
        };
        let mut result = self.ir.zero_vector();
        for i in 0..op.fp_lanes() {
            let acc = self.extract_raw(d, i, fsize);
            let a = self.extract_raw(n, i, fsize);
            let b = match element {
                Some(element) => element,
                None => self.extract_raw(m, i, fsize),
            };
            let r = f(self, fsize, acc, a, b);
            result = self.insert(result, i, fsize, r);
        }
        self.set_v(op, op.rd, result);
    }

    /// `m[index]` for by-element forms.
    pub(crate) fn fp_element(&mut self, op: &OpDescriptor, m: Value) -> Value {
        let fsize = op.fp_esize();
        let index = op.index as usize;
        if index >= 128 / fsize {
            self.reserved(op);
        }
        self.extract_raw(m, index, fsize)
    }

    /// Scalar form: `d = f(n[0], m[0])` with the rest of `d` zeroed.
    pub(crate) fn fp_scalar_binary(
        &mut self,
        op: &OpDescriptor,
        mut f: impl FnMut(&mut Self, usize, Value, Value) -> Value,
    ) {
        self.check_fp_scalar(op);
        let fsize = op.fp_esize();
        let n = self.v(op.rn);
        let m = self.v(op.rm);
        let a = self.extract_raw(n, 0, fsize);
        let b = self.extract_raw(m, 0, fsize);
        let r = f(self, fsize, a, b);
        let result = self.scalar_result(fsize, r);
        self.set_v_full(op.rd, result);
    }

    /// Scalar form: `d = f(n[0])` with the rest of `d` zeroed.
    pub(crate) fn fp_scalar_unary(
        &mut self,
        op: &OpDescriptor,
        mut f: impl FnMut(&mut Self, usize, Value) -> Value,
    ) {
        self.check_fp_scalar(op);
        let fsize = op.fp_esize();
        let n = self.v(op.rn);
        let a = self.extract_raw(n, 0, fsize);
        let r = f(self, fsize, a);
        let result = self.scalar_result(fsize, r);
        self.set_v_full(op.rd, result);
    }

    /// Left-to-right fold of the float lanes of `n`.
    pub(crate) fn fp_reduce_across(
        &mut self,
        op: &OpDescriptor,
        mut f: impl FnMut(&mut Self, usize, Value, Value) -> Value,
    ) -> Value {
        let fsize = op.fp_esize();
        let n = self.v(op.rn);
        let mut acc = self.extract_raw(n, 0, fsize);
        for i in 1..op.fp_lanes() {
            let b = self.extract_raw(n, i, fsize);
            acc = f(self, fsize, acc, b);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Interpreter;
    use crate::config::EmitConfig;
    use crate::frontend::a64::types::{InstName, Vec};
    use crate::ir::block::Block;
    use crate::thread_state::ThreadState;

    const N: u128 = 0x0F0E_0D0C_0B0A_0908_0706_0504_0302_0100;
    const M: u128 = 0xF0E0_D0C0_B0A0_9080_7060_5040_3020_1000;

    fn run(block: &Block, n: u128, m: u128) -> u128 {
        let mut state = ThreadState::new();
        state.v[1] = n;
        state.v[2] = m;
        Interpreter::new().execute(block, &mut state);
        state.v[0]
    }

    #[test]
    fn test_insert_extract_touches_one_lane() {
        for esize in [8, 16, 32, 64] {
            let mask = u128::MAX >> (128 - esize);
            for i in 0..128 / esize {
                let mut block = Block::new(0);
                {
                    let mut v = TranslatorVisitor::new(&mut block, EmitConfig::portable());
                    let n = v.v(Vec::V1);
                    let m = v.v(Vec::V2);
                    let lane = v.extract_raw(m, i, esize);
                    let same = v.extract_raw(n, i, esize);
                    let n = v.insert(n, i, esize, same);
                    let r = v.insert(n, i, esize, lane);
                    v.set_v_full(Vec::V0, r);
                }
                let shift = i * esize;
                let expected = (N & !(mask << shift)) | (M & (mask << shift));
                assert_eq!(run(&block, N, M), expected, "esize {} lane {}", esize, i);
            }
        }
    }

    #[test]
    fn test_signed_extract_extends() {
        let mut block = Block::new(0);
        {
            let mut v = TranslatorVisitor::new(&mut block, EmitConfig::portable());
            let m = v.v(Vec::V2);
            let lane = v.extract(m, 15, 8, true);
            let r = v.scalar_result(64, lane);
            v.set_v_full(Vec::V0, r);
        }
        assert_eq!(run(&block, N, M), 0xFFFF_FFFF_FFFF_FFF0);
    }

    #[test]
    fn test_float_reduction_is_left_to_right() {
        // (2^24 + 1) + 1 rounds back to 2^24 twice; any other association gives 2^24 + 2.
        let lanes = [16_777_216.0f32, 1.0, 1.0, 0.0];
        let n = lanes
            .iter()
            .enumerate()
            .fold(0u128, |acc, (i, f)| acc | (f.to_bits() as u128) << (32 * i));

        let mut block = Block::new(0);
        {
            let mut v = TranslatorVisitor::new(&mut block, EmitConfig::portable());
            let op = OpDescriptor::new(InstName::FADDP_V).with_regs(Vec::V0, Vec::V1, Vec::V1);
            let sum = v.fp_reduce_across(&op, |v, fsize, a, b| v.ir.fp_add(fsize, a, b));
            let r = v.scalar_result(32, sum);
            v.set_v_full(Vec::V0, r);
        }
        assert_eq!(run(&block, n, 0), 16_777_216.0f32.to_bits() as u128);
    }
}
