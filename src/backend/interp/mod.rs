//! Reference backend: executes IR blocks directly against a [`ThreadState`].
//!
//! Native opcodes evaluate with the matching host operation (`f32 + f32`, `u32::leading_zeros`,
//! `f64::mul_add`); software floating-point opcodes run the exact routines in [`crate::fp::op`]
//! with the live FPCR and accumulate into FPSR.

pub mod floating_point;
pub mod saturated;
pub mod scalar;
pub mod vector;

use crate::fp::FPExc;
use crate::halt_reason::HaltReason;
use crate::ir::block::Block;
use crate::ir::inst::{Inst, MAX_ARGS};
use crate::ir::opcode::Opcode;
use crate::ir::types::Type;
use crate::ir::value::Value;
use crate::thread_state::ThreadState;

/// Instruction results of one block run, indexed by `InstRef`.
struct Frame {
    values: Vec<u128>,
    saturated: Vec<bool>,
}

impl Frame {
    fn new(len: usize) -> Self {
        Self {
            values: vec![0; len],
            saturated: vec![false; len],
        }
    }

    fn value(&self, value: Value) -> u128 {
        match value {
            Value::Void => 0,
            Value::Inst(r) => self.values[r.index()],
            Value::ImmA64Vec(v) => v.number() as u128,
            imm => imm.get_imm_as_u64() as u128,
        }
    }

    fn args(&self, inst: &Inst) -> [u128; MAX_ARGS] {
        let mut args = [0u128; MAX_ARGS];
        for (slot, arg) in args.iter_mut().zip(inst.arg_values()) {
            *slot = self.value(*arg);
        }
        args
    }
}

fn truncate(value: u128, ty: Type) -> u128 {
    match ty.bit_width() {
        Some(128) | None => value,
        Some(bits) => value & ((1u128 << bits) - 1),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }

    /// Run `block` once, then report its weight to the thread state.
    ///
    /// An exception-generating instruction dispatches its callback immediately and ends the
    /// block. `pc` is left at the faulting instruction for BRK and undefined instructions, and
    /// at the following instruction for SVC.
    pub fn execute(&self, block: &Block, state: &mut ThreadState) -> HaltReason {
        let mut frame = Frame::new(block.inst_count());
        let mut halt = HaltReason::empty();

        log::trace!("executing block {:#x} ({} insts)", block.position, block.live_inst_count());

        for (inst_ref, inst) in block.iter_live() {
            let args = frame.args(inst);
            let index = inst_ref.index();
            let result = match inst.opcode {
                Opcode::Void => continue,
                Opcode::GetSaturationFromOp => {
                    let source = inst.arg(0).inst_ref();
                    frame.saturated[source.index()] as u128
                }

                Opcode::A64GetQ => state.v[inst.arg(0).get_a64_vec().number()],
                Opcode::A64SetQ => {
                    state.v[inst.arg(0).get_a64_vec().number()] = args[1];
                    0
                }
                Opcode::A64GetFPCR => state.fpcr.value() as u128,
                Opcode::A64OrQC => {
                    if args[0] & 1 != 0 {
                        state.set_fpsr_flag(FPExc::QC);
                    }
                    0
                }
                Opcode::A64CallSupervisor => {
                    state.pc = (args[0] as u64).wrapping_add(4);
                    state.on_svc_call(args[0] as u64, args[1] as u32);
                    halt |= HaltReason::SVC;
                    break;
                }
                Opcode::A64Breakpoint => {
                    state.pc = args[0] as u64;
                    state.on_break(args[0] as u64, args[1] as u32);
                    halt |= HaltReason::BREAKPOINT;
                    break;
                }
                Opcode::A64UndefinedInstruction => {
                    state.pc = args[0] as u64;
                    state.on_undefined(args[0] as u64, args[1] as u32);
                    halt |= HaltReason::UNDEFINED;
                    break;
                }

                op if op.may_saturate() => {
                    let (value, saturated) = saturated::execute(op, args[0] as u64, args[1] as u64);
                    frame.saturated[index] = saturated;
                    value as u128
                }
                op if op.is_vector() => vector::execute(op, &args[..op.num_args()]),
                op if op.is_software_fp() || matches!(op,
                    Opcode::FPAbs32 | Opcode::FPAbs64 | Opcode::FPNeg32 | Opcode::FPNeg64) =>
                {
                    let fpcr = state.fpcr;
                    floating_point::execute(op, &args[..op.num_args()], fpcr, &mut state.fpsr) as u128
                }
                op => scalar::execute(op, &args[..op.num_args()]) as u128,
            };
            frame.values[index] = truncate(result, inst.return_type());
        }

        let interrupt_was_pending = state.interrupt_pending();
        if !state.synchronize(block.weight) {
            halt |= HaltReason::EXTERNAL_HALT;
        }
        if interrupt_was_pending && !state.interrupt_pending() {
            halt |= HaltReason::INTERRUPT;
        }
        halt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::a64::types::Vec;
    use crate::ir::emitter::IREmitter;
    use crate::thread_state::SYNC_THRESHOLD;

    #[test]
    fn test_vector_add_and_set() {
        let mut block = Block::new(0);
        {
            let mut ir = IREmitter::new(&mut block);
            let a = ir.get_q(Vec::V1);
            let b = ir.get_q(Vec::V2);
            let sum = ir.vector_add(32, a, b);
            ir.set_q(Vec::V0, sum);
        }
        let mut state = ThreadState::new();
        state.v[1] = 0x0000_0004_0000_0003_0000_0002_0000_0001;
        state.v[2] = 0x0000_0010_0000_0010_0000_0010_FFFF_FFFF;
        let halt = Interpreter::new().execute(&block, &mut state);
        assert!(halt.is_empty());
        assert_eq!(state.v[0], 0x0000_0014_0000_0013_0000_0012_0000_0000);
    }

    #[test]
    fn test_saturation_reaches_qc() {
        let mut block = Block::new(0);
        {
            let mut ir = IREmitter::new(&mut block);
            let a = ir.imm64(0x80);
            let b = ir.imm64(0xFF);
            let sum = ir.signed_saturated_add(a, b, 8);
            let sat = ir.get_saturation_from_op(sum);
            ir.or_qc(sat);
            let zero = ir.zero_vector();
            let out = ir.vector_set_element(8, zero, 0, sum);
            ir.set_q(Vec::V3, out);
        }
        let mut state = ThreadState::new();
        Interpreter::new().execute(&block, &mut state);
        assert_eq!(state.v[3], 0x80);
        assert!(state.fpsr.qc());
    }

    #[test]
    fn test_results_truncated_to_type() {
        let mut block = Block::new(0);
        {
            let mut ir = IREmitter::new(&mut block);
            let wide = ir.imm64(0x1234);
            let byte = ir.least_significant_byte(wide);
            let back = ir.extend_to_long(byte, 8, false);
            let zero = ir.zero_vector();
            let out = ir.vector_set_element(64, zero, 1, back);
            ir.set_q(Vec::V0, out);
        }
        let mut state = ThreadState::new();
        Interpreter::new().execute(&block, &mut state);
        assert_eq!(state.v[0], 0x34u128 << 64);
    }

    #[test]
    fn test_undefined_stops_block() {
        let mut block = Block::new(0x4000);
        {
            let mut ir = IREmitter::new(&mut block);
            ir.undefined_instruction(0x4000, 0xDEAD_BEEF);
            let zero = ir.zero_vector();
            ir.set_q(Vec::V0, zero);
        }
        let mut state = ThreadState::new();
        state.v[0] = 7;
        let halt = Interpreter::new().execute(&block, &mut state);
        assert_eq!(halt, HaltReason::UNDEFINED);
        assert_eq!(state.v[0], 7);
        assert_eq!(state.pc, 0x4000);
    }

    #[test]
    fn test_interrupt_reported_at_threshold() {
        let mut block = Block::new(0);
        block.weight = SYNC_THRESHOLD;
        let mut state = ThreadState::new();
        state.request_interrupt();
        let halt = Interpreter::new().execute(&block, &mut state);
        assert!(halt.contains(HaltReason::INTERRUPT));
        assert!(!state.interrupt_pending());

        state.handle().stop();
        let halt = Interpreter::new().execute(&Block::new(0), &mut state);
        assert_eq!(halt, HaltReason::EXTERNAL_HALT);
    }
}
