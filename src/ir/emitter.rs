use crate::frontend::a64::types::Vec as A64Vec;
use crate::ir::block::Block;
use crate::ir::opcode::Opcode;
use crate::ir::value::Value;

/// IR emitter: the builder API for constructing IR blocks.
/// Wraps a Block and appends instructions to it.
pub struct IREmitter<'a> {
    pub block: &'a mut Block,
}

impl<'a> IREmitter<'a> {
    pub fn new(block: &'a mut Block) -> Self {
        Self { block }
    }

    /// Internal: emit an instruction and return its Value as an InstRef.
    fn emit(&mut self, opcode: Opcode, args: &[Value]) -> Value {
        let r = self.block.append(opcode, args);
        Value::Inst(r)
    }

    /// Internal: emit an instruction returning void (no result value).
    fn emit_void(&mut self, opcode: Opcode, args: &[Value]) {
        self.block.append(opcode, args);
    }

    // --- Immediates ---

    pub fn imm1(&self, value: bool) -> Value { Value::ImmU1(value) }
    pub fn imm8(&self, value: u8) -> Value { Value::ImmU8(value) }
    pub fn imm32(&self, value: u32) -> Value { Value::ImmU32(value) }
    pub fn imm64(&self, value: u64) -> Value { Value::ImmU64(value) }

    // --- A64 context ---

    pub fn get_q(&mut self, vec: A64Vec) -> Value {
        self.emit(Opcode::A64GetQ, &[Value::ImmA64Vec(vec)])
    }

    pub fn set_q(&mut self, vec: A64Vec, value: Value) {
        self.emit_void(Opcode::A64SetQ, &[Value::ImmA64Vec(vec), value]);
    }

    pub fn get_fpcr(&mut self) -> Value {
        self.emit(Opcode::A64GetFPCR, &[])
    }

    pub fn or_qc(&mut self, value: Value) {
        self.emit_void(Opcode::A64OrQC, &[value]);
    }

    pub fn call_supervisor(&mut self, position: u64, imm: u32) {
        self.emit_void(Opcode::A64CallSupervisor, &[Value::ImmU64(position), Value::ImmU32(imm)]);
    }

    pub fn breakpoint(&mut self, position: u64, imm: u32) {
        self.emit_void(Opcode::A64Breakpoint, &[Value::ImmU64(position), Value::ImmU32(imm)]);
    }

    pub fn undefined_instruction(&mut self, position: u64, raw: u32) {
        self.emit_void(Opcode::A64UndefinedInstruction, &[Value::ImmU64(position), Value::ImmU32(raw)]);
    }

    // --- Pseudo-operations ---

    pub fn get_saturation_from_op(&mut self, op: Value) -> Value {
        assert!(op.is_inst(), "GetSaturationFromOp needs an instruction result");
        self.emit(Opcode::GetSaturationFromOp, &[op])
    }

    // --- Scalar integer ---

    /// Extends an `esize`-bit value to 64 bits. 64-bit values pass through.
    pub fn extend_to_long(&mut self, value: Value, esize: usize, signed: bool) -> Value {
        let opcode = match (esize, signed) {
            (8, true) => Opcode::SignExtendByteToLong,
            (16, true) => Opcode::SignExtendHalfToLong,
            (32, true) => Opcode::SignExtendWordToLong,
            (8, false) => Opcode::ZeroExtendByteToLong,
            (16, false) => Opcode::ZeroExtendHalfToLong,
            (32, false) => Opcode::ZeroExtendWordToLong,
            (64, _) => return value,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[value])
    }

    pub fn least_significant_byte(&mut self, value: Value) -> Value {
        self.emit(Opcode::LeastSignificantByte, &[value])
    }

    pub fn add_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Add64, &[a, b])
    }

    pub fn sub_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Sub64, &[a, b])
    }

    pub fn mul_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Mul64, &[a, b])
    }

    pub fn and_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::And64, &[a, b])
    }

    pub fn eor_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Eor64, &[a, b])
    }

    pub fn logical_shift_left_64(&mut self, value: Value, shift: u8) -> Value {
        self.emit(Opcode::LogicalShiftLeft64, &[value, Value::ImmU8(shift)])
    }

    pub fn logical_shift_right_64(&mut self, value: Value, shift: u8) -> Value {
        self.emit(Opcode::LogicalShiftRight64, &[value, Value::ImmU8(shift)])
    }

    pub fn arithmetic_shift_right_64(&mut self, value: Value, shift: u8) -> Value {
        self.emit(Opcode::ArithmeticShiftRight64, &[value, Value::ImmU8(shift)])
    }

    pub fn abs_64(&mut self, value: Value) -> Value {
        self.emit(Opcode::Abs64, &[value])
    }

    pub fn max_64(&mut self, a: Value, b: Value, signed: bool) -> Value {
        let opcode = if signed { Opcode::MaxSigned64 } else { Opcode::MaxUnsigned64 };
        self.emit(opcode, &[a, b])
    }

    pub fn min_64(&mut self, a: Value, b: Value, signed: bool) -> Value {
        let opcode = if signed { Opcode::MinSigned64 } else { Opcode::MinUnsigned64 };
        self.emit(opcode, &[a, b])
    }

    // --- Bit counting ---

    pub fn count_leading_zeros_32(&mut self, value: Value) -> Value {
        self.emit(Opcode::CountLeadingZeros32, &[value])
    }

    pub fn count_leading_zeros_64(&mut self, value: Value) -> Value {
        self.emit(Opcode::CountLeadingZeros64, &[value])
    }

    /// Leading zeros of the low `width` bits, without a host instruction.
    pub fn count_leading_zeros_fallback(&mut self, value: Value, width: u8) -> Value {
        self.emit(Opcode::CountLeadingZerosFallback, &[value, Value::ImmU8(width)])
    }

    pub fn population_count(&mut self, value: Value) -> Value {
        self.emit(Opcode::PopulationCount, &[value])
    }

    pub fn population_count_fallback_8(&mut self, value: Value) -> Value {
        self.emit(Opcode::PopulationCountFallback8, &[value])
    }

    // --- Saturated arithmetic ---

    pub fn signed_saturated_add(&mut self, a: Value, b: Value, esize: usize) -> Value {
        let opcode = match esize {
            8 => Opcode::SignedSaturatedAdd8,
            16 => Opcode::SignedSaturatedAdd16,
            32 => Opcode::SignedSaturatedAdd32,
            64 => Opcode::SignedSaturatedAdd64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn signed_saturated_sub(&mut self, a: Value, b: Value, esize: usize) -> Value {
        let opcode = match esize {
            8 => Opcode::SignedSaturatedSub8,
            16 => Opcode::SignedSaturatedSub16,
            32 => Opcode::SignedSaturatedSub32,
            64 => Opcode::SignedSaturatedSub64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn unsigned_saturated_add(&mut self, a: Value, b: Value, esize: usize) -> Value {
        let opcode = match esize {
            8 => Opcode::UnsignedSaturatedAdd8,
            16 => Opcode::UnsignedSaturatedAdd16,
            32 => Opcode::UnsignedSaturatedAdd32,
            64 => Opcode::UnsignedSaturatedAdd64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn unsigned_saturated_sub(&mut self, a: Value, b: Value, esize: usize) -> Value {
        let opcode = match esize {
            8 => Opcode::UnsignedSaturatedSub8,
            16 => Opcode::UnsignedSaturatedSub16,
            32 => Opcode::UnsignedSaturatedSub32,
            64 => Opcode::UnsignedSaturatedSub64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn signed_saturated_neg(&mut self, a: Value, esize: usize) -> Value {
        let opcode = match esize {
            8 => Opcode::SignedSaturatedNeg8,
            16 => Opcode::SignedSaturatedNeg16,
            32 => Opcode::SignedSaturatedNeg32,
            64 => Opcode::SignedSaturatedNeg64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a])
    }

    pub fn signed_saturated_abs(&mut self, a: Value, esize: usize) -> Value {
        let opcode = match esize {
            8 => Opcode::SignedSaturatedAbs8,
            16 => Opcode::SignedSaturatedAbs16,
            32 => Opcode::SignedSaturatedAbs32,
            64 => Opcode::SignedSaturatedAbs64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a])
    }

    /// SUQADD: signed accumulator plus unsigned addend, signed saturation.
    pub fn signed_saturated_accumulate_unsigned(&mut self, acc: Value, addend: Value, esize: usize) -> Value {
        let opcode = match esize {
            8 => Opcode::SignedSaturatedAccumulateUnsigned8,
            16 => Opcode::SignedSaturatedAccumulateUnsigned16,
            32 => Opcode::SignedSaturatedAccumulateUnsigned32,
            64 => Opcode::SignedSaturatedAccumulateUnsigned64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[acc, addend])
    }

    /// USQADD: unsigned accumulator plus signed addend, unsigned saturation.
    pub fn unsigned_saturated_accumulate_signed(&mut self, acc: Value, addend: Value, esize: usize) -> Value {
        let opcode = match esize {
            8 => Opcode::UnsignedSaturatedAccumulateSigned8,
            16 => Opcode::UnsignedSaturatedAccumulateSigned16,
            32 => Opcode::UnsignedSaturatedAccumulateSigned32,
            64 => Opcode::UnsignedSaturatedAccumulateSigned64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[acc, addend])
    }

    pub fn signed_saturated_doubling_multiply_return_high(
        &mut self,
        a: Value,
        b: Value,
        esize: usize,
        rounding: bool,
    ) -> Value {
        let opcode = match (esize, rounding) {
            (16, false) => Opcode::SignedSaturatedDoublingMultiplyReturnHigh16,
            (32, false) => Opcode::SignedSaturatedDoublingMultiplyReturnHigh32,
            (16, true) => Opcode::SignedSaturatedRoundingDoublingMultiplyReturnHigh16,
            (32, true) => Opcode::SignedSaturatedRoundingDoublingMultiplyReturnHigh32,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    /// Narrows a signed `2 * esize` value to a signed `esize` value.
    pub fn signed_saturated_narrow_to_signed(&mut self, value: Value, esize: usize) -> Value {
        self.emit(Opcode::SignedSaturatedNarrowToSigned, &[value, Value::ImmU8(esize as u8)])
    }

    pub fn signed_saturated_narrow_to_unsigned(&mut self, value: Value, esize: usize) -> Value {
        self.emit(Opcode::SignedSaturatedNarrowToUnsigned, &[value, Value::ImmU8(esize as u8)])
    }

    pub fn unsigned_saturated_narrow(&mut self, value: Value, esize: usize) -> Value {
        self.emit(Opcode::UnsignedSaturatedNarrow, &[value, Value::ImmU8(esize as u8)])
    }

    // --- Vector lane access ---

    pub fn vector_get_element(&mut self, esize: usize, vector: Value, index: usize) -> Value {
        let opcode = match esize {
            8 => Opcode::VectorGetElement8,
            16 => Opcode::VectorGetElement16,
            32 => Opcode::VectorGetElement32,
            64 => Opcode::VectorGetElement64,
            _ => panic!("Invalid esize {}", esize),
        };
        assert!(index * esize < 128, "Lane {} out of range for esize {}", index, esize);
        self.emit(opcode, &[vector, Value::ImmU8(index as u8)])
    }

    pub fn vector_set_element(&mut self, esize: usize, vector: Value, index: usize, value: Value) -> Value {
        let opcode = match esize {
            8 => Opcode::VectorSetElement8,
            16 => Opcode::VectorSetElement16,
            32 => Opcode::VectorSetElement32,
            64 => Opcode::VectorSetElement64,
            _ => panic!("Invalid esize {}", esize),
        };
        assert!(index * esize < 128, "Lane {} out of range for esize {}", index, esize);
        self.emit(opcode, &[vector, Value::ImmU8(index as u8), value])
    }

    pub fn vector_broadcast_element(&mut self, esize: usize, vector: Value, index: usize) -> Value {
        let opcode = match esize {
            32 => Opcode::VectorBroadcastElement32,
            64 => Opcode::VectorBroadcastElement64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[vector, Value::ImmU8(index as u8)])
    }

    /// Bits `[position, position + 128)` of the 256-bit concatenation `b:a`.
    pub fn vector_extract(&mut self, a: Value, b: Value, position: u8) -> Value {
        self.emit(Opcode::VectorExtract, &[a, b, Value::ImmU8(position)])
    }

    pub fn vector_zero_upper(&mut self, vector: Value) -> Value {
        self.emit(Opcode::VectorZeroUpper, &[vector])
    }

    pub fn zero_vector(&mut self) -> Value {
        self.emit(Opcode::ZeroVector, &[])
    }

    // --- Native integer vector ---

    pub fn vector_abs(&mut self, esize: usize, a: Value) -> Value {
        let opcode = match esize {
            8 => Opcode::VectorAbs8,
            16 => Opcode::VectorAbs16,
            32 => Opcode::VectorAbs32,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a])
    }

    pub fn vector_add(&mut self, esize: usize, a: Value, b: Value) -> Value {
        let opcode = match esize {
            8 => Opcode::VectorAdd8,
            16 => Opcode::VectorAdd16,
            32 => Opcode::VectorAdd32,
            64 => Opcode::VectorAdd64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn vector_sub(&mut self, esize: usize, a: Value, b: Value) -> Value {
        let opcode = match esize {
            8 => Opcode::VectorSub8,
            16 => Opcode::VectorSub16,
            32 => Opcode::VectorSub32,
            64 => Opcode::VectorSub64,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn vector_multiply(&mut self, esize: usize, a: Value, b: Value) -> Value {
        let opcode = match esize {
            8 => Opcode::VectorMultiply8,
            16 => Opcode::VectorMultiply16,
            32 => Opcode::VectorMultiply32,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn vector_max(&mut self, esize: usize, a: Value, b: Value, signed: bool) -> Value {
        let opcode = match (esize, signed) {
            (8, true) => Opcode::VectorMaxSigned8,
            (16, true) => Opcode::VectorMaxSigned16,
            (32, true) => Opcode::VectorMaxSigned32,
            (8, false) => Opcode::VectorMaxUnsigned8,
            (16, false) => Opcode::VectorMaxUnsigned16,
            (32, false) => Opcode::VectorMaxUnsigned32,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn vector_min(&mut self, esize: usize, a: Value, b: Value, signed: bool) -> Value {
        let opcode = match (esize, signed) {
            (8, true) => Opcode::VectorMinSigned8,
            (16, true) => Opcode::VectorMinSigned16,
            (32, true) => Opcode::VectorMinSigned32,
            (8, false) => Opcode::VectorMinUnsigned8,
            (16, false) => Opcode::VectorMinUnsigned16,
            (32, false) => Opcode::VectorMinUnsigned32,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn vector_rounding_halving_add_unsigned(&mut self, esize: usize, a: Value, b: Value) -> Value {
        let opcode = match esize {
            8 => Opcode::VectorRoundingHalvingAddUnsigned8,
            16 => Opcode::VectorRoundingHalvingAddUnsigned16,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a, b])
    }

    /// Widens the low half of `a` from `esize` to `2 * esize` lanes.
    pub fn vector_extend(&mut self, esize: usize, a: Value, signed: bool) -> Value {
        let opcode = match (esize, signed) {
            (8, true) => Opcode::VectorSignExtend8,
            (16, true) => Opcode::VectorSignExtend16,
            (32, true) => Opcode::VectorSignExtend32,
            (8, false) => Opcode::VectorZeroExtend8,
            (16, false) => Opcode::VectorZeroExtend16,
            (32, false) => Opcode::VectorZeroExtend32,
            _ => panic!("Invalid esize {}", esize),
        };
        self.emit(opcode, &[a])
    }

    // --- Native floating-point vector ---

    pub fn fp_vector_abs(&mut self, fsize: usize, a: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorAbs32,
            64 => Opcode::FPVectorAbs64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a])
    }

    pub fn fp_vector_neg(&mut self, fsize: usize, a: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorNeg32,
            64 => Opcode::FPVectorNeg64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a])
    }

    pub fn fp_vector_sqrt(&mut self, fsize: usize, a: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorSqrt32,
            64 => Opcode::FPVectorSqrt64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a])
    }

    pub fn fp_vector_add(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorAdd32,
            64 => Opcode::FPVectorAdd64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn fp_vector_sub(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorSub32,
            64 => Opcode::FPVectorSub64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn fp_vector_mul(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorMul32,
            64 => Opcode::FPVectorMul64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn fp_vector_div(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorDiv32,
            64 => Opcode::FPVectorDiv64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn fp_vector_max(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorMax32,
            64 => Opcode::FPVectorMax64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a, b])
    }

    pub fn fp_vector_min(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorMin32,
            64 => Opcode::FPVectorMin64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a, b])
    }

    /// `acc + a * b` per lane.
    pub fn fp_vector_mul_add(&mut self, fsize: usize, acc: Value, a: Value, b: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorMulAdd32,
            64 => Opcode::FPVectorMulAdd64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[acc, a, b])
    }

    pub fn fp_vector_round_int(&mut self, fsize: usize, a: Value, mode: u8) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPVectorRoundInt32,
            64 => Opcode::FPVectorRoundInt64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        assert!(mode < 4, "Native rounding supports FPCR modes only");
        self.emit(opcode, &[a, Value::ImmU8(mode)])
    }

    // --- Software floating-point ---

    fn fp_unary(&mut self, fsize: usize, op32: Opcode, op64: Opcode, a: Value) -> Value {
        match fsize {
            32 => self.emit(op32, &[a]),
            64 => self.emit(op64, &[a]),
            _ => panic!("Invalid fsize {}", fsize),
        }
    }

    fn fp_binary(&mut self, fsize: usize, op32: Opcode, op64: Opcode, a: Value, b: Value) -> Value {
        match fsize {
            32 => self.emit(op32, &[a, b]),
            64 => self.emit(op64, &[a, b]),
            _ => panic!("Invalid fsize {}", fsize),
        }
    }

    pub fn fp_abs(&mut self, fsize: usize, a: Value) -> Value {
        self.fp_unary(fsize, Opcode::FPAbs32, Opcode::FPAbs64, a)
    }

    pub fn fp_neg(&mut self, fsize: usize, a: Value) -> Value {
        self.fp_unary(fsize, Opcode::FPNeg32, Opcode::FPNeg64, a)
    }

    pub fn fp_sqrt(&mut self, fsize: usize, a: Value) -> Value {
        self.fp_unary(fsize, Opcode::FPSqrt32, Opcode::FPSqrt64, a)
    }

    pub fn fp_recip_estimate(&mut self, fsize: usize, a: Value) -> Value {
        self.fp_unary(fsize, Opcode::FPRecipEstimate32, Opcode::FPRecipEstimate64, a)
    }

    pub fn fp_recip_exponent(&mut self, fsize: usize, a: Value) -> Value {
        self.fp_unary(fsize, Opcode::FPRecipExponent32, Opcode::FPRecipExponent64, a)
    }

    pub fn fp_rsqrt_estimate(&mut self, fsize: usize, a: Value) -> Value {
        self.fp_unary(fsize, Opcode::FPRSqrtEstimate32, Opcode::FPRSqrtEstimate64, a)
    }

    pub fn fp_add(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPAdd32, Opcode::FPAdd64, a, b)
    }

    pub fn fp_sub(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPSub32, Opcode::FPSub64, a, b)
    }

    pub fn fp_mul(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPMul32, Opcode::FPMul64, a, b)
    }

    pub fn fp_mul_x(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPMulX32, Opcode::FPMulX64, a, b)
    }

    pub fn fp_div(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPDiv32, Opcode::FPDiv64, a, b)
    }

    pub fn fp_max(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPMax32, Opcode::FPMax64, a, b)
    }

    pub fn fp_min(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPMin32, Opcode::FPMin64, a, b)
    }

    pub fn fp_max_numeric(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPMaxNumeric32, Opcode::FPMaxNumeric64, a, b)
    }

    pub fn fp_min_numeric(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPMinNumeric32, Opcode::FPMinNumeric64, a, b)
    }

    pub fn fp_recip_step_fused(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPRecipStepFused32, Opcode::FPRecipStepFused64, a, b)
    }

    pub fn fp_rsqrt_step_fused(&mut self, fsize: usize, a: Value, b: Value) -> Value {
        self.fp_binary(fsize, Opcode::FPRSqrtStepFused32, Opcode::FPRSqrtStepFused64, a, b)
    }

    /// `acc + a * b`, rounded once.
    pub fn fp_mul_add(&mut self, fsize: usize, acc: Value, a: Value, b: Value) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPMulAdd32,
            64 => Opcode::FPMulAdd64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[acc, a, b])
    }

    /// `mode` is an immediate `RoundingMode` or a runtime U8 derived from FPCR.
    pub fn fp_round_int(&mut self, fsize: usize, a: Value, mode: Value, exact: bool) -> Value {
        let opcode = match fsize {
            32 => Opcode::FPRoundInt32,
            64 => Opcode::FPRoundInt64,
            _ => panic!("Invalid fsize {}", fsize),
        };
        self.emit(opcode, &[a, mode, Value::ImmU1(exact)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_lane_round_trip() {
        let mut block = Block::new(0);
        let mut ir = IREmitter::new(&mut block);
        let v = ir.get_q(A64Vec::V1);
        let lane = ir.vector_get_element(16, v, 3);
        let wide = ir.extend_to_long(lane, 16, true);
        let zero = ir.zero_vector();
        let out = ir.vector_set_element(16, zero, 3, wide);
        ir.set_q(A64Vec::V0, out);

        assert_eq!(block.live_inst_count(), 6);
        assert!(block.contains_opcode(Opcode::SignExtendHalfToLong));
        let text = block.to_string();
        assert!(text.contains("VectorGetElement16 %0, #0x3"));
    }

    #[test]
    fn test_extend_64_is_passthrough() {
        let mut block = Block::new(0);
        let mut ir = IREmitter::new(&mut block);
        let v = ir.imm64(7);
        assert_eq!(ir.extend_to_long(v, 64, true), v);
        assert!(block.is_empty());
    }

    #[test]
    #[should_panic(expected = "Invalid esize")]
    fn test_invalid_esize_panics() {
        let mut block = Block::new(0);
        let mut ir = IREmitter::new(&mut block);
        let zero = ir.zero_vector();
        ir.vector_multiply(64, zero, zero);
    }
}
