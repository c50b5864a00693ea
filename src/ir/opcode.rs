use std::fmt;
use crate::ir::types::Type;

/// IR opcodes.
///
/// `Vector*`/`FPVector*` opcodes operate on a whole 128-bit register and map onto a single
/// host vector instruction. `FP*` scalar opcodes are the architecturally exact software
/// routines; they read FPCR and accumulate FPSR when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum Opcode {
    // --- Core ---
    Void,
    GetSaturationFromOp,

    // --- A64 context getters/setters ---
    A64GetQ,
    A64SetQ,
    A64GetFPCR,
    A64OrQC,
    A64CallSupervisor,
    A64Breakpoint,
    A64UndefinedInstruction,

    // --- Scalar integer (64-bit canonical domain) ---
    SignExtendByteToLong,
    SignExtendHalfToLong,
    SignExtendWordToLong,
    ZeroExtendByteToLong,
    ZeroExtendHalfToLong,
    ZeroExtendWordToLong,
    LeastSignificantByte,
    Add64,
    Sub64,
    Mul64,
    And64,
    Eor64,
    LogicalShiftLeft64,
    LogicalShiftRight64,
    ArithmeticShiftRight64,
    Abs64,
    MaxSigned64,
    MaxUnsigned64,
    MinSigned64,
    MinUnsigned64,

    // --- Bit counting ---
    CountLeadingZeros32,
    CountLeadingZeros64,
    CountLeadingZerosFallback,
    PopulationCount,
    PopulationCountFallback8,

    // --- Saturated arithmetic ---
    SignedSaturatedAdd8,
    SignedSaturatedAdd16,
    SignedSaturatedAdd32,
    SignedSaturatedAdd64,
    SignedSaturatedSub8,
    SignedSaturatedSub16,
    SignedSaturatedSub32,
    SignedSaturatedSub64,
    UnsignedSaturatedAdd8,
    UnsignedSaturatedAdd16,
    UnsignedSaturatedAdd32,
    UnsignedSaturatedAdd64,
    UnsignedSaturatedSub8,
    UnsignedSaturatedSub16,
    UnsignedSaturatedSub32,
    UnsignedSaturatedSub64,
    SignedSaturatedNeg8,
    SignedSaturatedNeg16,
    SignedSaturatedNeg32,
    SignedSaturatedNeg64,
    SignedSaturatedAbs8,
    SignedSaturatedAbs16,
    SignedSaturatedAbs32,
    SignedSaturatedAbs64,
    SignedSaturatedAccumulateUnsigned8,
    SignedSaturatedAccumulateUnsigned16,
    SignedSaturatedAccumulateUnsigned32,
    SignedSaturatedAccumulateUnsigned64,
    UnsignedSaturatedAccumulateSigned8,
    UnsignedSaturatedAccumulateSigned16,
    UnsignedSaturatedAccumulateSigned32,
    UnsignedSaturatedAccumulateSigned64,
    SignedSaturatedDoublingMultiplyReturnHigh16,
    SignedSaturatedDoublingMultiplyReturnHigh32,
    SignedSaturatedRoundingDoublingMultiplyReturnHigh16,
    SignedSaturatedRoundingDoublingMultiplyReturnHigh32,
    SignedSaturatedNarrowToSigned,
    SignedSaturatedNarrowToUnsigned,
    UnsignedSaturatedNarrow,

    // --- Vector lane access ---
    VectorGetElement8,
    VectorGetElement16,
    VectorGetElement32,
    VectorGetElement64,
    VectorSetElement8,
    VectorSetElement16,
    VectorSetElement32,
    VectorSetElement64,
    VectorBroadcastElement32,
    VectorBroadcastElement64,
    VectorExtract,
    VectorZeroUpper,
    ZeroVector,

    // --- Native integer vector operations ---
    VectorAbs8,
    VectorAbs16,
    VectorAbs32,
    VectorAdd8,
    VectorAdd16,
    VectorAdd32,
    VectorAdd64,
    VectorSub8,
    VectorSub16,
    VectorSub32,
    VectorSub64,
    VectorMultiply8,
    VectorMultiply16,
    VectorMultiply32,
    VectorMaxSigned8,
    VectorMaxSigned16,
    VectorMaxSigned32,
    VectorMaxUnsigned8,
    VectorMaxUnsigned16,
    VectorMaxUnsigned32,
    VectorMinSigned8,
    VectorMinSigned16,
    VectorMinSigned32,
    VectorMinUnsigned8,
    VectorMinUnsigned16,
    VectorMinUnsigned32,
    VectorRoundingHalvingAddUnsigned8,
    VectorRoundingHalvingAddUnsigned16,
    VectorSignExtend8,
    VectorSignExtend16,
    VectorSignExtend32,
    VectorZeroExtend8,
    VectorZeroExtend16,
    VectorZeroExtend32,

    // --- Native floating-point vector operations ---
    FPVectorAbs32,
    FPVectorAbs64,
    FPVectorAdd32,
    FPVectorAdd64,
    FPVectorDiv32,
    FPVectorDiv64,
    FPVectorMax32,
    FPVectorMax64,
    FPVectorMin32,
    FPVectorMin64,
    FPVectorMul32,
    FPVectorMul64,
    FPVectorMulAdd32,
    FPVectorMulAdd64,
    FPVectorNeg32,
    FPVectorNeg64,
    FPVectorRoundInt32,
    FPVectorRoundInt64,
    FPVectorSqrt32,
    FPVectorSqrt64,
    FPVectorSub32,
    FPVectorSub64,

    // --- Software floating-point scalar operations ---
    FPAbs32,
    FPAbs64,
    FPAdd32,
    FPAdd64,
    FPDiv32,
    FPDiv64,
    FPMax32,
    FPMax64,
    FPMaxNumeric32,
    FPMaxNumeric64,
    FPMin32,
    FPMin64,
    FPMinNumeric32,
    FPMinNumeric64,
    FPMul32,
    FPMul64,
    FPMulAdd32,
    FPMulAdd64,
    FPMulX32,
    FPMulX64,
    FPNeg32,
    FPNeg64,
    FPRecipEstimate32,
    FPRecipEstimate64,
    FPRecipExponent32,
    FPRecipExponent64,
    FPRecipStepFused32,
    FPRecipStepFused64,
    FPRoundInt32,
    FPRoundInt64,
    FPRSqrtEstimate32,
    FPRSqrtEstimate64,
    FPRSqrtStepFused32,
    FPRSqrtStepFused64,
    FPSqrt32,
    FPSqrt64,
    FPSub32,
    FPSub64,
}

/// Opcode metadata: return type and argument types.
struct OpcodeInfo {
    ret: Type,
    args: &'static [Type],
}

impl Opcode {
    /// Returns the return type of this opcode.
    pub fn return_type(self) -> Type {
        self.info().ret
    }

    /// Returns the argument types of this opcode.
    pub fn arg_types(self) -> &'static [Type] {
        self.info().args
    }

    /// Returns the number of arguments this opcode takes.
    pub fn num_args(self) -> usize {
        self.info().args.len()
    }

    /// Returns true if this opcode writes guest state or signals the supervisor.
    pub fn has_side_effects(self) -> bool {
        use Opcode::*;
        matches!(self,
            Void | A64SetQ | A64OrQC |
            A64CallSupervisor | A64Breakpoint | A64UndefinedInstruction
        ) || self.is_software_fp()
    }

    /// Returns true if this is a pseudo-operation reading a side result of another instruction.
    pub fn is_pseudo_operation(self) -> bool {
        matches!(self, Opcode::GetSaturationFromOp)
    }

    /// Returns true if this opcode can report saturation through `GetSaturationFromOp`.
    pub fn may_saturate(self) -> bool {
        use Opcode::*;
        matches!(self,
            SignedSaturatedAdd8 | SignedSaturatedAdd16 | SignedSaturatedAdd32 | SignedSaturatedAdd64 |
            SignedSaturatedSub8 | SignedSaturatedSub16 | SignedSaturatedSub32 | SignedSaturatedSub64 |
            UnsignedSaturatedAdd8 | UnsignedSaturatedAdd16 | UnsignedSaturatedAdd32 | UnsignedSaturatedAdd64 |
            UnsignedSaturatedSub8 | UnsignedSaturatedSub16 | UnsignedSaturatedSub32 | UnsignedSaturatedSub64 |
            SignedSaturatedNeg8 | SignedSaturatedNeg16 | SignedSaturatedNeg32 | SignedSaturatedNeg64 |
            SignedSaturatedAbs8 | SignedSaturatedAbs16 | SignedSaturatedAbs32 | SignedSaturatedAbs64 |
            SignedSaturatedAccumulateUnsigned8 | SignedSaturatedAccumulateUnsigned16 |
            SignedSaturatedAccumulateUnsigned32 | SignedSaturatedAccumulateUnsigned64 |
            UnsignedSaturatedAccumulateSigned8 | UnsignedSaturatedAccumulateSigned16 |
            UnsignedSaturatedAccumulateSigned32 | UnsignedSaturatedAccumulateSigned64 |
            SignedSaturatedDoublingMultiplyReturnHigh16 | SignedSaturatedDoublingMultiplyReturnHigh32 |
            SignedSaturatedRoundingDoublingMultiplyReturnHigh16 |
            SignedSaturatedRoundingDoublingMultiplyReturnHigh32 |
            SignedSaturatedNarrowToSigned | SignedSaturatedNarrowToUnsigned | UnsignedSaturatedNarrow
        )
    }

    /// Returns true if this is an architecturally exact software floating-point routine.
    /// These consult FPCR and update FPSR when executed.
    pub fn is_software_fp(self) -> bool {
        use Opcode::*;
        matches!(self,
            FPAdd32 | FPAdd64 | FPDiv32 | FPDiv64 | FPMax32 | FPMax64 |
            FPMaxNumeric32 | FPMaxNumeric64 | FPMin32 | FPMin64 |
            FPMinNumeric32 | FPMinNumeric64 | FPMul32 | FPMul64 |
            FPMulAdd32 | FPMulAdd64 | FPMulX32 | FPMulX64 |
            FPRecipEstimate32 | FPRecipEstimate64 | FPRecipExponent32 | FPRecipExponent64 |
            FPRecipStepFused32 | FPRecipStepFused64 | FPRoundInt32 | FPRoundInt64 |
            FPRSqrtEstimate32 | FPRSqrtEstimate64 | FPRSqrtStepFused32 | FPRSqrtStepFused64 |
            FPSqrt32 | FPSqrt64 | FPSub32 | FPSub64
        )
    }

    /// Returns true if this opcode is a single native host instruction
    /// (whole-register vector arithmetic or a hardware bit count).
    pub fn is_host_native(self) -> bool {
        use Opcode::*;
        if matches!(self, CountLeadingZeros32 | CountLeadingZeros64 | PopulationCount) {
            return true;
        }
        let name = self.name();
        (name.starts_with("Vector") || name.starts_with("FPVector"))
            && !matches!(self,
                VectorGetElement8 | VectorGetElement16 | VectorGetElement32 | VectorGetElement64 |
                VectorSetElement8 | VectorSetElement16 | VectorSetElement32 | VectorSetElement64 |
                VectorZeroUpper)
    }

    /// Returns true if this opcode works on whole 128-bit vector values or their lanes.
    pub fn is_vector(self) -> bool {
        let first = Opcode::VectorGetElement8 as u16;
        let last = Opcode::FPVectorSub64 as u16;
        (first..=last).contains(&(self as u16))
    }

    /// Returns true if this reads FPCR.
    pub fn reads_from_fpcr(self) -> bool {
        self == Opcode::A64GetFPCR || self.is_software_fp()
    }

    /// Returns true if this writes FPSR.
    pub fn writes_to_fpsr(self) -> bool {
        self == Opcode::A64OrQC || self.is_software_fp()
    }

    fn name(self) -> String {
        format!("{:?}", self)
    }

    fn info(self) -> OpcodeInfo {
        use Opcode::*;
        const V: Type = Type::Void;
        const U1: Type = Type::U1;
        const U8: Type = Type::U8;
        const U16: Type = Type::U16;
        const U32: Type = Type::U32;
        const U64: Type = Type::U64;
        const U128: Type = Type::U128;
        const A64V: Type = Type::A64Vec;
        const OPQ: Type = Type::Opaque;
        match self {
            // Core
            Void => OpcodeInfo { ret: V, args: &[] },
            GetSaturationFromOp => OpcodeInfo { ret: U1, args: &[OPQ] },

            // A64 context
            A64GetQ => OpcodeInfo { ret: U128, args: &[A64V] },
            A64SetQ => OpcodeInfo { ret: V, args: &[A64V, U128] },
            A64GetFPCR => OpcodeInfo { ret: U32, args: &[] },
            A64OrQC => OpcodeInfo { ret: V, args: &[U1] },
            A64CallSupervisor | A64Breakpoint | A64UndefinedInstruction =>
                OpcodeInfo { ret: V, args: &[U64, U32] },

            // Scalar integer
            SignExtendByteToLong | ZeroExtendByteToLong => OpcodeInfo { ret: U64, args: &[U8] },
            SignExtendHalfToLong | ZeroExtendHalfToLong => OpcodeInfo { ret: U64, args: &[U16] },
            SignExtendWordToLong | ZeroExtendWordToLong => OpcodeInfo { ret: U64, args: &[U32] },
            LeastSignificantByte => OpcodeInfo { ret: U8, args: &[U64] },
            Add64 | Sub64 | Mul64 | And64 | Eor64 |
            MaxSigned64 | MaxUnsigned64 | MinSigned64 | MinUnsigned64 =>
                OpcodeInfo { ret: U64, args: &[U64, U64] },
            LogicalShiftLeft64 | LogicalShiftRight64 | ArithmeticShiftRight64 =>
                OpcodeInfo { ret: U64, args: &[U64, U8] },
            Abs64 => OpcodeInfo { ret: U64, args: &[U64] },

            // Bit counting
            CountLeadingZeros32 => OpcodeInfo { ret: U32, args: &[U32] },
            CountLeadingZeros64 | PopulationCount | PopulationCountFallback8 =>
                OpcodeInfo { ret: U64, args: &[U64] },
            CountLeadingZerosFallback => OpcodeInfo { ret: U64, args: &[U64, U8] },

            // Saturated
            SignedSaturatedAdd8 | SignedSaturatedAdd16 | SignedSaturatedAdd32 | SignedSaturatedAdd64 |
            SignedSaturatedSub8 | SignedSaturatedSub16 | SignedSaturatedSub32 | SignedSaturatedSub64 |
            UnsignedSaturatedAdd8 | UnsignedSaturatedAdd16 | UnsignedSaturatedAdd32 | UnsignedSaturatedAdd64 |
            UnsignedSaturatedSub8 | UnsignedSaturatedSub16 | UnsignedSaturatedSub32 | UnsignedSaturatedSub64 |
            SignedSaturatedAccumulateUnsigned8 | SignedSaturatedAccumulateUnsigned16 |
            SignedSaturatedAccumulateUnsigned32 | SignedSaturatedAccumulateUnsigned64 |
            UnsignedSaturatedAccumulateSigned8 | UnsignedSaturatedAccumulateSigned16 |
            UnsignedSaturatedAccumulateSigned32 | UnsignedSaturatedAccumulateSigned64 |
            SignedSaturatedDoublingMultiplyReturnHigh16 | SignedSaturatedDoublingMultiplyReturnHigh32 |
            SignedSaturatedRoundingDoublingMultiplyReturnHigh16 |
            SignedSaturatedRoundingDoublingMultiplyReturnHigh32 =>
                OpcodeInfo { ret: U64, args: &[U64, U64] },
            SignedSaturatedNeg8 | SignedSaturatedNeg16 | SignedSaturatedNeg32 | SignedSaturatedNeg64 |
            SignedSaturatedAbs8 | SignedSaturatedAbs16 | SignedSaturatedAbs32 | SignedSaturatedAbs64 =>
                OpcodeInfo { ret: U64, args: &[U64] },
            SignedSaturatedNarrowToSigned | SignedSaturatedNarrowToUnsigned | UnsignedSaturatedNarrow =>
                OpcodeInfo { ret: U64, args: &[U64, U8] },

            // Vector lane access
            VectorGetElement8 => OpcodeInfo { ret: U8, args: &[U128, U8] },
            VectorGetElement16 => OpcodeInfo { ret: U16, args: &[U128, U8] },
            VectorGetElement32 => OpcodeInfo { ret: U32, args: &[U128, U8] },
            VectorGetElement64 => OpcodeInfo { ret: U64, args: &[U128, U8] },
            VectorSetElement8 | VectorSetElement16 | VectorSetElement32 | VectorSetElement64 =>
                OpcodeInfo { ret: U128, args: &[U128, U8, OPQ] },
            VectorBroadcastElement32 | VectorBroadcastElement64 =>
                OpcodeInfo { ret: U128, args: &[U128, U8] },
            VectorExtract => OpcodeInfo { ret: U128, args: &[U128, U128, U8] },
            VectorZeroUpper => OpcodeInfo { ret: U128, args: &[U128] },
            ZeroVector => OpcodeInfo { ret: U128, args: &[] },

            // Native vector unary
            VectorAbs8 | VectorAbs16 | VectorAbs32 |
            VectorSignExtend8 | VectorSignExtend16 | VectorSignExtend32 |
            VectorZeroExtend8 | VectorZeroExtend16 | VectorZeroExtend32 |
            FPVectorAbs32 | FPVectorAbs64 | FPVectorNeg32 | FPVectorNeg64 |
            FPVectorSqrt32 | FPVectorSqrt64 => OpcodeInfo { ret: U128, args: &[U128] },

            // Native vector binary
            VectorAdd8 | VectorAdd16 | VectorAdd32 | VectorAdd64 |
            VectorSub8 | VectorSub16 | VectorSub32 | VectorSub64 |
            VectorMultiply8 | VectorMultiply16 | VectorMultiply32 |
            VectorMaxSigned8 | VectorMaxSigned16 | VectorMaxSigned32 |
            VectorMaxUnsigned8 | VectorMaxUnsigned16 | VectorMaxUnsigned32 |
            VectorMinSigned8 | VectorMinSigned16 | VectorMinSigned32 |
            VectorMinUnsigned8 | VectorMinUnsigned16 | VectorMinUnsigned32 |
            VectorRoundingHalvingAddUnsigned8 | VectorRoundingHalvingAddUnsigned16 |
            FPVectorAdd32 | FPVectorAdd64 | FPVectorDiv32 | FPVectorDiv64 |
            FPVectorMax32 | FPVectorMax64 | FPVectorMin32 | FPVectorMin64 |
            FPVectorMul32 | FPVectorMul64 | FPVectorSub32 | FPVectorSub64 =>
                OpcodeInfo { ret: U128, args: &[U128, U128] },
            FPVectorMulAdd32 | FPVectorMulAdd64 => OpcodeInfo { ret: U128, args: &[U128, U128, U128] },
            FPVectorRoundInt32 | FPVectorRoundInt64 => OpcodeInfo { ret: U128, args: &[U128, U8] },

            // Software FP, single precision
            FPAbs32 | FPNeg32 | FPSqrt32 | FPRecipEstimate32 | FPRecipExponent32 | FPRSqrtEstimate32 =>
                OpcodeInfo { ret: U32, args: &[U32] },
            FPAdd32 | FPDiv32 | FPMax32 | FPMaxNumeric32 | FPMin32 | FPMinNumeric32 |
            FPMul32 | FPMulX32 | FPRecipStepFused32 | FPRSqrtStepFused32 | FPSub32 =>
                OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPMulAdd32 => OpcodeInfo { ret: U32, args: &[U32, U32, U32] },
            FPRoundInt32 => OpcodeInfo { ret: U32, args: &[U32, U8, U1] },

            // Software FP, double precision
            FPAbs64 | FPNeg64 | FPSqrt64 | FPRecipEstimate64 | FPRecipExponent64 | FPRSqrtEstimate64 =>
                OpcodeInfo { ret: U64, args: &[U64] },
            FPAdd64 | FPDiv64 | FPMax64 | FPMaxNumeric64 | FPMin64 | FPMinNumeric64 |
            FPMul64 | FPMulX64 | FPRecipStepFused64 | FPRSqrtStepFused64 | FPSub64 =>
                OpcodeInfo { ret: U64, args: &[U64, U64] },
            FPMulAdd64 => OpcodeInfo { ret: U64, args: &[U64, U64, U64] },
            FPRoundInt64 => OpcodeInfo { ret: U64, args: &[U64, U8, U1] },
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_metadata() {
        assert_eq!(Opcode::Void.return_type(), Type::Void);
        assert_eq!(Opcode::Void.num_args(), 0);

        assert_eq!(Opcode::A64GetQ.return_type(), Type::U128);
        assert_eq!(Opcode::A64GetQ.arg_types(), &[Type::A64Vec]);

        assert_eq!(Opcode::VectorGetElement16.return_type(), Type::U16);
        assert_eq!(Opcode::VectorSetElement16.num_args(), 3);

        assert_eq!(Opcode::FPMulAdd64.arg_types(), &[Type::U64, Type::U64, Type::U64]);
        assert_eq!(Opcode::FPRoundInt32.arg_types(), &[Type::U32, Type::U8, Type::U1]);
    }

    #[test]
    fn test_opcode_side_effects() {
        assert!(Opcode::A64SetQ.has_side_effects());
        assert!(Opcode::A64UndefinedInstruction.has_side_effects());
        assert!(Opcode::FPAdd32.has_side_effects());
        assert!(!Opcode::FPNeg32.has_side_effects());
        assert!(!Opcode::FPVectorAdd32.has_side_effects());
        assert!(!Opcode::SignedSaturatedAdd8.has_side_effects());
    }

    #[test]
    fn test_opcode_classification() {
        assert!(Opcode::FPVectorMulAdd32.is_host_native());
        assert!(Opcode::VectorAdd8.is_host_native());
        assert!(Opcode::PopulationCount.is_host_native());
        assert!(!Opcode::PopulationCountFallback8.is_host_native());
        assert!(!Opcode::VectorGetElement8.is_host_native());
        assert!(!Opcode::FPAdd32.is_host_native());
        assert!(Opcode::FPAdd32.is_software_fp());
        assert!(Opcode::UnsignedSaturatedNarrow.may_saturate());
        assert!(Opcode::FPRoundInt64.reads_from_fpcr());
        assert!(Opcode::ZeroVector.is_vector());
        assert!(Opcode::FPVectorSub64.is_vector());
        assert!(!Opcode::FPAbs32.is_vector());
        assert!(!Opcode::UnsignedSaturatedNarrow.is_vector());
    }
}
