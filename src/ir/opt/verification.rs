use std::collections::HashMap;

use thiserror::Error;

use crate::ir::block::Block;
use crate::ir::opcode::Opcode;
use crate::ir::types::Type;
use crate::ir::value::{InstRef, Value};

/// A violated block invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("{inst}: argument {index} of {opcode} has type {actual}, expected {expected}")]
    ArgumentType {
        inst: InstRef,
        opcode: Opcode,
        index: usize,
        actual: Type,
        expected: Type,
    },
    #[error("{inst}: argument {index} refers to {target}, which is not an earlier live instruction")]
    BadReference { inst: InstRef, index: usize, target: InstRef },
    #[error("{inst}: use count is {recorded}, but it has {actual} uses")]
    UseCount { inst: InstRef, recorded: u32, actual: u32 },
    #[error("{inst}: GetSaturationFromOp reads {source_opcode}, which cannot saturate")]
    SaturationSource { inst: InstRef, source_opcode: Opcode },
}

/// Verification pass: checks IR block invariants.
///
/// 1. Instruction references point backwards at live instructions (SSA order).
/// 2. Each instruction's argument types match the opcode's expected arg types.
/// 3. Actual use counts match the `use_count` field on each instruction.
/// 4. Saturation pseudo-ops read an instruction that reports saturation.
pub fn verification_pass(block: &Block) -> Result<(), VerificationError> {
    let mut actual_uses: HashMap<usize, u32> = HashMap::new();

    for (inst_ref, inst) in block.iter_live() {
        for (index, expected) in inst.opcode.arg_types().iter().enumerate() {
            let arg = inst.arg(index);
            let actual = match arg {
                Value::Inst(target) => {
                    if target.index() >= inst_ref.index() || block.get(target).is_tombstone() {
                        return Err(VerificationError::BadReference { inst: inst_ref, index, target });
                    }
                    *actual_uses.entry(target.index()).or_insert(0) += 1;
                    block.get(target).return_type()
                }
                other => other.get_type(),
            };
            if !actual.is_compatible_with(*expected) {
                return Err(VerificationError::ArgumentType {
                    inst: inst_ref,
                    opcode: inst.opcode,
                    index,
                    actual,
                    expected: *expected,
                });
            }
        }

        if inst.opcode.is_pseudo_operation() {
            let source = block.get(inst.arg(0).inst_ref()).opcode;
            if !source.may_saturate() {
                return Err(VerificationError::SaturationSource { inst: inst_ref, source_opcode: source });
            }
        }
    }

    for (inst_ref, inst) in block.iter_live() {
        let actual = actual_uses.get(&inst_ref.index()).copied().unwrap_or(0);
        if inst.use_count != actual {
            return Err(VerificationError::UseCount { inst: inst_ref, recorded: inst.use_count, actual });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::a64::types::Vec;

    #[test]
    fn test_verification_passes_valid_block() {
        let mut block = Block::new(0);
        let q = block.append(Opcode::A64GetQ, &[Value::ImmA64Vec(Vec::V2)]);
        let lane = block.append(Opcode::VectorGetElement8, &[Value::Inst(q), Value::ImmU8(0)]);
        let wide = block.append(Opcode::ZeroExtendByteToLong, &[Value::Inst(lane)]);
        let sat = block.append(Opcode::UnsignedSaturatedAdd8, &[Value::Inst(wide), Value::ImmU64(1)]);
        let flag = block.append(Opcode::GetSaturationFromOp, &[Value::Inst(sat)]);
        block.append(Opcode::A64OrQC, &[Value::Inst(flag)]);

        assert_eq!(verification_pass(&block), Ok(()));
    }

    #[test]
    fn test_verification_detects_use_count_mismatch() {
        let mut block = Block::new(0);
        let a = block.append(Opcode::ZeroVector, &[]);
        block.append(Opcode::A64SetQ, &[Value::ImmA64Vec(Vec::V1), Value::Inst(a)]);
        block.instructions[a.index()].use_count = 5;

        assert_eq!(
            verification_pass(&block),
            Err(VerificationError::UseCount { inst: a, recorded: 5, actual: 1 })
        );
    }

    #[test]
    fn test_verification_detects_type_mismatch() {
        let mut block = Block::new(0);
        let q = block.append(Opcode::A64GetQ, &[Value::ImmA64Vec(Vec::V0)]);
        let add = block.append(Opcode::Add64, &[Value::Inst(q), Value::ImmU64(1)]);

        let err = verification_pass(&block).unwrap_err();
        assert_eq!(
            err,
            VerificationError::ArgumentType {
                inst: add,
                opcode: Opcode::Add64,
                index: 0,
                actual: Type::U128,
                expected: Type::U64,
            }
        );
        assert!(err.to_string().contains("expected U64"));
    }

    #[test]
    fn test_verification_rejects_non_saturating_source() {
        let mut block = Block::new(0);
        let add = block.append(Opcode::Add64, &[Value::ImmU64(1), Value::ImmU64(2)]);
        let flag = block.append(Opcode::GetSaturationFromOp, &[Value::Inst(add)]);
        block.append(Opcode::A64OrQC, &[Value::Inst(flag)]);

        assert!(matches!(
            verification_pass(&block),
            Err(VerificationError::SaturationSource { source_opcode: Opcode::Add64, .. })
        ));
    }
}
