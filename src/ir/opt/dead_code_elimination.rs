use crate::ir::block::Block;
use crate::ir::value::Value;

/// Dead code elimination pass.
/// Iterates instructions in reverse order. Any instruction with no uses
/// and no side effects is tombstoned. Removing an instruction decrements
/// use counts for its arguments, potentially enabling further eliminations.
///
/// Returns the number of instructions removed.
pub fn dead_code_elimination(block: &mut Block) -> usize {
    let mut removed = 0;
    for i in (0..block.instructions.len()).rev() {
        let inst = &block.instructions[i];
        if inst.is_tombstone() || inst.use_count != 0 || inst.has_side_effects() {
            continue;
        }

        let arg_refs: Vec<_> = inst
            .arg_values()
            .filter_map(|arg| if let Value::Inst(r) = arg { Some(*r) } else { None })
            .collect();

        block.instructions[i].tombstone();
        removed += 1;

        for arg_ref in arg_refs {
            let target = &mut block.instructions[arg_ref.index()];
            target.use_count = target.use_count.saturating_sub(1);
        }
    }

    if removed > 0 {
        log::trace!("dce: removed {} instructions from block {:#x}", removed, block.position);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::a64::types::Vec;
    use crate::ir::opcode::Opcode;

    #[test]
    fn test_dce_removes_unused() {
        let mut block = Block::new(0);
        block.append(Opcode::Add64, &[Value::ImmU64(1), Value::ImmU64(2)]);
        assert_eq!(block.live_inst_count(), 1);

        assert_eq!(dead_code_elimination(&mut block), 1);
        assert_eq!(block.live_inst_count(), 0);
    }

    #[test]
    fn test_dce_keeps_side_effects() {
        let mut block = Block::new(0);
        let zero = block.append(Opcode::ZeroVector, &[]);
        block.append(Opcode::A64SetQ, &[Value::ImmA64Vec(Vec::V0), Value::Inst(zero)]);
        block.append(Opcode::FPAdd32, &[Value::ImmU32(0), Value::ImmU32(0)]);

        assert_eq!(dead_code_elimination(&mut block), 0);
        assert_eq!(block.live_inst_count(), 3);
    }

    #[test]
    fn test_dce_cascades() {
        let mut block = Block::new(0);
        let q = block.append(Opcode::A64GetQ, &[Value::ImmA64Vec(Vec::V3)]);
        let lane = block.append(Opcode::VectorGetElement32, &[Value::Inst(q), Value::ImmU8(1)]);
        let _unused = block.append(Opcode::ZeroExtendWordToLong, &[Value::Inst(lane)]);
        assert_eq!(block.get(q).use_count, 1);

        // the tail goes first, which frees its producers in the same sweep
        assert_eq!(dead_code_elimination(&mut block), 3);
        assert_eq!(block.live_inst_count(), 0);
    }
}
