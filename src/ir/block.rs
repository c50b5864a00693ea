use std::fmt;

use crate::ir::inst::Inst;
use crate::ir::opcode::Opcode;
use crate::ir::types::Type;
use crate::ir::value::{InstRef, Value};

/// An IR block: the emitted code for one or more guest instructions.
/// Instructions are stored in a `Vec<Inst>` arena, indexed by `InstRef(u32)`.
/// Removal is done by tombstoning (setting opcode to Void).
#[derive(Debug, Clone)]
pub struct Block {
    /// Guest position of the first instruction in this block.
    pub position: u64,
    /// Arena of instructions.
    pub instructions: Vec<Inst>,
    /// Approximate guest instruction count, reported to the thread state after execution.
    pub weight: u64,
}

impl Block {
    pub fn new(position: u64) -> Self {
        Self {
            position,
            instructions: Vec::new(),
            weight: 0,
        }
    }

    /// Append a new instruction with the given opcode and args, return its InstRef.
    /// Also increments use_count for any InstRef arguments.
    pub fn append(&mut self, opcode: Opcode, args: &[Value]) -> InstRef {
        for arg in args {
            if let Value::Inst(ref_) = arg {
                self.instructions[ref_.index()].use_count += 1;
            }
        }
        let idx = self.instructions.len();
        self.instructions.push(Inst::new(opcode, args));
        InstRef(idx as u32)
    }

    pub fn get(&self, r: InstRef) -> &Inst {
        &self.instructions[r.index()]
    }

    pub fn get_mut(&mut self, r: InstRef) -> &mut Inst {
        &mut self.instructions[r.index()]
    }

    /// Returns the number of (non-tombstoned) instructions.
    pub fn live_inst_count(&self) -> usize {
        self.instructions.iter().filter(|i| !i.is_tombstone()).count()
    }

    /// Returns the total number of instruction slots (including tombstones).
    pub fn inst_count(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Iterate over all live (non-tombstoned) instructions with their InstRefs.
    pub fn iter_live(&self) -> impl Iterator<Item = (InstRef, &Inst)> {
        self.instructions.iter().enumerate()
            .filter(|(_, inst)| !inst.is_tombstone())
            .map(|(i, inst)| (InstRef(i as u32), inst))
    }

    /// Number of live instructions with the given opcode.
    pub fn count_opcode(&self, opcode: Opcode) -> usize {
        self.iter_live().filter(|(_, inst)| inst.opcode == opcode).count()
    }

    /// Returns true if any live instruction uses the given opcode.
    pub fn contains_opcode(&self, opcode: Opcode) -> bool {
        self.count_opcode(opcode) > 0
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block {:#x} (weight: {}):", self.position, self.weight)?;
        for (ref_, inst) in self.iter_live() {
            if inst.return_type() != Type::Void {
                writeln!(f, "  {} = {}", ref_, inst)?;
            } else {
                writeln!(f, "  {}", inst)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::a64::types::Vec;

    #[test]
    fn test_block_creation_and_append() {
        let mut block = Block::new(0x1000);

        let q2 = block.append(Opcode::A64GetQ, &[Value::ImmA64Vec(Vec::V2)]);
        let q3 = block.append(Opcode::A64GetQ, &[Value::ImmA64Vec(Vec::V3)]);
        let sum = block.append(Opcode::VectorAdd32, &[Value::Inst(q2), Value::Inst(q3)]);
        block.append(Opcode::A64SetQ, &[Value::ImmA64Vec(Vec::V1), Value::Inst(sum)]);

        assert_eq!(block.inst_count(), 4);
        assert_eq!(block.live_inst_count(), 4);

        assert_eq!(block.get(q2).use_count, 1);
        assert_eq!(block.get(q3).use_count, 1);
        assert_eq!(block.get(sum).use_count, 1);

        let s = format!("{}", block);
        assert!(s.contains("%2 = VectorAdd32 %0, %1"));
        assert!(s.contains("A64SetQ V1, %2"));
        assert!(block.contains_opcode(Opcode::VectorAdd32));
    }

    #[test]
    fn test_block_tombstone() {
        let mut block = Block::new(0);
        let r = block.append(Opcode::ZeroVector, &[]);
        assert_eq!(block.live_inst_count(), 1);
        block.get_mut(r).tombstone();
        assert_eq!(block.live_inst_count(), 0);
        assert_eq!(block.inst_count(), 1);
    }
}
