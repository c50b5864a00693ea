use std::fmt;

use crate::ir::opcode::Opcode;
use crate::ir::types::Type;
use crate::ir::value::Value;

/// Maximum number of arguments per IR instruction.
pub const MAX_ARGS: usize = 4;

/// A single IR instruction in SSA form.
#[derive(Debug, Clone)]
pub struct Inst {
    pub opcode: Opcode,
    /// Arguments to the instruction (up to MAX_ARGS, rest are Value::Void).
    pub args: [Value; MAX_ARGS],
    /// Number of other instructions that use this instruction's result.
    pub use_count: u32,
}

impl Inst {
    pub fn new(opcode: Opcode, args: &[Value]) -> Self {
        assert!(args.len() <= MAX_ARGS, "Too many args ({}) for opcode {:?}", args.len(), opcode);
        assert_eq!(
            args.len(),
            opcode.num_args(),
            "Wrong argument count for opcode {:?}",
            opcode
        );
        let mut inst_args = [Value::Void; MAX_ARGS];
        inst_args[..args.len()].copy_from_slice(args);
        Self {
            opcode,
            args: inst_args,
            use_count: 0,
        }
    }

    pub fn return_type(&self) -> Type {
        self.opcode.return_type()
    }

    pub fn num_args(&self) -> usize {
        self.opcode.num_args()
    }

    pub fn arg(&self, idx: usize) -> Value {
        self.args[idx]
    }

    /// Returns true if this instruction has been tombstoned (removed).
    pub fn is_tombstone(&self) -> bool {
        self.opcode == Opcode::Void && self.use_count == 0
    }

    pub fn has_side_effects(&self) -> bool {
        self.opcode.has_side_effects()
    }

    /// Tombstone this instruction (mark as removed).
    pub fn tombstone(&mut self) {
        self.opcode = Opcode::Void;
        self.args = [Value::Void; MAX_ARGS];
    }

    /// Get all argument values as an iterator.
    pub fn arg_values(&self) -> impl Iterator<Item = &Value> {
        self.args[..self.num_args()].iter()
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        let n = self.num_args();
        if n > 0 {
            write!(f, " ")?;
            for i in 0..n {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.args[i])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::value::InstRef;

    #[test]
    fn test_inst_creation() {
        let inst = Inst::new(Opcode::Add64, &[
            Value::Inst(InstRef(0)),
            Value::Inst(InstRef(1)),
        ]);
        assert_eq!(inst.opcode, Opcode::Add64);
        assert_eq!(inst.num_args(), 2);
        assert_eq!(inst.use_count, 0);
        assert_eq!(inst.to_string(), "Add64 %0, %1");
    }

    #[test]
    fn test_inst_tombstone() {
        let mut inst = Inst::new(Opcode::Add64, &[Value::ImmU64(1), Value::ImmU64(2)]);
        assert!(!inst.is_tombstone());
        inst.tombstone();
        assert!(inst.is_tombstone());
    }

    #[test]
    #[should_panic(expected = "Wrong argument count")]
    fn test_inst_wrong_arity_panics() {
        Inst::new(Opcode::Add64, &[Value::ImmU64(1)]);
    }
}
