use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::translate::visitor::TranslatorVisitor;

/// Exception-generating instructions. Each one ends the block: the supervisor decides what
/// runs next.
impl<'a> TranslatorVisitor<'a> {
    /// BRK - Breakpoint
    pub fn brk(&mut self, op: &OpDescriptor) -> bool {
        log::debug!("BRK #{:#x} at {:#x}", op.immediate, op.position);
        self.ir.breakpoint(op.position, op.immediate);
        false
    }

    /// SVC - Supervisor call
    pub fn svc(&mut self, op: &OpDescriptor) -> bool {
        log::debug!("SVC #{:#x} at {:#x}", op.immediate, op.position);
        self.ir.call_supervisor(op.position, op.immediate);
        false
    }

    /// UDF, and any encoding the decoder could not allocate. Reports the raw bits unchanged.
    pub fn udf(&mut self, op: &OpDescriptor) -> bool {
        log::debug!("undefined instruction {:#010x} at {:#x}", op.raw, op.position);
        self.ir.undefined_instruction(op.position, op.raw);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitConfig;
    use crate::frontend::a64::types::InstName;
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    #[test]
    fn test_exceptions_end_translation() {
        let mut block = Block::new(0x1000);
        let mut v = TranslatorVisitor::new(&mut block, EmitConfig::portable());
        let op = OpDescriptor::new(InstName::UDF).at(0x1000).with_raw(0x0000_FFFF);
        assert!(!v.udf(&op));
        drop(v);
        assert!(block.contains_opcode(Opcode::A64UndefinedInstruction));
        assert!(block.to_string().contains("#0xffff"));
    }
}
