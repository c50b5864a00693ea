mod bit_count;
mod exception;
mod floating_point;
mod fp_vector;
mod helpers;
mod integer;
mod reduce;
mod saturated;
mod visitor;

pub use visitor::TranslatorVisitor;

use std::sync::OnceLock;

use crate::config::{EmitConfig, OptimizationFlag};
use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::types::InstName;
use crate::ir::block::Block;
use crate::ir::opt;

/// Emits IR for one decoded instruction. Returns false when the instruction ends the block.
pub type Handler = fn(&mut TranslatorVisitor<'_>, &OpDescriptor) -> bool;

macro_rules! handler_table {
    ($($name:ident => $method:ident),* $(,)?) => {
        fn build_handler_table() -> Vec<Handler> {
            let mut table: Vec<Option<Handler>> = vec![None; InstName::COUNT];
            $(
                let handler: Handler = |v, op| v.$method(op);
                table[InstName::$name.index()] = Some(handler);
            )*
            table
                .into_iter()
                .enumerate()
                .map(|(i, handler)| {
                    handler.unwrap_or_else(|| panic!("no handler for {}", InstName::ALL[i]))
                })
                .collect()
        }
    };
}

handler_table! {
    // Integer arithmetic
    ABS_S => abs_s, ABS_V => abs_v, ADD_S => add_s, ADD_V => add_v,
    ADDHN => addhn, ADDP_S => addp_s, ADDP_V => addp_v, ADDV => addv,
    MLA_V => mla_v, MLA_Ve => mla_ve, MLS_V => mls_v, MLS_Ve => mls_ve,
    MUL_V => mul_v, MUL_Ve => mul_ve, NEG_S => neg_s, NEG_V => neg_v,
    RADDHN => raddhn, RSUBHN => rsubhn, SUB_S => sub_s, SUB_V => sub_v, SUBHN => subhn,
    SABA => saba, SABAL => sabal, SABD => sabd, SABDL => sabdl,
    SADALP => sadalp, SADDL => saddl, SADDLP => saddlp, SADDLV => saddlv, SADDW => saddw,
    SHADD => shadd, SHSUB => shsub, SMAX => smax, SMAXP => smaxp, SMAXV => smaxv,
    SMIN => smin, SMINP => sminp, SMINV => sminv,
    SMLAL => smlal, SMLSL => smlsl, SMULL => smull, SRHADD => srhadd, SSUBL => ssubl, SSUBW => ssubw,
    UABA => uaba, UABAL => uabal, UABD => uabd, UABDL => uabdl,
    UADALP => uadalp, UADDL => uaddl, UADDLP => uaddlp, UADDLV => uaddlv, UADDW => uaddw,
    UHADD => uhadd, UHSUB => uhsub, UMAX => umax, UMAXP => umaxp, UMAXV => umaxv,
    UMIN => umin, UMINP => uminp, UMINV => uminv,
    UMLAL => umlal, UMLSL => umlsl, UMULL => umull, URHADD => urhadd, USUBL => usubl, USUBW => usubw,

    // Saturating
    SQABS_S => sqabs_s, SQABS_V => sqabs_v, SQADD_S => sqadd_s, SQADD_V => sqadd_v,
    SQDMULH_S => sqdmulh_s, SQDMULH_V => sqdmulh_v, SQNEG_S => sqneg_s, SQNEG_V => sqneg_v,
    SQRDMULH_S => sqrdmulh_s, SQRDMULH_V => sqrdmulh_v, SQSUB_S => sqsub_s, SQSUB_V => sqsub_v,
    SQXTN_S => sqxtn_s, SQXTN_V => sqxtn_v, SQXTUN_S => sqxtun_s, SQXTUN_V => sqxtun_v,
    SUQADD_S => suqadd_s, SUQADD_V => suqadd_v, UQADD_S => uqadd_s, UQADD_V => uqadd_v,
    UQSUB_S => uqsub_s, UQSUB_V => uqsub_v, UQXTN_S => uqxtn_s, UQXTN_V => uqxtn_v,
    USQADD_S => usqadd_s, USQADD_V => usqadd_v,

    // Bit counting
    CLS => cls, CLZ => clz, CNT => cnt,

    // Floating point
    FABD_S => fabd_s, FABS_S => fabs_s, FABS_V => fabs_v, FADD_S => fadd_s, FADD_V => fadd_v,
    FADDP_S => faddp_s, FADDP_V => faddp_v, FDIV_S => fdiv_s, FDIV_V => fdiv_v,
    FMADD_S => fmadd_s, FMAX_S => fmax_s, FMAX_V => fmax_v, FMAXNM_S => fmaxnm_s,
    FMAXNM_V => fmaxnm_v, FMAXNMV => fmaxnmv, FMAXP_V => fmaxp_v, FMAXV => fmaxv,
    FMIN_S => fmin_s, FMIN_V => fmin_v, FMINNM_S => fminnm_s, FMINNM_V => fminnm_v,
    FMINNMV => fminnmv, FMINP_V => fminp_v, FMINV => fminv,
    FMLA_Se => fmla_se, FMLA_V => fmla_v, FMLA_Ve => fmla_ve,
    FMLS_Se => fmls_se, FMLS_V => fmls_v, FMLS_Ve => fmls_ve, FMSUB_S => fmsub_s,
    FMUL_S => fmul_s, FMUL_Se => fmul_se, FMUL_V => fmul_v, FMUL_Ve => fmul_ve,
    FMULX_S => fmulx_s, FMULX_Se => fmulx_se, FMULX_V => fmulx_v, FMULX_Ve => fmulx_ve,
    FNEG_S => fneg_s, FNEG_V => fneg_v, FNMADD_S => fnmadd_s, FNMSUB_S => fnmsub_s, FNMUL_S => fnmul_s,
    FRECPE_S => frecpe_s, FRECPE_V => frecpe_v, FRECPS_S => frecps_s, FRECPS_V => frecps_v,
    FRECPX_S => frecpx_s,
    FRINTA_S => frinta_s, FRINTA_V => frinta_v, FRINTI_S => frinti_s, FRINTI_V => frinti_v,
    FRINTM_S => frintm_s, FRINTM_V => frintm_v, FRINTN_S => frintn_s, FRINTN_V => frintn_v,
    FRINTP_S => frintp_s, FRINTP_V => frintp_v, FRINTX_S => frintx_s, FRINTX_V => frintx_v,
    FRINTZ_S => frintz_s, FRINTZ_V => frintz_v,
    FRSQRTE_S => frsqrte_s, FRSQRTE_V => frsqrte_v, FRSQRTS_S => frsqrts_s, FRSQRTS_V => frsqrts_v,
    FSQRT_S => fsqrt_s, FSQRT_V => fsqrt_v, FSUB_S => fsub_s, FSUB_V => fsub_v,

    // Exception generating
    BRK => brk, SVC => svc, UDF => udf,
}

/// The handler for every `InstName`, built on first use.
pub fn handler(name: InstName) -> Handler {
    static TABLE: OnceLock<Vec<Handler>> = OnceLock::new();
    TABLE.get_or_init(build_handler_table)[name.index()]
}

impl<'a> TranslatorVisitor<'a> {
    /// Emit IR for `op`. Returns false when the instruction ends the block.
    pub fn dispatch(&mut self, op: &OpDescriptor) -> bool {
        log::trace!("{:#x}: {} size={} {:?}", op.position, op.name, op.size, op.register_size);
        handler(op.name)(self, op)
    }
}

/// Emit IR for a single decoded instruction.
pub fn translate(op: &OpDescriptor, config: &EmitConfig) -> Block {
    translate_all(std::slice::from_ref(op), config)
}

/// Emit IR for a sequence of decoded instructions into one block.
///
/// Translation stops after an exception-generating instruction. The block's weight is the
/// number of instructions translated.
pub fn translate_all(ops: &[OpDescriptor], config: &EmitConfig) -> Block {
    let position = ops.first().map_or(0, |op| op.position);
    let mut block = Block::new(position);

    let mut visitor = TranslatorVisitor::new(&mut block, *config);
    for op in ops {
        visitor.ir.block.weight += 1;
        if !visitor.dispatch(op) {
            break;
        }
    }
    drop(visitor);

    if config.has_optimization(OptimizationFlag::DEAD_CODE_ELIMINATION) {
        let removed = opt::dead_code_elimination(&mut block);
        log::trace!("dead code elimination removed {} insts", removed);
    }
    if config.has_optimization(OptimizationFlag::VERIFY_IR) {
        if let Err(e) = opt::verification_pass(&block) {
            panic!("emitted invalid IR for block {:#x}: {}\n{}", position, e, block);
        }
    }

    log::debug!(
        "translated {} insts at {:#x} into {} IR insts",
        block.weight,
        position,
        block.live_inst_count()
    );
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::a64::types::Vec;
    use crate::ir::opcode::Opcode;

    #[test]
    fn test_handler_table_is_complete() {
        for &name in InstName::ALL {
            // Panics while building if any instruction has no handler.
            let _ = handler(name);
        }
    }

    #[test]
    fn test_translate_all_stops_at_exception() {
        let ops = [
            OpDescriptor::new(InstName::ADD_V).at(0x100).with_regs(Vec::V0, Vec::V1, Vec::V2),
            OpDescriptor::new(InstName::SVC).at(0x104).with_immediate(7),
            OpDescriptor::new(InstName::SUB_V).at(0x108).with_regs(Vec::V3, Vec::V1, Vec::V2),
        ];
        let block = translate_all(&ops, &EmitConfig::portable());
        assert_eq!(block.position, 0x100);
        assert_eq!(block.weight, 2);
        assert!(block.contains_opcode(Opcode::A64CallSupervisor));
        assert!(!block.contains_opcode(Opcode::Sub64));
    }

    #[test]
    fn test_dead_code_elimination_drops_unused_reads() {
        // FMUL by element reads Rd without using it.
        let op = OpDescriptor::new(InstName::FMUL_Ve).with_regs(Vec::V0, Vec::V1, Vec::V2);
        let block = translate(&op, &EmitConfig::portable());
        assert_eq!(block.count_opcode(Opcode::A64GetQ), 2);
    }

    #[test]
    fn test_translation_is_deterministic() {
        let op = OpDescriptor::new(InstName::SQRDMULH_V).with_size(1).half();
        let config = EmitConfig::portable();
        assert_eq!(translate(&op, &config).to_string(), translate(&op, &config).to_string());
    }
}
