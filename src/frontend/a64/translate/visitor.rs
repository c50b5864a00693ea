use crate::config::{EmitConfig, OptimizationFlag};
use crate::frontend::a64::descriptor::OpDescriptor;
use crate::frontend::a64::types::Vec;
use crate::host_features::HostFeature;
use crate::ir::block::Block;
use crate::ir::emitter::IREmitter;
use crate::ir::value::Value;

/// Emits IR for decoded SIMD&FP operations into one block.
///
/// Every strategy decision (native vector instruction or exact software routine) is made here,
/// from the [`EmitConfig`] snapshot, while emitting. Emitted code never re-checks host features.
pub struct TranslatorVisitor<'a> {
    pub ir: IREmitter<'a>,
    pub config: EmitConfig,
}

impl<'a> TranslatorVisitor<'a> {
    pub fn new(block: &'a mut Block, config: EmitConfig) -> Self {
        Self {
            ir: IREmitter::new(block),
            config,
        }
    }

    /// Contract violation: the decoder handed over a size or width this form does not have.
    pub fn reserved(&self, op: &OpDescriptor) -> ! {
        panic!(
            "{}: reserved encoding (size {}, {:?})",
            op.name, op.size, op.register_size
        )
    }

    // --- Register access ---

    pub fn v(&mut self, reg: Vec) -> Value {
        self.ir.get_q(reg)
    }

    /// Write the result of a vector-form operation. Half-width forms clear the upper 64 bits.
    pub fn set_v(&mut self, op: &OpDescriptor, reg: Vec, value: Value) {
        let value = if op.is_half() {
            self.clear_upper_half(value)
        } else {
            value
        };
        self.ir.set_q(reg, value);
    }

    /// Write a value that already has the full 128-bit architectural shape.
    pub fn set_v_full(&mut self, reg: Vec, value: Value) {
        self.ir.set_q(reg, value);
    }

    // --- Lane primitives ---

    /// Lane `index` of `vector`, sign- or zero-extended to 64 bits.
    pub fn extract(&mut self, vector: Value, index: usize, esize: usize, signed: bool) -> Value {
        let lane = self.ir.vector_get_element(esize, vector, index);
        self.ir.extend_to_long(lane, esize, signed)
    }

    /// Lane `index` of `vector` as its raw `esize`-bit pattern (float lanes).
    pub fn extract_raw(&mut self, vector: Value, index: usize, esize: usize) -> Value {
        self.ir.vector_get_element(esize, vector, index)
    }

    /// `vector` with lane `index` replaced by the low `esize` bits of `value`.
    pub fn insert(&mut self, vector: Value, index: usize, esize: usize, value: Value) -> Value {
        self.ir.vector_set_element(esize, vector, index, value)
    }

    pub fn clear_upper_half(&mut self, vector: Value) -> Value {
        self.ir.vector_zero_upper(vector)
    }

    /// A register holding `value` in lane 0 and zeros elsewhere (scalar SIMD&FP results).
    pub fn scalar_result(&mut self, esize: usize, value: Value) -> Value {
        let zero = self.ir.zero_vector();
        self.ir.vector_set_element(esize, zero, 0, value)
    }

    // --- Saturation ---

    /// Fold the saturation side result of `value` into FPSR.QC when tracking is on.
    pub fn track_saturation(&mut self, value: Value) {
        if self.config.track_saturation {
            let saturated = self.ir.get_saturation_from_op(value);
            self.ir.or_qc(saturated);
        }
    }

    // --- Path selection ---

    /// Whole-register integer vector instructions. `x86_tier` is the x86 extension the
    /// instruction needs; NEON provides all of them.
    pub fn native_integer(&self, x86_tier: HostFeature) -> bool {
        let host = self.config.host;
        self.config.has_optimization(OptimizationFlag::NATIVE_INTEGER_VECTORS)
            && (host.contains(HostFeature::NEON) || (!x86_tier.is_empty() && host.contains(x86_tier)))
    }

    /// Host float vector instructions for `fsize`-bit lanes.
    pub fn native_fp(&self, fsize: usize) -> bool {
        if !self.config.fast_fp() {
            return false;
        }
        match fsize {
            32 => self.config.host.has_fp_vector(),
            64 => self.config.host.has_fp64_vector(),
            _ => false,
        }
    }

    pub fn native_fused_multiply_add(&self, fsize: usize) -> bool {
        self.native_fp(fsize) && self.config.host.contains(HostFeature::FMA)
    }

    /// Separately rounded multiply and add standing in for a missing host FMA.
    pub fn native_unfused_multiply_add(&self, fsize: usize) -> bool {
        self.native_fp(fsize)
            && !self.config.host.contains(HostFeature::FMA)
            && self.config.has_optimization(OptimizationFlag::UNSAFE_UNFUSE_FMA)
    }

    pub fn native_count_leading_zeros(&self) -> bool {
        self.config.has_optimization(OptimizationFlag::NATIVE_BIT_COUNT)
            && self.config.host.contains(HostFeature::LZCNT)
    }

    pub fn native_population_count(&self) -> bool {
        self.config.has_optimization(OptimizationFlag::NATIVE_BIT_COUNT)
            && self.config.host.contains(HostFeature::POPCNT)
    }
}
