use crate::frontend::a64::types::{InstName, RegisterSize, Vec};

/// Decoded operation handed to the emission layer.
///
/// `size` is log2 of the element size in bytes for integer forms. Floating-point forms use
/// bit 0 of `size` as the precision selector (0 = single, 1 = double).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpDescriptor {
    pub name: InstName,
    /// Guest program counter of the instruction.
    pub position: u64,
    /// Raw encoding, reported verbatim for undefined instructions.
    pub raw: u32,
    pub rd: Vec,
    pub rn: Vec,
    pub rm: Vec,
    pub ra: Vec,
    pub size: u32,
    pub register_size: RegisterSize,
    /// Lane index of the broadcast operand for by-element forms.
    pub index: u32,
    /// Immediate payload (BRK/SVC).
    pub immediate: u32,
}

impl OpDescriptor {
    pub fn new(name: InstName) -> Self {
        Self {
            name,
            position: 0,
            raw: 0,
            rd: Vec::V0,
            rn: Vec::V0,
            rm: Vec::V0,
            ra: Vec::V0,
            size: 0,
            register_size: RegisterSize::Simd128,
            index: 0,
            immediate: 0,
        }
    }

    pub fn at(mut self, position: u64) -> Self {
        self.position = position;
        self
    }

    pub fn with_raw(mut self, raw: u32) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_regs(mut self, rd: Vec, rn: Vec, rm: Vec) -> Self {
        self.rd = rd;
        self.rn = rn;
        self.rm = rm;
        self
    }

    pub fn with_ra(mut self, ra: Vec) -> Self {
        self.ra = ra;
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_register_size(mut self, register_size: RegisterSize) -> Self {
        self.register_size = register_size;
        self
    }

    /// Shorthand for the 64-bit vector form.
    pub fn half(self) -> Self {
        self.with_register_size(RegisterSize::Simd64)
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn with_immediate(mut self, immediate: u32) -> Self {
        self.immediate = immediate;
        self
    }

    /// Element size in bits for integer forms.
    pub fn esize(&self) -> usize {
        8 << self.size
    }

    /// Number of lanes in the register width in use.
    pub fn lanes(&self) -> usize {
        self.register_size.bits() >> (self.size + 3)
    }

    /// Element size in bits for floating-point forms.
    pub fn fp_esize(&self) -> usize {
        32 << (self.size & 1)
    }

    /// Number of floating-point lanes in the register width in use.
    pub fn fp_lanes(&self) -> usize {
        self.register_size.bits() / self.fp_esize()
    }

    pub fn is_half(&self) -> bool {
        self.register_size == RegisterSize::Simd64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_counts() {
        let op = OpDescriptor::new(InstName::ADD_V).with_size(1);
        assert_eq!(op.esize(), 16);
        assert_eq!(op.lanes(), 8);
        assert_eq!(op.half().lanes(), 4);
        assert_eq!(op.esize() * op.lanes(), 128);
    }

    #[test]
    fn test_fp_lane_counts() {
        let op = OpDescriptor::new(InstName::FADD_V).with_size(1);
        assert_eq!(op.fp_esize(), 64);
        assert_eq!(op.fp_lanes(), 2);
        assert_eq!(op.with_size(0).half().fp_lanes(), 2);
    }
}
