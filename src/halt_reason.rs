use bitflags::bitflags;

bitflags! {
    /// Reasons a block run handed control back to the caller.
    ///
    /// Multiple reasons can be active simultaneously (OR'd together).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HaltReason: u32 {
        /// Supervisor call (SVC) was executed.
        const SVC                = 1 << 1;
        /// Breakpoint hit.
        const BREAKPOINT         = 1 << 2;
        /// Undefined instruction reported.
        const UNDEFINED          = 1 << 3;
        /// Pending interrupt delivered at a sync point.
        const INTERRUPT          = 1 << 4;
        /// External halt requested (the running flag was cleared).
        const EXTERNAL_HALT      = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halt_reason_bitflags() {
        let reason = HaltReason::SVC | HaltReason::INTERRUPT;
        assert!(reason.contains(HaltReason::SVC));
        assert!(reason.contains(HaltReason::INTERRUPT));
        assert!(!reason.contains(HaltReason::BREAKPOINT));
    }

    #[test]
    fn test_halt_reason_empty() {
        let reason = HaltReason::default();
        assert!(reason.is_empty());
        assert_eq!(reason.bits(), 0);
    }
}
