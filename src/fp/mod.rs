//! ARM floating-point control/status registers and the exact software FP routines.

pub mod info;
pub mod op;

use bitflags::bitflags;

pub use info::FPInfo;

/// ARM floating-point rounding modes. Values 0-3 match FPCR.RMode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(non_camel_case_types)]
pub enum RoundingMode {
    ToNearest_TieEven = 0,
    TowardsPlusInfinity = 1,
    TowardsMinusInfinity = 2,
    TowardsZero = 3,
    ToNearest_TieAwayFromZero = 4,
}

impl RoundingMode {
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => RoundingMode::ToNearest_TieEven,
            1 => RoundingMode::TowardsPlusInfinity,
            2 => RoundingMode::TowardsMinusInfinity,
            3 => RoundingMode::TowardsZero,
            4 => RoundingMode::ToNearest_TieAwayFromZero,
            _ => panic!("Invalid rounding mode {}", val),
        }
    }
}

bitflags! {
    /// Cumulative FPSR status bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FPExc: u32 {
        /// Invalid operation
        const IOC = 1 << 0;
        /// Division by zero
        const DZC = 1 << 1;
        /// Overflow
        const OFC = 1 << 2;
        /// Underflow
        const UFC = 1 << 3;
        /// Inexact
        const IXC = 1 << 4;
        /// Input denormal
        const IDC = 1 << 7;
        /// Cumulative saturation
        const QC = 1 << 27;
    }
}

/// Floating-Point Control Register.
///
/// Layout:
///   [26] AHP - Alternate half-precision
///   [25] DN  - Default NaN
///   [24] FZ  - Flush to zero
///   [23:22] RMode - Rounding mode
///   [19] FZ16 - Flush to zero, half precision
///   [15] IDE, [12] IXE, [11] UFE, [10] OFE, [9] DZE, [8] IOE - trap enables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FPCR(pub u32);

impl FPCR {
    /// Bits that are writable on this implementation.
    pub const MASK: u32 = 0x07C8_9F00;
    pub const RMODE_SHIFT: u32 = 22;

    pub fn new(value: u32) -> Self {
        Self(value & Self::MASK)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn ahp(self) -> bool { self.0 & (1 << 26) != 0 }
    pub fn dn(self) -> bool { self.0 & (1 << 25) != 0 }
    pub fn fz(self) -> bool { self.0 & (1 << 24) != 0 }

    pub fn rmode(self) -> RoundingMode {
        RoundingMode::from_u8(((self.0 >> Self::RMODE_SHIFT) & 0x3) as u8)
    }

    pub fn ide(self) -> bool { self.0 & (1 << 15) != 0 }
    pub fn ixe(self) -> bool { self.0 & (1 << 12) != 0 }
    pub fn ufe(self) -> bool { self.0 & (1 << 11) != 0 }
    pub fn ofe(self) -> bool { self.0 & (1 << 10) != 0 }
    pub fn dze(self) -> bool { self.0 & (1 << 9) != 0 }
    pub fn ioe(self) -> bool { self.0 & (1 << 8) != 0 }

    pub fn with_rmode(self, mode: RoundingMode) -> Self {
        assert!((mode as u8) < 4, "{:?} is not an FPCR rounding mode", mode);
        Self((self.0 & !(0x3 << Self::RMODE_SHIFT)) | ((mode as u32) << Self::RMODE_SHIFT))
    }

    pub fn with_fz(self, fz: bool) -> Self {
        Self(if fz { self.0 | (1 << 24) } else { self.0 & !(1 << 24) })
    }

    pub fn with_dn(self, dn: bool) -> Self {
        Self(if dn { self.0 | (1 << 25) } else { self.0 & !(1 << 25) })
    }
}

/// Floating-Point Status Register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FPSR(pub u32);

impl FPSR {
    pub const MASK: u32 = 0x0800_009F;

    pub fn new(value: u32) -> Self {
        Self(value & Self::MASK)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn exceptions(self) -> FPExc {
        FPExc::from_bits_truncate(self.0)
    }

    /// Accumulate sticky bits.
    pub fn set(&mut self, exc: FPExc) {
        self.0 |= exc.bits();
    }

    pub fn contains(self, exc: FPExc) -> bool {
        self.exceptions().contains(exc)
    }

    pub fn qc(self) -> bool { self.contains(FPExc::QC) }
    pub fn ioc(self) -> bool { self.contains(FPExc::IOC) }
    pub fn dzc(self) -> bool { self.contains(FPExc::DZC) }
    pub fn ofc(self) -> bool { self.contains(FPExc::OFC) }
    pub fn ufc(self) -> bool { self.contains(FPExc::UFC) }
    pub fn ixc(self) -> bool { self.contains(FPExc::IXC) }
    pub fn idc(self) -> bool { self.contains(FPExc::IDC) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fpcr_fields() {
        let fpcr = FPCR::new((1 << 25) | (1 << 24) | (2 << 22));
        assert!(fpcr.dn());
        assert!(fpcr.fz());
        assert!(!fpcr.ahp());
        assert_eq!(fpcr.rmode(), RoundingMode::TowardsMinusInfinity);
    }

    #[test]
    fn test_fpcr_masks_unwritable_bits() {
        assert_eq!(FPCR::new(0xFFFF_FFFF).value(), FPCR::MASK);
        let fpcr = FPCR::default().with_rmode(RoundingMode::TowardsZero);
        assert_eq!(fpcr.rmode(), RoundingMode::TowardsZero);
        assert_eq!(fpcr.with_rmode(RoundingMode::ToNearest_TieEven).value(), 0);
    }

    #[test]
    fn test_fpsr_sticky() {
        let mut fpsr = FPSR::default();
        fpsr.set(FPExc::IXC);
        fpsr.set(FPExc::UFC);
        assert!(fpsr.ixc() && fpsr.ufc());
        assert!(!fpsr.ioc());
        fpsr.set(FPExc::QC);
        assert_eq!(fpsr.value(), (1 << 27) | (1 << 4) | (1 << 3));
    }
}
