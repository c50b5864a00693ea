use thiserror::Error;

use crate::host_features::{host_features, HostFeature};

/// Fine-grained emission flags.
///
/// Safe flags occupy the low 16 bits; unsafe ones occupy the high bits.
/// Use bitwise OR to combine flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OptimizationFlag(u32);

impl OptimizationFlag {
    // -- Safe optimizations ---------------------------------------------------

    /// Whole-register host vector instructions for integer lane arithmetic.
    pub const NATIVE_INTEGER_VECTORS: Self = Self(0x0000_0001);
    /// Host CLZ/POPCNT instructions for bit counting.
    pub const NATIVE_BIT_COUNT: Self = Self(0x0000_0002);
    /// Dead code elimination after emission.
    pub const DEAD_CODE_ELIMINATION: Self = Self(0x0000_0004);
    /// Verify every emitted block.
    pub const VERIFY_IR: Self = Self(0x0000_0008);

    // -- Unsafe optimizations -------------------------------------------------

    /// Host floating-point vector instructions; ignores FPCR and FPSR.
    pub const UNSAFE_FAST_FP: Self = Self(0x0001_0000);
    /// Separate multiply and add where the host lacks fused multiply-add.
    pub const UNSAFE_UNFUSE_FMA: Self = Self(0x0002_0000);

    // -- Convenience constants ------------------------------------------------

    /// No optimizations enabled.
    pub const NO_OPTIMIZATIONS: Self = Self(0);
    /// All safe optimizations enabled (low 16 bits).
    pub const ALL_SAFE_OPTIMIZATIONS: Self = Self(0x0000_FFFF);

    /// Returns true if `flag` is set within `self`.
    #[inline]
    pub fn contains(self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0 && flag.0 != 0
    }

    /// Raw bits.
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "native_integer_vectors" => Some(Self::NATIVE_INTEGER_VECTORS),
            "native_bit_count" => Some(Self::NATIVE_BIT_COUNT),
            "dead_code_elimination" => Some(Self::DEAD_CODE_ELIMINATION),
            "verify_ir" => Some(Self::VERIFY_IR),
            "fast_fp" => Some(Self::UNSAFE_FAST_FP),
            "unfuse_fma" => Some(Self::UNSAFE_UNFUSE_FMA),
            _ => None,
        }
    }

    fn is_unsafe(self) -> bool {
        self.0 & !Self::ALL_SAFE_OPTIMIZATIONS.0 != 0
    }
}

impl std::ops::BitOr for OptimizationFlag {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

impl std::ops::BitOrAssign for OptimizationFlag {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

impl std::ops::BitAnd for OptimizationFlag {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self { Self(self.0 & rhs.0) }
}

impl std::ops::Not for OptimizationFlag {
    type Output = Self;
    #[inline]
    fn not(self) -> Self { Self(!self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown emission option `{0}`")]
    UnknownOption(String),
    #[error("option `{0}` is unsafe and requires unsafe_optimizations")]
    UnsafeOptionLocked(String),
}

/// Emission-time switches. Path selection happens once, while emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitConfig {
    /// Capabilities native paths may assume.
    pub host: HostFeature,
    /// Which optimizations and native paths are enabled.
    pub optimizations: OptimizationFlag,
    /// Whether unsafe optimizations are permitted.
    pub unsafe_optimizations: bool,
    /// Fold per-lane saturation into FPSR.QC.
    pub track_saturation: bool,
}

impl Default for EmitConfig {
    /// Detected host, all safe optimizations, exact floating point.
    fn default() -> Self {
        Self {
            host: host_features(),
            optimizations: OptimizationFlag::ALL_SAFE_OPTIMIZATIONS,
            unsafe_optimizations: false,
            track_saturation: true,
        }
    }
}

impl EmitConfig {
    /// Software paths only; independent of the host.
    pub fn portable() -> Self {
        Self {
            host: HostFeature::empty(),
            optimizations: OptimizationFlag::DEAD_CODE_ELIMINATION | OptimizationFlag::VERIFY_IR,
            unsafe_optimizations: false,
            track_saturation: true,
        }
    }

    pub fn with_host(mut self, host: HostFeature) -> Self {
        self.host = host;
        self
    }

    /// Enable host floating point, which bypasses FPCR/FPSR semantics.
    pub fn with_fast_fp(mut self, enabled: bool) -> Self {
        self.unsafe_optimizations |= enabled;
        if enabled {
            self.optimizations |= OptimizationFlag::UNSAFE_FAST_FP;
        } else {
            self.optimizations = self.optimizations & !OptimizationFlag::UNSAFE_FAST_FP;
        }
        self
    }

    /// Check whether a specific optimization flag is active.
    ///
    /// Unsafe flags are masked out unless `unsafe_optimizations` is true.
    pub fn has_optimization(&self, flag: OptimizationFlag) -> bool {
        let mut f = flag;
        if !self.unsafe_optimizations {
            f = f & OptimizationFlag::ALL_SAFE_OPTIMIZATIONS;
        }
        (f & self.optimizations) != OptimizationFlag::NO_OPTIMIZATIONS
    }

    pub fn fast_fp(&self) -> bool {
        self.has_optimization(OptimizationFlag::UNSAFE_FAST_FP)
    }

    /// Set a named option, e.g. from a command line or settings file.
    pub fn set(&mut self, name: &str, value: bool) -> Result<(), ConfigError> {
        if name == "track_saturation" {
            self.track_saturation = value;
            return Ok(());
        }
        if name == "unsafe_optimizations" {
            self.unsafe_optimizations = value;
            return Ok(());
        }

        let flag = OptimizationFlag::from_name(name)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))?;
        if value && flag.is_unsafe() && !self.unsafe_optimizations {
            return Err(ConfigError::UnsafeOptionLocked(name.to_string()));
        }
        if value {
            self.optimizations |= flag;
        } else {
            self.optimizations = self.optimizations & !flag;
        }
        log::debug!("emit option {} = {}", name, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_flags_are_masked() {
        let config = EmitConfig {
            host: HostFeature::empty(),
            optimizations: OptimizationFlag::UNSAFE_FAST_FP,
            unsafe_optimizations: false,
            track_saturation: true,
        };
        assert!(!config.fast_fp());
        let config = EmitConfig { unsafe_optimizations: true, ..config };
        assert!(config.fast_fp());
    }

    #[test]
    fn test_set_named_options() {
        let mut config = EmitConfig::portable();
        config.set("native_bit_count", true).unwrap();
        assert!(config.has_optimization(OptimizationFlag::NATIVE_BIT_COUNT));

        assert_eq!(
            config.set("fast_fp", true),
            Err(ConfigError::UnsafeOptionLocked("fast_fp".to_string()))
        );
        config.set("unsafe_optimizations", true).unwrap();
        config.set("fast_fp", true).unwrap();
        assert!(config.fast_fp());

        config.set("track_saturation", false).unwrap();
        assert!(!config.track_saturation);

        assert!(matches!(config.set("bogus", true), Err(ConfigError::UnknownOption(_))));
    }

    #[test]
    fn test_with_fast_fp() {
        let config = EmitConfig::portable().with_fast_fp(true);
        assert!(config.fast_fp());
        assert!(!config.with_fast_fp(false).fast_fp());
    }
}
