use std::sync::OnceLock;

use bitflags::bitflags;

bitflags! {
    /// Host CPU capabilities that select native emission paths.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HostFeature: u64 {
        const SSE    = 1 << 0;
        const SSE2   = 1 << 1;
        const SSSE3  = 1 << 2;
        const SSE41  = 1 << 3;
        const SSE42  = 1 << 4;
        const AVX    = 1 << 5;
        const AVX2   = 1 << 6;
        const FMA    = 1 << 7;
        const LZCNT  = 1 << 8;
        const POPCNT = 1 << 9;
        const NEON   = 1 << 10;
    }
}

impl HostFeature {
    /// Detect the running CPU's capabilities.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        let features = Self::detect_x86_64();
        #[cfg(target_arch = "aarch64")]
        let features = Self::detect_aarch64();
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        let features = Self::empty();
        features
    }

    #[cfg(target_arch = "x86_64")]
    fn detect_x86_64() -> Self {
        let mut features = Self::empty();
        features.set(Self::SSE, is_x86_feature_detected!("sse"));
        features.set(Self::SSE2, is_x86_feature_detected!("sse2"));
        features.set(Self::SSSE3, is_x86_feature_detected!("ssse3"));
        features.set(Self::SSE41, is_x86_feature_detected!("sse4.1"));
        features.set(Self::SSE42, is_x86_feature_detected!("sse4.2"));
        features.set(Self::AVX, is_x86_feature_detected!("avx"));
        features.set(Self::AVX2, is_x86_feature_detected!("avx2"));
        features.set(Self::FMA, is_x86_feature_detected!("fma"));
        features.set(Self::LZCNT, is_x86_feature_detected!("lzcnt"));
        features.set(Self::POPCNT, is_x86_feature_detected!("popcnt"));
        features
    }

    #[cfg(target_arch = "aarch64")]
    fn detect_aarch64() -> Self {
        let mut features = Self::empty();
        features.set(Self::NEON, std::arch::is_aarch64_feature_detected!("neon"));
        // NEON carries fused multiply-add, CLZ and CNT
        if features.contains(Self::NEON) {
            features |= Self::FMA | Self::LZCNT | Self::POPCNT;
        }
        features
    }

    /// Any 128-bit float vector unit.
    pub fn has_fp_vector(self) -> bool {
        self.intersects(Self::SSE | Self::SSE2 | Self::NEON)
    }

    /// Double-precision float vectors.
    pub fn has_fp64_vector(self) -> bool {
        self.intersects(Self::SSE2 | Self::NEON)
    }
}

/// Capabilities of the running host, detected once.
pub fn host_features() -> HostFeature {
    static FEATURES: OnceLock<HostFeature> = OnceLock::new();
    *FEATURES.get_or_init(|| {
        let features = HostFeature::detect();
        log::debug!("detected host features: {:?}", features);
        features
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_is_stable() {
        assert_eq!(host_features(), host_features());
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_x86_64_baseline() {
        let features = host_features();
        assert!(features.contains(HostFeature::SSE | HostFeature::SSE2));
        assert!(!features.contains(HostFeature::NEON));
    }

    #[test]
    fn test_fp_vector_queries() {
        assert!(!HostFeature::empty().has_fp_vector());
        assert!(HostFeature::SSE.has_fp_vector());
        assert!(!HostFeature::SSE.has_fp64_vector());
        assert!(HostFeature::NEON.has_fp64_vector());
    }
}
