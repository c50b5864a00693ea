use std::fmt;

/// A64 vector register (V0-V31).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Vec {
    V0 = 0, V1, V2, V3, V4, V5, V6, V7,
    V8, V9, V10, V11, V12, V13, V14, V15,
    V16, V17, V18, V19, V20, V21, V22, V23,
    V24, V25, V26, V27, V28, V29, V30, V31,
}

impl Vec {
    pub fn number(self) -> usize {
        self as usize
    }

    pub fn from_u8(val: u8) -> Self {
        assert!(val <= 31, "Invalid vector register number: {}", val);
        // SAFETY: val is in 0..=31, matching the repr(u8) layout
        unsafe { std::mem::transmute(val) }
    }

    pub fn from_u32(val: u32) -> Self {
        Self::from_u8(val as u8)
    }
}

impl fmt::Display for Vec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.number())
    }
}

/// Architectural width of a vector operation: the lower 64 bits or the full 128-bit register.
///
/// For widening and narrowing forms `Simd128` selects the "2" variant, which reads the upper
/// half of the source or writes the upper half of the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterSize {
    Simd64,
    Simd128,
}

impl RegisterSize {
    pub fn bits(self) -> usize {
        match self {
            RegisterSize::Simd64 => 64,
            RegisterSize::Simd128 => 128,
        }
    }

    pub fn is_full(self) -> bool {
        self == RegisterSize::Simd128
    }
}

macro_rules! inst_names {
    ($($name:ident),* $(,)?) => {
        /// Every guest instruction form the emission layer handles.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        pub enum InstName {
            $($name,)*
        }

        impl InstName {
            pub const ALL: &'static [InstName] = &[$(InstName::$name,)*];
            pub const COUNT: usize = InstName::ALL.len();

            pub fn index(self) -> usize {
                self as usize
            }
        }
    };
}

inst_names! {
    // Integer arithmetic
    ABS_S, ABS_V, ADD_S, ADD_V, ADDHN, ADDP_S, ADDP_V, ADDV,
    MLA_V, MLA_Ve, MLS_V, MLS_Ve, MUL_V, MUL_Ve, NEG_S, NEG_V,
    RADDHN, RSUBHN, SUB_S, SUB_V, SUBHN,
    SABA, SABAL, SABD, SABDL, SADALP, SADDL, SADDLP, SADDLV, SADDW,
    SHADD, SHSUB, SMAX, SMAXP, SMAXV, SMIN, SMINP, SMINV,
    SMLAL, SMLSL, SMULL, SRHADD, SSUBL, SSUBW,
    UABA, UABAL, UABD, UABDL, UADALP, UADDL, UADDLP, UADDLV, UADDW,
    UHADD, UHSUB, UMAX, UMAXP, UMAXV, UMIN, UMINP, UMINV,
    UMLAL, UMLSL, UMULL, URHADD, USUBL, USUBW,

    // Saturating
    SQABS_S, SQABS_V, SQADD_S, SQADD_V, SQDMULH_S, SQDMULH_V, SQNEG_S, SQNEG_V,
    SQRDMULH_S, SQRDMULH_V, SQSUB_S, SQSUB_V, SQXTN_S, SQXTN_V, SQXTUN_S, SQXTUN_V,
    SUQADD_S, SUQADD_V, UQADD_S, UQADD_V, UQSUB_S, UQSUB_V, UQXTN_S, UQXTN_V,
    USQADD_S, USQADD_V,

    // Bit counting
    CLS, CLZ, CNT,

    // Floating point
    FABD_S, FABS_S, FABS_V, FADD_S, FADD_V, FADDP_S, FADDP_V, FDIV_S, FDIV_V,
    FMADD_S, FMAX_S, FMAX_V, FMAXNM_S, FMAXNM_V, FMAXNMV, FMAXP_V, FMAXV,
    FMIN_S, FMIN_V, FMINNM_S, FMINNM_V, FMINNMV, FMINP_V, FMINV,
    FMLA_Se, FMLA_V, FMLA_Ve, FMLS_Se, FMLS_V, FMLS_Ve, FMSUB_S,
    FMUL_S, FMUL_Se, FMUL_V, FMUL_Ve, FMULX_S, FMULX_Se, FMULX_V, FMULX_Ve,
    FNEG_S, FNEG_V, FNMADD_S, FNMSUB_S, FNMUL_S,
    FRECPE_S, FRECPE_V, FRECPS_S, FRECPS_V, FRECPX_S,
    FRINTA_S, FRINTA_V, FRINTI_S, FRINTI_V, FRINTM_S, FRINTM_V, FRINTN_S, FRINTN_V,
    FRINTP_S, FRINTP_V, FRINTX_S, FRINTX_V, FRINTZ_S, FRINTZ_V,
    FRSQRTE_S, FRSQRTE_V, FRSQRTS_S, FRSQRTS_V, FSQRT_S, FSQRT_V, FSUB_S, FSUB_V,

    // Exception generating
    BRK, SVC, UDF,
}

impl fmt::Display for InstName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_from_u32() {
        assert_eq!(Vec::from_u32(17), Vec::V17);
        assert_eq!(Vec::V31.to_string(), "V31");
    }

    #[test]
    #[should_panic(expected = "Invalid vector register number")]
    fn test_vec_out_of_range() {
        Vec::from_u8(32);
    }

    #[test]
    fn test_inst_name_indices_are_dense() {
        for (i, name) in InstName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
        assert_eq!(InstName::COUNT, InstName::ALL.len());
    }
}
