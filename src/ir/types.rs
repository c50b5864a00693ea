use std::fmt;

/// IR type system. Types are bit flags to allow compatibility checks via bitwise OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Type {
    Void = 0,
    A64Vec = 1 << 0,
    Opaque = 1 << 1,
    U1 = 1 << 2,
    U8 = 1 << 3,
    U16 = 1 << 4,
    U32 = 1 << 5,
    U64 = 1 << 6,
    U128 = 1 << 7,
}

impl Type {
    /// Returns the raw bit value of this type.
    pub fn bits(self) -> u16 {
        self as u16
    }

    /// Width in bits of an integer-like type, `None` for non-data types.
    pub fn bit_width(self) -> Option<usize> {
        match self {
            Type::U1 => Some(1),
            Type::U8 => Some(8),
            Type::U16 => Some(16),
            Type::U32 => Some(32),
            Type::U64 => Some(64),
            Type::U128 => Some(128),
            _ => None,
        }
    }

    /// Check if two types are compatible.
    /// Opaque is compatible with any non-Void type.
    pub fn is_compatible_with(self, other: Type) -> bool {
        if self == other {
            return true;
        }
        if self == Type::Opaque && other != Type::Void {
            return true;
        }
        if other == Type::Opaque && self != Type::Void {
            return true;
        }
        false
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "Void"),
            Type::A64Vec => write!(f, "A64Vec"),
            Type::Opaque => write!(f, "Opaque"),
            Type::U1 => write!(f, "U1"),
            Type::U8 => write!(f, "U8"),
            Type::U16 => write!(f, "U16"),
            Type::U32 => write!(f, "U32"),
            Type::U64 => write!(f, "U64"),
            Type::U128 => write!(f, "U128"),
        }
    }
}
