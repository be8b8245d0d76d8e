//! The scalar value family carried across the DUT boundary.
//!
//! Boundary signals are scalars: `bool` or an unsigned integer of some width.
//! [`Scalar`] binds each concrete Rust type to a [`ScalarKind`] discriminant
//! and to a `u64` raw representation, so the kernel can store all port values
//! uniformly while the registration API stays fully typed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant for the supported port value widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Single-bit boolean.
    Bool,
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit unsigned integer.
    U64,
}

impl ScalarKind {
    /// Returns the width of this kind in bits.
    pub const fn width_bits(self) -> u32 {
        match self {
            ScalarKind::Bool => 1,
            ScalarKind::U8 => 8,
            ScalarKind::U16 => 16,
            ScalarKind::U32 => 32,
            ScalarKind::U64 => 64,
        }
    }

    /// Returns the bit mask covering values of this kind.
    pub const fn mask(self) -> u64 {
        match self {
            ScalarKind::Bool => 1,
            ScalarKind::U8 => u8::MAX as u64,
            ScalarKind::U16 => u16::MAX as u64,
            ScalarKind::U32 => u32::MAX as u64,
            ScalarKind::U64 => u64::MAX,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Bool => write!(f, "bool"),
            ScalarKind::U8 => write!(f, "u8"),
            ScalarKind::U16 => write!(f, "u16"),
            ScalarKind::U32 => write!(f, "u32"),
            ScalarKind::U64 => write!(f, "u64"),
        }
    }
}

/// A concrete type usable as a port or signal value.
///
/// The raw representation is a zero-extended `u64`; `from_raw` truncates to
/// the kind's width, so round-tripping through raw form is lossless for
/// in-range values. Edge detection treats any nonzero raw value as true.
pub trait Scalar: Copy + PartialEq + fmt::Debug + 'static {
    /// The width discriminant for this type.
    const KIND: ScalarKind;

    /// Zero-extends the value into the raw representation.
    fn to_raw(self) -> u64;

    /// Truncates a raw value back to this type.
    fn from_raw(raw: u64) -> Self;
}

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn to_raw(self) -> u64 {
        self as u64
    }

    fn from_raw(raw: u64) -> Self {
        raw & 1 != 0
    }
}

impl Scalar for u8 {
    const KIND: ScalarKind = ScalarKind::U8;

    fn to_raw(self) -> u64 {
        self as u64
    }

    fn from_raw(raw: u64) -> Self {
        raw as u8
    }
}

impl Scalar for u16 {
    const KIND: ScalarKind = ScalarKind::U16;

    fn to_raw(self) -> u64 {
        self as u64
    }

    fn from_raw(raw: u64) -> Self {
        raw as u16
    }
}

impl Scalar for u32 {
    const KIND: ScalarKind = ScalarKind::U32;

    fn to_raw(self) -> u64 {
        self as u64
    }

    fn from_raw(raw: u64) -> Self {
        raw as u32
    }
}

impl Scalar for u64 {
    const KIND: ScalarKind = ScalarKind::U64;

    fn to_raw(self) -> u64 {
        self
    }

    fn from_raw(raw: u64) -> Self {
        raw
    }
}
