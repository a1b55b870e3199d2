//! 16.16 fixed-point numbers for sizes and face metrics

use std::fmt;

/// A signed 16.16 fixed-point value
///
/// Face sizes are stored in fixed point so that keys compare and hash
/// exactly, while still distinguishing fractional sizes like 10.5px.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i32);

impl Fixed {
    pub const FRACTION_BITS: u32 = 16;
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(1 << Self::FRACTION_BITS);
    pub const MAX: Fixed = Fixed(i32::MAX);

    /// Wraps raw 16.16 bits
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Saturates when the integer part does not fit in 16 bits
    pub const fn from_int(value: i32) -> Self {
        Self(value.saturating_mul(1 << Self::FRACTION_BITS))
    }

    /// Rounds to the nearest representable value, saturating on overflow
    pub fn from_f32(value: f32) -> Self {
        let scaled = (value as f64 * (1u32 << Self::FRACTION_BITS) as f64).round();
        if scaled.is_nan() {
            Self::ZERO
        } else {
            // `as` saturates for out-of-range floats
            Self(scaled as i32)
        }
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / (1u32 << Self::FRACTION_BITS) as f32
    }

    pub const fn floor(self) -> i32 {
        self.0 >> Self::FRACTION_BITS
    }

    pub const fn ceil(self) -> i32 {
        let mask = (1 << Self::FRACTION_BITS) - 1;
        (self.0 >> Self::FRACTION_BITS) + ((self.0 & mask != 0) as i32)
    }

    pub const fn round(self) -> i32 {
        self.0.saturating_add(1 << (Self::FRACTION_BITS - 1)) >> Self::FRACTION_BITS
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn saturating_add(self, other: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(other.0))
    }

    pub const fn saturating_sub(self, other: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(other.0))
    }
}

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}
