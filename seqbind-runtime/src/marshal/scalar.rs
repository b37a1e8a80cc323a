//! Scalar conversions
//!
//! Integers and floats cross with matching bit widths and need no code.
//! Booleans cross as a single byte because neither foreign ABI guarantees
//! the layout of a native `bool`.

/// Boolean to its wire sentinel
#[inline]
pub const fn encode_bool(value: bool) -> u8 {
    if value {
        1
    } else {
        0
    }
}

/// Any non-zero byte is true
#[inline]
pub const fn decode_bool(raw: u8) -> bool {
    raw != 0
}
