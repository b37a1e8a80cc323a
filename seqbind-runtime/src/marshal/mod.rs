//! Run-time codecs called by generated shims
//!
//! Design: every value crosses as a plain C-layout scalar, pointer+length
//! pair or handle. Ownership of heap buffers is explicit in the type used:
//!
//! - `scalar.rs` - bit-width copies and the one-byte boolean sentinel
//! - `strings.rs` - UTF-8 (`NString`) and UTF-16 (`NString16`) buffers
//! - `bytes.rs` - byte arrays, transient views and retained copies
//! - `value.rs` - tagged union for slots that accept several kinds

mod bytes;
mod scalar;
mod strings;
mod value;

pub use bytes::{ByteView, Mode, NByteSlice};
pub use scalar::{decode_bool, encode_bool};
pub use strings::{NString, NString16};
pub use value::{narrow, Expect, Value, ValueKind};
