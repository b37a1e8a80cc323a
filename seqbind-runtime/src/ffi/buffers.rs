//! Buffer allocation - C API shared with the codecs
//!
//! Buffers passed to managed code with ownership must come from these
//! functions so that decoding can free them with the same allocator.

use crate::marshal::{NByteSlice, NString, NString16};

fn zeroed<T: Copy + Default>(len: usize) -> (*mut T, usize) {
    if len == 0 {
        return (std::ptr::null_mut(), 0);
    }
    let buf: Box<[T]> = vec![T::default(); len].into_boxed_slice();
    (Box::into_raw(buf) as *mut T, len)
}

/// Allocate a zeroed byte buffer of `len` bytes
#[no_mangle]
pub extern "C" fn seqbind_alloc_bytes(len: usize) -> NByteSlice {
    let (ptr, len) = zeroed::<u8>(len);
    NByteSlice { ptr, len }
}

/// Free a byte buffer that was not handed to managed code
///
/// # Safety
/// `buf` must come from [`seqbind_alloc_bytes`] or a retained encode.
#[no_mangle]
pub unsafe extern "C" fn seqbind_free_bytes(buf: NByteSlice) {
    drop(buf.into_vec());
}

/// Allocate a UTF-8 buffer of `len` bytes
#[no_mangle]
pub extern "C" fn seqbind_alloc_string(len: usize) -> NString {
    let (ptr, len) = zeroed::<u8>(len);
    NString { ptr, len }
}

/// # Safety
/// `s` must come from [`seqbind_alloc_string`] or `NString::encode`.
#[no_mangle]
pub unsafe extern "C" fn seqbind_free_string(s: NString) {
    s.free();
}

/// Allocate a UTF-16 buffer of `len` code units
#[no_mangle]
pub extern "C" fn seqbind_alloc_string16(len: usize) -> NString16 {
    let (ptr, len) = zeroed::<u16>(len);
    NString16 { ptr, len }
}

/// # Safety
/// `s` must come from [`seqbind_alloc_string16`] or `NString16::encode`.
#[no_mangle]
pub unsafe extern "C" fn seqbind_free_string16(s: NString16) {
    s.free();
}
