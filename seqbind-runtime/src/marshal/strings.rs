//! String buffers
//!
//! Strings always cross by copy. The sender allocates a buffer with
//! [`NString::encode`] or [`NString16::encode`] and the receiver frees it by
//! decoding. Foreign code allocates through `seqbind_alloc_string` and
//! `seqbind_alloc_string16` so both sides share one allocator.
//!
//! Empty strings are encoded as a null pointer with zero length.

use std::ptr;

/// UTF-8 buffer, used by the message-passing runtime
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NString {
    pub ptr: *mut u8,
    pub len: usize,
}

/// UTF-16 buffer (length in code units), used by the VM runtime
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NString16 {
    pub ptr: *mut u16,
    pub len: usize,
}

impl Default for NString {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Default for NString16 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl NString {
    pub const EMPTY: Self = Self {
        ptr: ptr::null_mut(),
        len: 0,
    };

    /// Allocate a UTF-8 copy of `value`
    pub fn encode(value: &str) -> Self {
        let bytes: Box<[u8]> = value.as_bytes().into();
        let (ptr, len) = into_raw(bytes);
        Self { ptr, len }
    }

    /// Decode and free the buffer. Invalid UTF-8 is replaced, never rejected.
    ///
    /// # Safety
    /// The buffer must come from [`NString::encode`] or the matching C
    /// allocator and must not be used again.
    pub unsafe fn decode(self) -> String {
        match from_raw(self.ptr, self.len) {
            Some(buf) => match String::from_utf8(buf.into_vec()) {
                Ok(s) => s,
                Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
            },
            None => String::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.len == 0
    }

    /// Free the buffer without decoding it
    ///
    /// # Safety
    /// Same contract as [`NString::decode`].
    pub unsafe fn free(self) {
        drop(from_raw(self.ptr, self.len));
    }
}

impl NString16 {
    pub const EMPTY: Self = Self {
        ptr: ptr::null_mut(),
        len: 0,
    };

    /// Allocate a UTF-16 copy of `value`
    pub fn encode(value: &str) -> Self {
        let units: Box<[u16]> = value.encode_utf16().collect();
        let (ptr, len) = into_raw(units);
        Self { ptr, len }
    }

    /// Decode and free the buffer. Unpaired surrogates become U+FFFD.
    ///
    /// # Safety
    /// The buffer must come from [`NString16::encode`] or the matching C
    /// allocator and must not be used again.
    pub unsafe fn decode(self) -> String {
        match from_raw(self.ptr, self.len) {
            Some(units) => String::from_utf16_lossy(&units),
            None => String::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.len == 0
    }

    /// Free the buffer without decoding it
    ///
    /// # Safety
    /// Same contract as [`NString16::decode`].
    pub unsafe fn free(self) {
        drop(from_raw(self.ptr, self.len));
    }
}

pub(super) fn into_raw<T>(buf: Box<[T]>) -> (*mut T, usize) {
    if buf.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let len = buf.len();
    (Box::into_raw(buf) as *mut T, len)
}

/// Reclaim a buffer produced by [`into_raw`]
///
/// # Safety
/// `ptr`/`len` must describe a live allocation from [`into_raw`].
pub(super) unsafe fn from_raw<T>(ptr: *mut T, len: usize) -> Option<Box<[T]>> {
    if ptr.is_null() || len == 0 {
        return None;
    }
    Some(Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)))
}
