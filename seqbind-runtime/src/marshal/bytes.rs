//! Byte array buffers
//!
//! Byte arrays cross as pointer+length in one of two ownership modes,
//! chosen by the generator from the call direction and slot role:
//!
//! - `Transient`: the receiver sees the sender's memory for the duration of
//!   the call. No allocation; a [`ByteView`] borrows the source slice so the
//!   view cannot outlive it.
//! - `Retained`: the receiver gets an independently owned copy and frees it
//!   when decoding.

use super::strings::{from_raw, into_raw};
use std::marker::PhantomData;
use std::ptr;
use std::slice;

/// Ownership mode of a byte-array crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Shared view, valid for the call
    Transient,
    /// Owned copy, freed by the receiver
    Retained,
}

impl Mode {
    #[inline]
    pub const fn allocates(self) -> bool {
        matches!(self, Self::Retained)
    }
}

/// Raw byte-array wire value
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NByteSlice {
    pub ptr: *mut u8,
    pub len: usize,
}

/// Transient view over a borrowed slice
#[derive(Debug)]
pub struct ByteView<'a> {
    raw: NByteSlice,
    _source: PhantomData<&'a [u8]>,
}

impl<'a> ByteView<'a> {
    /// Wire value for the call; valid while the view lives
    #[inline]
    pub fn raw(&self) -> NByteSlice {
        self.raw
    }
}

impl Default for NByteSlice {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl NByteSlice {
    pub const EMPTY: Self = Self {
        ptr: ptr::null_mut(),
        len: 0,
    };

    /// Transient view of `bytes`, no allocation
    pub fn view(bytes: &[u8]) -> ByteView<'_> {
        let raw = if bytes.is_empty() {
            Self::EMPTY
        } else {
            Self {
                ptr: bytes.as_ptr() as *mut u8,
                len: bytes.len(),
            }
        };
        ByteView {
            raw,
            _source: PhantomData,
        }
    }

    /// Retained copy of `bytes`; the receiver owns and frees it
    pub fn copy_of(bytes: &[u8]) -> Self {
        let owned: Box<[u8]> = bytes.into();
        let (ptr, len) = into_raw(owned);
        Self { ptr, len }
    }

    /// Take ownership of a retained buffer
    ///
    /// # Safety
    /// The buffer must come from [`NByteSlice::copy_of`] or
    /// `seqbind_alloc_bytes` and must not be used again.
    pub unsafe fn into_vec(self) -> Vec<u8> {
        from_raw(self.ptr, self.len).map_or_else(Vec::new, |buf| buf.into_vec())
    }

    /// Copy out of a transient view without taking ownership
    ///
    /// # Safety
    /// `ptr` must be valid for `len` bytes for the duration of this call.
    pub unsafe fn copy_to_vec(&self) -> Vec<u8> {
        if self.ptr.is_null() || self.len == 0 {
            return Vec::new();
        }
        slice::from_raw_parts(self.ptr, self.len).to_vec()
    }

    /// Decode according to `mode`: retained buffers are adopted, transient
    /// views are copied.
    ///
    /// # Safety
    /// See [`NByteSlice::into_vec`] and [`NByteSlice::copy_to_vec`].
    pub unsafe fn decode(self, mode: Mode) -> Vec<u8> {
        match mode {
            Mode::Retained => self.into_vec(),
            Mode::Transient => self.copy_to_vec(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.len == 0
    }
}
