//! Handle representation shared with the wire contract.

/// Signed reference number crossing the boundary as a 4-byte integer.
///
/// Negative handles name managed-owned objects, positive handles name
/// foreign-owned objects. The sign is the only ownership discriminator.
pub type Handle = i32;

/// The null handle. Never registered.
pub const NULL_HANDLE: Handle = 0;

/// Which side of the boundary owns the object behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Object lives in the managed runtime; handle is negative
    Managed,
    /// Object lives in a foreign runtime; handle is positive
    Foreign,
}

impl Direction {
    /// Ownership direction encoded in a handle's sign, `None` for null
    #[inline]
    pub const fn of(handle: Handle) -> Option<Self> {
        if handle < 0 {
            Some(Self::Managed)
        } else if handle > 0 {
            Some(Self::Foreign)
        } else {
            None
        }
    }

    #[inline]
    pub const fn is_managed(handle: Handle) -> bool {
        handle < 0
    }

    #[inline]
    pub const fn is_foreign(handle: Handle) -> bool {
        handle > 0
    }
}
