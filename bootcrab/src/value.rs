//! Opaque runtime values stored in frame slots and passed as arguments.

use smallvec::SmallVec;
use std::fmt;
use zerocopy::{FromBytes, Immutable, IntoBytes};

/// Runtime value with binary representation and size information.
///
/// Uses SmallVec to avoid heap allocations for values ≤16 bytes,
/// which covers stack pointers and every primitive type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Value {
    /// Raw little-endian bytes
    data: SmallVec<[u8; 16]>,
}

impl Value {
    /// Create a value holding a copy of the given bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: SmallVec::from_slice(bytes),
        }
    }

    /// Create a value from any plain-old-data type.
    pub fn from_type<T: IntoBytes + Immutable>(value: T) -> Self {
        Self::from_bytes(value.as_bytes())
    }

    /// The void value. Roots evaluated for effect return this.
    pub fn unit() -> &'static Self {
        static UNIT: Value = Value {
            data: SmallVec::new_const(),
        };
        &UNIT
    }

    /// Try to interpret the value as `T`.
    ///
    /// Returns `None` if the size of `T` doesn't match the value size.
    pub fn as_type<T: FromBytes>(&self) -> Option<T> {
        T::read_from_bytes(&self.data).ok()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_unit(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({self})")
    }
}

impl fmt::Display for Value {
    /// Values up to 8 bytes are shown as a hex integer, anything else as a byte list.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.len() {
            0 => write!(f, "()"),
            1..=8 => {
                let mut bytes = [0u8; 8];
                bytes[..self.data.len()].copy_from_slice(&self.data);
                write!(f, "0x{:x}", u64::from_le_bytes(bytes))
            }
            _ => write!(f, "{:?}", self.data.as_slice()),
        }
    }
}
