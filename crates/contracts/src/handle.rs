//! Sub-HAL handle namespacing
//!
//! A sensor handle is 32 bits wide. The low 24 bits are owned by the sub-HAL
//! that registered the sensor; the bits above hold the index of that sub-HAL
//! inside the proxy. Every consumer that decodes handles (registry,
//! client-facing layer) must agree on [`BITS_AFTER_SUB_HAL_INDEX`], otherwise
//! events get routed to the wrong sub-HAL.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ContractError;

/// Bit offset at which the sub-HAL index starts.
pub const BITS_AFTER_SUB_HAL_INDEX: u32 = 24;

/// Mask covering the sub-HAL's own handle space.
pub const LOCAL_HANDLE_MASK: i32 = (1 << BITS_AFTER_SUB_HAL_INDEX) - 1;

/// Largest index that keeps an encoded handle a non-negative `i32`.
pub const MAX_SUB_HAL_INDEX: u8 = 0x7F;

/// Index of a sub-HAL inside the proxy.
///
/// Fixed when the sub-HAL is registered and never changes afterwards.
///
/// # Examples
/// ```
/// use contracts::SubHalIndex;
///
/// let index = SubHalIndex::new(3).unwrap();
/// assert_eq!(index.encode(0x10), 0x0300_0010);
/// assert!(SubHalIndex::new(128).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SubHalIndex(u8);

impl SubHalIndex {
    /// Create an index, rejecting values that do not fit in the high bits.
    pub fn new(index: usize) -> Result<Self, ContractError> {
        if index > MAX_SUB_HAL_INDEX as usize {
            return Err(ContractError::SubHalIndexOutOfRange {
                index,
                max: MAX_SUB_HAL_INDEX,
            });
        }
        Ok(Self(index as u8))
    }

    /// Raw index value.
    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Stamp this index into the high bits of `handle`.
    ///
    /// Bits at or above [`BITS_AFTER_SUB_HAL_INDEX`] are replaced, the local
    /// bits are left untouched.
    #[inline]
    pub fn encode(self, handle: i32) -> i32 {
        (handle & LOCAL_HANDLE_MASK) | ((self.0 as i32) << BITS_AFTER_SUB_HAL_INDEX)
    }
}

impl TryFrom<u8> for SubHalIndex {
    type Error = ContractError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value as usize)
    }
}

impl From<SubHalIndex> for u8 {
    fn from(index: SubHalIndex) -> Self {
        index.0
    }
}

impl fmt::Display for SubHalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encode `handle` for the sub-HAL at `index`.
#[inline]
pub fn encode_handle(handle: i32, index: SubHalIndex) -> i32 {
    index.encode(handle)
}

/// Sub-HAL index carried by an encoded handle.
#[inline]
pub fn sub_hal_index_of(handle: i32) -> SubHalIndex {
    SubHalIndex(((handle as u32) >> BITS_AFTER_SUB_HAL_INDEX) as u8 & MAX_SUB_HAL_INDEX)
}

/// Sub-HAL-local part of an encoded handle.
#[inline]
pub fn local_handle(handle: i32) -> i32 {
    handle & LOCAL_HANDLE_MASK
}

/// Split an encoded handle into its sub-HAL index and local handle.
#[inline]
pub fn decode_handle(handle: i32) -> (SubHalIndex, i32) {
    (sub_hal_index_of(handle), local_handle(handle))
}

/// Check that a sub-HAL-local handle leaves the index bits free.
pub fn check_local_handle(handle: i32) -> Result<i32, ContractError> {
    if handle & !LOCAL_HANDLE_MASK != 0 {
        return Err(ContractError::HandleOutOfRange { handle });
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_sets_high_bits() {
        let index = SubHalIndex::new(5).unwrap();
        let encoded = index.encode(0x00AB_CDEF);
        assert_eq!(encoded, 0x05AB_CDEF);
        assert_eq!(sub_hal_index_of(encoded), index);
        assert_eq!(local_handle(encoded), 0x00AB_CDEF);
    }

    #[test]
    fn test_encode_replaces_existing_index() {
        let first = SubHalIndex::new(1).unwrap();
        let second = SubHalIndex::new(2).unwrap();
        let encoded = second.encode(first.encode(7));
        assert_eq!(decode_handle(encoded), (second, 7));
    }

    #[test]
    fn test_max_index_stays_positive() {
        let index = SubHalIndex::new(MAX_SUB_HAL_INDEX as usize).unwrap();
        let encoded = index.encode(LOCAL_HANDLE_MASK);
        assert!(encoded > 0);
        assert_eq!(sub_hal_index_of(encoded).get(), MAX_SUB_HAL_INDEX);
    }

    #[test]
    fn test_index_out_of_range() {
        let err = SubHalIndex::new(200).unwrap_err();
        assert!(matches!(
            err,
            ContractError::SubHalIndexOutOfRange { index: 200, .. }
        ));
    }

    #[test]
    fn test_check_local_handle() {
        assert_eq!(check_local_handle(0x00FF_FFFF).unwrap(), 0x00FF_FFFF);
        assert!(check_local_handle(0x0100_0000).is_err());
        assert!(check_local_handle(-1).is_err());
    }

    #[test]
    fn test_serde_rejects_large_index() {
        let parsed: Result<SubHalIndex, _> = serde_json::from_str("130");
        assert!(parsed.is_err());
        let parsed: SubHalIndex = serde_json::from_str("4").unwrap();
        assert_eq!(parsed.get(), 4);
    }
}
