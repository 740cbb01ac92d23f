//! Bone handles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a bone inside its [`Skeleton`](crate::Skeleton).
///
/// Handles are dense and assigned in insertion order, which is also
/// top-down order: a parent's id is always lower than its children's.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct BoneId(pub u32);

impl BoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        BoneId(index as u32)
    }
}

impl fmt::Display for BoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip_and_order() {
        assert_eq!(BoneId::from_index(3).index(), 3);
        assert!(BoneId(1) < BoneId(2));
        assert_eq!(BoneId(7).to_string(), "#7");
    }
}
