//! Seat and fork identifiers.

use std::fmt;

/// Position of a diner around the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DinerId(pub usize);

impl DinerId {
    /// Create from a raw seat index.
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw seat index.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }

    /// The fork this diner owns outright.
    #[inline]
    pub const fn own_fork(&self) -> ForkId {
        ForkId(self.0)
    }
}

impl fmt::Display for DinerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diner#{}", self.0)
    }
}

/// A fork, numbered after the diner that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForkId(pub usize);

impl ForkId {
    /// Raw fork index.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }

    /// The diner that owns this fork.
    #[inline]
    pub const fn owner(&self) -> DinerId {
        DinerId(self.0)
    }
}

impl fmt::Display for ForkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fork#{}", self.0)
    }
}
