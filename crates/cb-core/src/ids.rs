use core::fmt;
use core::num::NonZeroU64;

/// Compact, stable identifier handed out in creation order.
///
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
/// - ids from one [`IdSequence`] are strictly increasing
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Id(NonZeroU64);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u64) -> Self {
        Self(NonZeroU64::new(index.saturating_add(1)).unwrap_or(NonZeroU64::MIN))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u64 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Domain-specific ID aliases for clarity (no runtime cost).
pub type ActionId = Id;
pub type SubscriptionId = Id;

/// Monotonic allocator of [`Id`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> Id {
        let id = Id::from_index(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}
