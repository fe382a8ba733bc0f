//! Strongly-typed identifiers and epochs for Starling entities.
//!
//! Explicit wrapper types prevent bugs from mixing up IDs: a broker id
//! and a leader epoch are both 64-bit integers on the wire, but they
//! must never be interchangeable in code.

use std::fmt;

/// Macro to generate strongly-typed u64 wrappers.
///
/// Each generated type provides:
/// - Type safety (can't mix `BrokerId` with `LeaderEpoch`)
/// - Debug/Display formatting
/// - Zero-cost abstraction (same layout as a raw u64)
macro_rules! define_id {
    ($name:ident, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new value from a raw u64.
            #[inline]
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw u64 value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Returns the next value in sequence.
            ///
            /// # Panics
            /// Panics on overflow.
            #[inline]
            #[must_use]
            pub const fn next(self) -> Self {
                assert!(self.0 < u64::MAX, "id overflow");
                Self(self.0 + 1)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $prefix, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.get()
            }
        }
    };
}

// Broker and topic identification.
define_id!(BrokerId, "broker", "Unique identifier for a broker (storage node) in the cluster.");
define_id!(TopicId, "topic", "Unique identifier for a topic.");
define_id!(PartitionIndex, "partition", "Index of a partition within a topic.");

// Fencing epochs. Each is a monotonically increasing counter; a stale
// epoch in a request lets the controller reject claims from the past.
define_id!(LeaderEpoch, "lepoch", "Leader epoch fencing stale leadership claims for a partition.");
define_id!(PartitionEpoch, "pepoch", "Partition epoch fencing stale partition-metadata updates.");
define_id!(BrokerEpoch, "bepoch", "Broker epoch identifying a broker's current process incarnation.");
