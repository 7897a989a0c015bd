//! Integer handles into the graph and the timetable.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Returns the handle as a `usize` for indexing.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                $name(value as u32)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_type!(
    /// Identifier of a node in the combined street/transit graph.
    NodeId,
    "n"
);

index_type!(
    /// Identifier of a directed edge in the combined graph.
    EdgeId,
    "e"
);

index_type!(
    /// Index of a trip in the timetable.
    TripIdx,
    "t"
);

index_type!(
    /// Index of a stop pattern: trips with an identical stop sequence that
    /// never overtake one another.
    PatternId,
    "p"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip() {
        let id = NodeId::from(42usize);
        assert_eq!(id.index(), 42);
        assert_eq!(id, NodeId(42));
    }

    #[test]
    fn debug_uses_prefix() {
        assert_eq!(format!("{:?}", NodeId(3)), "n3");
        assert_eq!(format!("{:?}", EdgeId(7)), "e7");
        assert_eq!(format!("{:?}", TripIdx(1)), "t1");
        assert_eq!(format!("{}", PatternId(9)), "9");
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&EdgeId(12)).unwrap();
        assert_eq!(json, "12");
        let back: EdgeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EdgeId(12));
    }
}
