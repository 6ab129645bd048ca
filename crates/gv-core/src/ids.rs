use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier used across the circuit model.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
///
/// Nodes are rebuilt wholesale on every reset, so everything refers to them
/// through these arena indices rather than through references that would be
/// invalidated by the rebuild.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        // index+1 must be nonzero
        Self(NonZeroU32::new(index + 1).expect("index+1 is nonzero"))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
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
pub type NodeId = Id;
pub type CompId = Id;

/// Which end of a two-terminal component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermSide {
    /// Terminal 0. For power sources this is the driven side.
    A,
    /// Terminal 1. For power sources this must bind to ground.
    B,
}

impl TermSide {
    pub fn other(self) -> Self {
        match self {
            TermSide::A => TermSide::B,
            TermSide::B => TermSide::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            TermSide::A => 0,
            TermSide::B => 1,
        }
    }
}

/// A terminal handle: one end of a placed component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermRef {
    pub comp: CompId,
    pub side: TermSide,
}

impl TermRef {
    pub fn new(comp: CompId, side: TermSide) -> Self {
        Self { comp, side }
    }

    /// The other terminal of the same component.
    pub fn opposite(self) -> Self {
        Self {
            comp: self.comp,
            side: self.side.other(),
        }
    }
}
