use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a comment or reply, unique across a whole forest.
///
/// The value is the creation time in milliseconds since the Unix epoch, bumped
/// past the previously issued id when the clock has not moved forward.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CommentId(u64);

impl std::fmt::Debug for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl CommentId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// The smallest id strictly greater than this one, or `None` at
    /// `u64::MAX`.
    pub fn successor(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl From<u64> for CommentId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<CommentId> for u64 {
    fn from(id: CommentId) -> Self {
        id.0
    }
}

impl FromStr for CommentId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CommentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CommentId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self)
    }
}
