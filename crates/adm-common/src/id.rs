//! Opaque identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An attribute identifier. Opaque, symbolic, string-like.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrId(pub String);

impl AttrId {
    pub fn new(s: impl Into<String>) -> Self {
        AttrId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AttrId {
    fn from(s: &str) -> Self {
        AttrId(s.to_string())
    }
}

impl From<String> for AttrId {
    fn from(s: String) -> Self {
        AttrId(s)
    }
}

/// Server-assigned identifier for one game/run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    pub fn new(s: impl Into<String>) -> Self {
        GameId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GameId {
    fn from(s: &str) -> Self {
        GameId(s.to_string())
    }
}

impl From<String> for GameId {
    fn from(s: String) -> Self {
        GameId(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_id_display_roundtrip() {
        let a = AttrId::new("young");
        assert_eq!(a.to_string(), "young");
        assert_eq!(a.as_str(), "young");
    }

    #[test]
    fn attr_id_ordering_is_lexicographic() {
        let mut v = vec![AttrId::new("z"), AttrId::new("a"), AttrId::new("m")];
        v.sort();
        assert_eq!(v, vec![AttrId::new("a"), AttrId::new("m"), AttrId::new("z")]);
    }
}
