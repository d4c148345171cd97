//! Object references
//!
//! A dbref is the integer handle of an object in the world database. Negative
//! values are sentinels and never name a real object.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dbref(pub i32);

impl Dbref {
    /// No object.
    pub const NOTHING: Dbref = Dbref(-1);
    /// A match resolved to more than one object.
    pub const AMBIGUOUS: Dbref = Dbref(-2);
    /// The "home" pseudo-destination.
    pub const HOME: Dbref = Dbref(-3);
    /// The all-powerful object.
    pub const GOD: Dbref = Dbref(1);

    pub fn is_nothing(self) -> bool {
        self.0 < 0
    }

    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// Parse `#N` (or `#-N` for sentinels). Leading/trailing spaces are ignored.
    pub fn parse(s: &str) -> Option<Dbref> {
        let digits = s.trim().strip_prefix('#')?;
        if digits.is_empty() {
            return None;
        }
        digits.parse::<i32>().ok().map(Dbref)
    }
}

impl fmt::Display for Dbref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i32> for Dbref {
    fn from(n: i32) -> Self {
        Dbref(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_forms() {
        assert_eq!(Dbref::parse("#12"), Some(Dbref(12)));
        assert_eq!(Dbref::parse(" #0 "), Some(Dbref(0)));
        assert_eq!(Dbref::parse("#-1"), Some(Dbref::NOTHING));
        assert_eq!(Dbref::parse("12"), None);
        assert_eq!(Dbref::parse("#"), None);
        assert_eq!(Dbref::parse("#x"), None);
    }

    #[test]
    fn display_has_hash() {
        assert_eq!(Dbref(7).to_string(), "#7");
        assert!(Dbref::NOTHING.is_nothing());
    }
}
