use std::fmt;

/// Stable integer identity of an object (room/thing/player/exit/garbage).
///
/// A `Dbref` is never reused while its object is alive; once an object is
/// destroyed the underlying slot becomes `Garbage` and may be handed back out
/// by a later `create`, but the numeric value itself never changes meaning
/// mid-lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dbref(pub i32);

impl Dbref {
    /// Sentinel meaning "no object" (`#-1` in MUSH notation).
    pub const NOTHING: Dbref = Dbref(-1);
    /// Sentinel meaning "any object" used by some wildcard lock clauses.
    pub const AMBIGUOUS: Dbref = Dbref(-2);
    /// Sentinel used as the home of newly created rooms before assignment.
    pub const HOME: Dbref = Dbref(-3);

    pub fn is_valid_index(self) -> bool {
        self.0 >= 0
    }

    pub fn index(self) -> Option<usize> {
        if self.is_valid_index() {
            Some(self.0 as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for Dbref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i32> for Dbref {
    fn from(value: i32) -> Self {
        Dbref(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ObjectKind {
    Room,
    Thing,
    Player,
    Exit,
    Garbage,
}

impl ObjectKind {
    pub fn letter(self) -> char {
        match self {
            ObjectKind::Room => 'R',
            ObjectKind::Thing => 'T',
            ObjectKind::Player => 'P',
            ObjectKind::Exit => 'E',
            ObjectKind::Garbage => 'G',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_has_no_index() {
        assert_eq!(Dbref::NOTHING.index(), None);
    }

    #[test]
    fn valid_dbref_round_trips_index() {
        let d = Dbref(42);
        assert_eq!(d.index(), Some(42));
        assert_eq!(d.to_string(), "#42");
    }
}
