//! Tern utilities for printing sequences of items within error messages in a
//! human readable way.
use std::fmt;

/// The [SequenceJoinKind] specifies how the items of a [SequenceDisplay]
/// relate to one another in the surrounding message, which decides the
/// conjunctive that is used to glue the items together.
#[derive(Eq, PartialEq)]
pub enum SequenceJoinKind {
    /// Items within a [SequenceDisplay] are phrased as alternatives
    Either,
    /// Items within a [SequenceDisplay] are phrased as all applying
    All,
}

impl SequenceJoinKind {
    pub fn as_conjunctive(&self) -> &str {
        match self {
            SequenceJoinKind::Either => "or",
            SequenceJoinKind::All => "and",
        }
    }
}

/// Displays a slice of items as prose, wrapping each item in backticks and
/// joining the items with commas and a final conjunctive. Single item
/// sequences are printed without any glue, and [SequenceJoinKind::Either]
/// sequences are introduced with `either a`.
pub struct SequenceDisplay<'a, T: 'a> {
    pub items: &'a [T],
    mode: SequenceJoinKind,
}

impl<'a, T: 'a> SequenceDisplay<'a, T> {
    /// Create a new [SequenceDisplay]
    pub fn new(items: &'a [T], mode: SequenceJoinKind) -> Self {
        Self { items, mode }
    }

    /// Create a [SequenceDisplay] with the join mode as
    /// [SequenceJoinKind::Either]
    pub fn either(items: &'a [T]) -> Self {
        Self { items, mode: SequenceJoinKind::Either }
    }

    /// Create a [SequenceDisplay] with the join mode as [SequenceJoinKind::All]
    pub fn all(items: &'a [T]) -> Self {
        Self { items, mode: SequenceJoinKind::All }
    }
}

impl<'a, T: fmt::Display + 'a> fmt::Display for SequenceDisplay<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.items {
            [] => Ok(()),
            [item] => {
                if self.mode == SequenceJoinKind::Either {
                    write!(f, "a `{item}`")
                } else {
                    write!(f, "`{item}`")
                }
            }
            [init @ .., last] => {
                if self.mode == SequenceJoinKind::Either {
                    write!(f, "either a ")?;
                }

                for item in init {
                    write!(f, "`{item}`, ")?;
                }

                write!(f, "{} `{last}`", self.mode.as_conjunctive())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_joined_with_conjunctives() {
        assert_eq!(format!("{}", SequenceDisplay::all(&["A"])), "`A`");
        assert_eq!(format!("{}", SequenceDisplay::all(&["A", "B"])), "`A`, and `B`");
        assert_eq!(
            format!("{}", SequenceDisplay::either(&["A", "B", "C"])),
            "either a `A`, `B`, or `C`"
        );
        assert_eq!(format!("{}", SequenceDisplay::either(&["A"])), "a `A`");
        assert_eq!(format!("{}", SequenceDisplay::<&str>::all(&[])), "");
    }
}
