//! Tern identifier storage utilities and wrappers. Identifiers are interned
//! eagerly into a global map, so that the rest of the compiler can pass
//! around and compare cheap copyable handles rather than strings.
use std::{
    fmt::{Debug, Display},
    sync::atomic::{AtomicU32, Ordering},
};

use dashmap::DashMap;
use fnv::FnvBuildHasher;
use lazy_static::lazy_static;

/// An interned identifier, pointing into the global [IdentifierMap].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Identifier(u32);

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", IDENTIFIER_MAP.get_ident(*self))
    }
}

impl Debug for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Identifier")
            .field(&IDENTIFIER_MAP.get_ident(*self).to_owned())
            .field(&self.0)
            .finish()
    }
}

impl Identifier {
    /// Get the string that this [Identifier] was interned from.
    pub fn as_str(&self) -> &'static str {
        IDENTIFIER_MAP.get_ident(*self)
    }
}

// Utility methods for converting from a String to an Identifier and vice
// versa.

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        IDENTIFIER_MAP.create_ident(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        IDENTIFIER_MAP.create_ident(name.as_str())
    }
}

impl From<Identifier> for &str {
    fn from(ident: Identifier) -> Self {
        IDENTIFIER_MAP.get_ident(ident)
    }
}

impl From<Identifier> for String {
    fn from(ident: Identifier) -> Self {
        String::from(IDENTIFIER_MAP.get_ident(ident))
    }
}

lazy_static! {
    pub static ref IDENTIFIER_MAP: IdentifierMap = IdentifierMap::new();
}

/// Struct representing a globally accessible identifier map. The struct
/// contains an identifier map and another map for reverse lookups. Interned
/// strings live for the lifetime of the process.
#[derive(Debug, Default)]
pub struct IdentifierMap {
    counter: AtomicU32,
    reverse_identifiers: DashMap<&'static str, Identifier, FnvBuildHasher>,
    identifiers: DashMap<Identifier, &'static str, FnvBuildHasher>,
}

impl IdentifierMap {
    /// Create a new [IdentifierMap].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an [Identifier] from the given name, interning the name if it
    /// has not been seen before.
    pub fn create_ident(&self, name: &str) -> Identifier {
        if let Some(ident) = self.reverse_identifiers.get(name) {
            return *ident;
        }

        let name: &'static str = String::from(name).leak();

        // The id is only minted inside the entry so that two threads racing
        // on the same name settle on a single id.
        *self.reverse_identifiers.entry(name).or_insert_with(|| {
            let ident = Identifier(self.counter.fetch_add(1, Ordering::SeqCst));
            self.identifiers.insert(ident, name);
            ident
        })
    }

    /// Get the name behind an [Identifier].
    pub fn get_ident(&self, ident: Identifier) -> &'static str {
        self.identifiers.get(&ident).map(|name| *name).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idents_are_interned_once() {
        let fst: Identifier = "elem".into();
        let snd: Identifier = String::from("elem").into();

        assert_eq!(fst, snd);
        assert_eq!(fst.as_str(), "elem");
        assert_ne!(fst, Identifier::from("other"));
    }
}
