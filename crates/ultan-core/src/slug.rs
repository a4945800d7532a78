//! World identifiers.
//!
//! A world name typed by a user ("My World!") is folded into a slug
//! ("my-world") that doubles as its directory name under `worlds/`.

use crate::error::{Error, Result};
use std::fmt;

/// Fold a free-form name into a slug.
///
/// Trims, lowercases, turns every space into `-`, then drops every character
/// outside `[a-z0-9-]`. Runs of spaces are not collapsed, so `"  A  B "`
/// becomes `"a--b"`. May return an empty string; see [`WorldId::parse`].
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// A validated, non-empty world slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(String);

impl WorldId {
    /// Normalize `name` and reject it if nothing usable is left.
    pub fn parse(name: &str) -> Result<Self> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(Error::InvalidIdentifier(name.to_string()));
        }
        Ok(WorldId(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WorldId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
