//! Resolved identity of a note
//!
//! A ledger expression may be keyed by either the surface form found in the
//! content or the base form given as the note's definition. Both forms are
//! resolved once when the corpus is indexed.

use std::fmt;

use super::models::Note;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    surface: String,
    base: Option<String>,
}

impl CanonicalKey {
    pub fn new(surface: impl Into<String>, base: Option<String>) -> Self {
        let surface = surface.into();
        let base = base.filter(|b| !b.is_empty() && *b != surface);
        Self { surface, base }
    }

    pub fn from_note(note: &Note) -> Self {
        Self::new(note.expression.clone(), Some(note.definition.clone()))
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Base form, only when it differs from the surface form
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Key the ledger should use: the base form when there is one
    pub fn preferred(&self) -> &str {
        self.base.as_deref().unwrap_or(&self.surface)
    }

    /// All forms, preferred first
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.preferred()).chain(self.base.as_ref().map(|_| self.surface.as_str()))
    }

    pub fn matches(&self, key: &str) -> bool {
        self.surface == key || self.base.as_deref() == Some(key)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            Some(base) => write!(f, "{} ({})", self.surface, base),
            None => f.write_str(&self.surface),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_equal_to_surface_is_dropped() {
        let key = CanonicalKey::new("run", Some("run".to_string()));
        assert_eq!(key.base(), None);
        assert_eq!(key.forms().collect::<Vec<_>>(), vec!["run"]);
    }

    #[test]
    fn test_matches_either_form() {
        let key = CanonicalKey::from_note(&Note::new("ran").with_definition("run"));
        assert!(key.matches("ran"));
        assert!(key.matches("run"));
        assert!(!key.matches("Run"));
        assert_eq!(key.preferred(), "run");
        assert_eq!(key.forms().collect::<Vec<_>>(), vec!["run", "ran"]);
    }
}
