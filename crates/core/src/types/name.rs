//! Person names as printed on identity documents.
//!
//! OCR output and registration forms disagree on case, spacing, word order,
//! and how much of a name is written out ("Rao Asha" on one card, "Asha
//! Kumari Rao" on another). Two names match when, after normalisation, the
//! words of one are all contained in the other.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalised person name.
///
/// Normalisation lowercases the input and collapses runs of whitespace to a
/// single space.
///
/// ```
/// use branchline_core::PersonName;
///
/// let a = PersonName::new("  JOHN   Doe ");
/// let b = PersonName::new("Doe John");
/// assert_eq!(a.as_str(), "john doe");
/// assert!(a.matches(&b));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PersonName(String);

impl PersonName {
    /// Normalise a raw name.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let normalised = raw
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        Self(normalised)
    }

    /// The normalised form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when nothing but whitespace was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The distinct words of the name.
    #[must_use]
    pub fn tokens(&self) -> BTreeSet<&str> {
        self.0.split(' ').filter(|t| !t.is_empty()).collect()
    }

    /// Token-set match: one name's words are a subset of the other's.
    ///
    /// An empty name never matches anything, including another empty name;
    /// an unreadable name on a document is not evidence of identity.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        let ours = self.tokens();
        let theirs = other.tokens();
        if ours.is_empty() || theirs.is_empty() {
            return false;
        }
        ours.is_subset(&theirs) || theirs.is_subset(&ours)
    }
}

impl From<String> for PersonName {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<PersonName> for String {
    fn from(name: PersonName) -> Self {
        name.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compare two raw names with [`PersonName::matches`].
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    PersonName::new(a).matches(&PersonName::new(b))
}
