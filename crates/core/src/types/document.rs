//! Identity document kinds accepted for cross-checking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two identity documents of a KYC pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Aadhaar card (type A).
    #[serde(alias = "aadhar")]
    Aadhaar,
    /// PAN card (type B).
    Pan,
}

/// Error for a document type the portal does not handle.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown document type: {0}")]
pub struct UnknownDocumentKind(pub String);

impl DocumentKind {
    /// The name the vision service expects in its `name` field.
    ///
    /// The service spells Aadhaar with a single `a`.
    #[must_use]
    pub const fn service_name(self) -> &'static str {
        match self {
            Self::Aadhaar => "aadhar",
            Self::Pan => "pan",
        }
    }

    /// The other half of the pair.
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Aadhaar => Self::Pan,
            Self::Pan => Self::Aadhaar,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aadhaar => "Aadhaar Card",
            Self::Pan => "PAN Card",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentKind {
    type Err = UnknownDocumentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aadhaar" | "aadhar" => Ok(Self::Aadhaar),
            "pan" => Ok(Self::Pan),
            other => Err(UnknownDocumentKind(other.to_owned())),
        }
    }
}
