//! Identity document extraction and cross-check state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use branchline_core::DocumentKind;

/// Fields read off a document by the vision service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentExtraction {
    /// Which document this is.
    pub kind: DocumentKind,
    /// Field name to value; `None` where the service could not read it.
    pub fields: BTreeMap<String, Option<String>>,
}

impl DocumentExtraction {
    /// Build from the `data` object of a vision response.
    ///
    /// Strings are kept as-is, `null` becomes `None`, and any other JSON
    /// value is kept in its textual form.
    #[must_use]
    pub fn from_service_data(kind: DocumentKind, data: Map<String, Value>) -> Self {
        let fields = data
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                };
                (key, value)
            })
            .collect();
        Self { kind, fields }
    }

    /// A non-blank field value.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Option::as_deref)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.field("full_name")
    }

    #[must_use]
    pub fn date_of_birth(&self) -> Option<&str> {
        self.field("date_of_birth")
    }
}

/// A field that differed between documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchField {
    Name,
    DateOfBirth,
}

/// A cross-checked Aadhaar/PAN pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedDocuments {
    pub aadhaar: DocumentExtraction,
    pub pan: DocumentExtraction,
}

impl VerifiedDocuments {
    /// Order a matched pair by kind.
    #[must_use]
    pub fn from_pair(a: DocumentExtraction, b: DocumentExtraction) -> Self {
        if a.kind == DocumentKind::Aadhaar {
            Self { aadhaar: a, pan: b }
        } else {
            Self { aadhaar: b, pan: a }
        }
    }
}

/// Document state held in the session.
///
/// At most one of the two fields is set at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentState {
    /// First document of a pair, waiting for its counterpart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<DocumentExtraction>,
    /// Both documents after a successful cross-check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<VerifiedDocuments>,
}

impl DocumentState {
    /// The extraction held for `kind`, verified or pending.
    #[must_use]
    pub fn document(&self, kind: DocumentKind) -> Option<&DocumentExtraction> {
        if let Some(verified) = &self.verified {
            return Some(match kind {
                DocumentKind::Aadhaar => &verified.aadhaar,
                DocumentKind::Pan => &verified.pan,
            });
        }
        self.pending.as_ref().filter(|doc| doc.kind == kind)
    }
}

/// Result of submitting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrossCheckOutcome {
    /// First document accepted; waiting for the other kind.
    Pending { document: DocumentExtraction },
    /// Second document matched the first; both are now verified.
    Verified { documents: VerifiedDocuments },
    /// Something did not match; nothing was stored.
    Rejected {
        document: DocumentExtraction,
        mismatches: Vec<MismatchField>,
    },
}
