//! Aadhaar/PAN cross-check.
//!
//! The first document of a pair must carry the registered user's name. The
//! second must agree with the first on name and date of birth. Any mismatch
//! discards both documents.
//!
//! A user has at most one submission in flight. The document state is read
//! before the extraction call and written after it, so overlapping
//! submissions from one session would otherwise overwrite each other.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

use branchline_core::{UserId, dates_of_birth_match, names_match};

use super::FlowError;
use crate::models::document::{
    CrossCheckOutcome, DocumentExtraction, DocumentState, MismatchField, VerifiedDocuments,
};

/// Per-user guards for document submissions.
#[derive(Clone)]
pub struct SubmissionLocks {
    locks: Cache<UserId, Arc<Mutex<()>>>,
}

impl SubmissionLocks {
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Claim the submission slot for `user` until the guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::DocumentInProgress` while another submission for
    /// the same user is running.
    pub async fn try_acquire(&self, user: UserId) -> Result<OwnedMutexGuard<()>, FlowError> {
        let lock = self
            .locks
            .get_with(user, async { Arc::new(Mutex::new(())) })
            .await;
        lock.try_lock_owned()
            .map_err(|_| FlowError::DocumentInProgress)
    }
}

/// Apply one submitted document to the session's document state.
///
/// # Errors
///
/// Returns `FlowError::DocumentsAlreadyVerified` when a verified pair exists.
pub fn submit(
    state: &mut DocumentState,
    registered_name: &str,
    document: DocumentExtraction,
) -> Result<CrossCheckOutcome, FlowError> {
    if state.verified.is_some() {
        return Err(FlowError::DocumentsAlreadyVerified);
    }

    let outcome = match state.pending.take() {
        Some(first) if first.kind != document.kind => {
            let mismatches = compare(&first, &document);
            if mismatches.is_empty() {
                let documents = VerifiedDocuments::from_pair(first, document);
                state.verified = Some(documents.clone());
                CrossCheckOutcome::Verified { documents }
            } else {
                CrossCheckOutcome::Rejected {
                    document,
                    mismatches,
                }
            }
        }
        // No pending document, or a resubmission of the same kind.
        _ => {
            if names_match(document.full_name().unwrap_or_default(), registered_name) {
                state.pending = Some(document.clone());
                CrossCheckOutcome::Pending { document }
            } else {
                CrossCheckOutcome::Rejected {
                    document,
                    mismatches: vec![MismatchField::Name],
                }
            }
        }
    };

    match &outcome {
        CrossCheckOutcome::Pending { document } => {
            tracing::info!(kind = document.kind.service_name(), "document pending counterpart");
        }
        CrossCheckOutcome::Verified { .. } => tracing::info!("document pair verified"),
        CrossCheckOutcome::Rejected { mismatches, .. } => {
            tracing::info!(?mismatches, "document rejected");
        }
    }

    Ok(outcome)
}

/// Fields on which two documents disagree. Missing values disagree.
#[must_use]
pub fn compare(first: &DocumentExtraction, second: &DocumentExtraction) -> Vec<MismatchField> {
    let mut mismatches = Vec::new();
    if !names_match(
        first.full_name().unwrap_or_default(),
        second.full_name().unwrap_or_default(),
    ) {
        mismatches.push(MismatchField::Name);
    }
    if !dates_of_birth_match(first.date_of_birth(), second.date_of_birth()) {
        mismatches.push(MismatchField::DateOfBirth);
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use branchline_core::DocumentKind;

    use super::*;

    fn doc(kind: DocumentKind, name: Option<&str>, dob: Option<&str>) -> DocumentExtraction {
        DocumentExtraction {
            kind,
            fields: BTreeMap::from([
                ("full_name".to_string(), name.map(String::from)),
                ("date_of_birth".to_string(), dob.map(String::from)),
            ]),
        }
    }

    #[tokio::test]
    async fn test_one_submission_per_user() {
        let locks = SubmissionLocks::new(Duration::from_secs(60));
        let asha = UserId::new(1);

        let guard = locks.try_acquire(asha).await.unwrap();
        assert_eq!(
            locks.try_acquire(asha).await.unwrap_err(),
            FlowError::DocumentInProgress
        );
        assert!(locks.try_acquire(UserId::new(2)).await.is_ok());

        drop(guard);
        assert!(locks.try_acquire(asha).await.is_ok());
    }

    #[test]
    fn test_first_document_must_match_registered_name() {
        let mut state = DocumentState::default();
        let outcome = submit(
            &mut state,
            "Asha Rao",
            doc(DocumentKind::Aadhaar, Some("Ravi Kumar"), Some("07/03/1990")),
        )
        .unwrap_or_else(|e| panic!("{e}"));

        assert!(matches!(
            outcome,
            CrossCheckOutcome::Rejected { ref mismatches, .. } if mismatches == &[MismatchField::Name]
        ));
        assert_eq!(state, DocumentState::default());
    }

    #[test]
    fn test_matching_pair_is_verified() {
        let mut state = DocumentState::default();
        let first = submit(
            &mut state,
            "Asha Rao",
            doc(DocumentKind::Pan, Some("RAO ASHA"), Some("07/03/1990")),
        );
        assert!(matches!(first, Ok(CrossCheckOutcome::Pending { .. })));

        let second = submit(
            &mut state,
            "Asha Rao",
            doc(DocumentKind::Aadhaar, Some("Asha Kumari Rao"), Some("1990-03-07")),
        );
        assert!(matches!(second, Ok(CrossCheckOutcome::Verified { .. })));

        let verified = state.verified.as_ref().map(|v| (v.aadhaar.kind, v.pan.kind));
        assert_eq!(verified, Some((DocumentKind::Aadhaar, DocumentKind::Pan)));
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_differing_date_of_birth_discards_both() {
        let mut state = DocumentState::default();
        submit(
            &mut state,
            "Asha Rao",
            doc(DocumentKind::Aadhaar, Some("Asha Rao"), Some("07/03/1990")),
        )
        .unwrap_or_else(|e| panic!("{e}"));

        let outcome = submit(
            &mut state,
            "Asha Rao",
            doc(DocumentKind::Pan, Some("Asha Rao"), Some("08/03/1990")),
        )
        .unwrap_or_else(|e| panic!("{e}"));

        assert!(matches!(
            outcome,
            CrossCheckOutcome::Rejected { ref mismatches, .. }
                if mismatches == &[MismatchField::DateOfBirth]
        ));
        assert!(state.pending.is_none());
        assert!(state.verified.is_none());
    }

    #[test]
    fn test_missing_date_of_birth_is_a_mismatch() {
        let first = doc(DocumentKind::Aadhaar, Some("Asha Rao"), Some("07/03/1990"));
        let second = doc(DocumentKind::Pan, Some("Asha Rao"), None);
        assert_eq!(compare(&first, &second), vec![MismatchField::DateOfBirth]);
    }

    #[test]
    fn test_resubmitting_same_kind_replaces_pending() {
        let mut state = DocumentState::default();
        submit(
            &mut state,
            "Asha Rao",
            doc(DocumentKind::Pan, Some("Asha Rao"), Some("01/01/1990")),
        )
        .unwrap_or_else(|e| panic!("{e}"));
        submit(
            &mut state,
            "Asha Rao",
            doc(DocumentKind::Pan, Some("Asha Rao"), Some("07/03/1990")),
        )
        .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(
            state.pending.as_ref().and_then(DocumentExtraction::date_of_birth),
            Some("07/03/1990")
        );
    }

    #[test]
    fn test_verified_pair_must_be_reset_first() {
        let mut state = DocumentState::default();
        for kind in [DocumentKind::Pan, DocumentKind::Aadhaar] {
            submit(&mut state, "Asha Rao", doc(kind, Some("Asha Rao"), Some("07/03/1990")))
                .unwrap_or_else(|e| panic!("{e}"));
        }

        let again = submit(
            &mut state,
            "Asha Rao",
            doc(DocumentKind::Pan, Some("Asha Rao"), Some("07/03/1990")),
        );
        assert_eq!(again, Err(FlowError::DocumentsAlreadyVerified));
    }
}
