//! Business logic services for the portal.
//!
//! # Services
//!
//! - `auth` - Registration and password verification
//! - `vision` - Face enrolment, face matching, and document extraction client
//! - `assistant` - Branch manager assistant client
//! - `documents` - Aadhaar/PAN cross-check
//! - `eligibility` - Loan eligibility from a document pair
//! - `loan` - Loan application wizard
//! - `chat` - Per-user chat transcripts

pub mod assistant;
pub mod auth;
pub mod chat;
pub mod documents;
pub mod eligibility;
pub mod loan;
pub mod vision;

use thiserror::Error;

/// A request that is well-formed but not allowed in the current flow state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    /// A verified pair exists; it must be reset before submitting again.
    #[error("documents are already verified")]
    DocumentsAlreadyVerified,

    /// Another document submission for this user is still running.
    #[error("a document is already being checked")]
    DocumentInProgress,

    /// The wizard payload did not have the shape the current step expects.
    #[error("invalid {step} details: {reason}")]
    InvalidPayload { step: &'static str, reason: String },

    /// `next` was called on the last wizard step.
    #[error("this is the last step; submit the application instead")]
    NoNextStep,

    /// The action is only available at the documents step.
    #[error("complete the earlier steps first")]
    NotAtDocumentsStep,

    /// Empty or whitespace-only chat message.
    #[error("message cannot be empty")]
    EmptyMessage,

    /// An assistant request is already outstanding for this user.
    #[error("still working on your previous message")]
    ChatBusy,
}
