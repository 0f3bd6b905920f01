//! Domain models for the portal.

pub mod chat;
pub mod document;
pub mod loan;
pub mod session;
pub mod user;

pub use chat::{ChatMessage, Role, Transcript};
pub use document::{CrossCheckOutcome, DocumentExtraction, DocumentState, MismatchField};
pub use loan::{LoanApplication, LoanStep, UploadSlot};
pub use session::{AuthState, LoginStep, SessionUser, keys as session_keys};
pub use user::User;
