//! Core types for Branchline.
//!
//! This module provides type-safe wrappers for the identity concepts the
//! portal reasons about.

pub mod date;
pub mod document;
pub mod email;
pub mod id;
pub mod name;

pub use date::{DateOfBirth, DateOfBirthError, dates_of_birth_match};
pub use document::{DocumentKind, UnknownDocumentKind};
pub use email::{Email, EmailError};
pub use id::*;
pub use name::{PersonName, names_match};
