//! Branchline Core - Shared domain types.
//!
//! This crate provides the types shared by every Branchline component:
//! - `portal` - The customer-facing web service
//! - `cli` - Migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Identity checks that have to agree
//! between the portal and its tests (name matching, date-of-birth parsing)
//! live here so they can be exercised without a running service.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, person names, dates of birth, document kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
