//! Branchline banking portal.
//!
//! Two-factor login (password, then face), identity document cross-check,
//! a loan application wizard, and a branch manager chat. The router is
//! exposed as a library so it can be driven in tests without a listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
