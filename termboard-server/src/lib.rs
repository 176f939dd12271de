//! `TermBoard` task server library.
//!
//! Exposes the HTTP task API for use in tests and embedding. The
//! server stores tasks in memory, issues CSRF tokens per session, and
//! answers the form-urlencoded mutation requests the board client
//! sends.

pub mod config;
pub mod server;
pub mod store;
