//! `TermBoard` — terminal kanban board library.

pub mod app;
pub mod board;
pub mod config;
pub mod net;
pub mod sync;
pub mod ui;
