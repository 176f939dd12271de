//! Shared task model and wire payloads for `TermBoard`.

pub mod task;
pub mod wire;
