//! Board state and the drag relocation controller.
//!
//! [`model`] holds the columns-and-cards structure; [`drag`] holds the
//! state machine that moves cards between columns optimistically and
//! rolls them back when the server disagrees.

pub mod drag;
pub mod model;
