//! Tracks typed activities over time and breaks the time spent down by activity type and by
//! calendar day. The [tracker] module is the whole engine; [cli] hosts a session on top of it.
//!

pub mod cli;
pub mod tracker;
pub mod utils;
