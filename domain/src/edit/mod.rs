//! Edit session domain
//!
//! An edit session marks a DTU as being co-edited live. It records an
//! ordered edit log so participants can see who changed which field after
//! they last looked; it never merges values.

pub mod entities;

pub use entities::{Edit, EditSession};
