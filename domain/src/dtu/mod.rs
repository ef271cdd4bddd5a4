//! DTU record as seen by the collaboration engine
//!
//! Storage, indexing and versioning of DTUs belong to the external store;
//! this module only models the fields the engine reads and mutates.

pub mod entities;

pub use entities::Dtu;
