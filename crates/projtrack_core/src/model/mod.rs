//! Domain model for wrappers, projects and the persisted document.
//!
//! # Responsibility
//! - Define the entity records and their closed `Status` lifecycle.
//! - Own the parse/render boundary of the JSON document.
//!
//! # Invariants
//! - Unknown status values are rejected at the parse boundary.
//! - Every project `wrapper_id` in a parsed model references an existing wrapper.

pub mod document;
pub mod entity;
