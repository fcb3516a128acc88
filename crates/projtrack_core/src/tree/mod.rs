//! Display tree derived from the flat model.
//!
//! # Responsibility
//! - Build the grouped status tree after every mutation.
//! - Resolve node selections into child lists or detail records.
//!
//! # Invariants
//! - Nothing in this module mutates the model or touches storage.

pub mod builder;
pub mod selection;
