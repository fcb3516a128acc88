//! Entity store over a pluggable storage backend.
//!
//! # Responsibility
//! - Expose CRUD and lookup APIs over the wrapper/project collections.
//! - Isolate storage round-trips from status and tree logic.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`, `WrapperHasChildren`) in
//!   addition to storage transport errors.

pub mod entity_store;
