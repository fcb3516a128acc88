//! Core use-case services.
//!
//! # Responsibility
//! - Enforce status transitions on top of the entity store.
//! - Orchestrate mutate -> rebuild tree -> save for presentation callers.
//! - Keep confirmation decisions outside core through an injected policy.

pub mod confirm;
pub mod projects_service;
pub mod status_controller;
