//! Use-case level tutorial queries.
//!
//! # Responsibility
//! - Expose one named operation per tutorial lookup or mutation.
//! - Stay storage-agnostic by delegating to a `TutorialStore`.

pub mod tutorial_service;
