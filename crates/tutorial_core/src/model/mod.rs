//! Domain model for the tutorial catalog.
//!
//! # Invariants
//! - Every persisted tutorial has a storage-assigned, immutable `TutorialId`.

pub mod tutorial;
