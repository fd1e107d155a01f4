//! Storage-access layer for tutorials.
//!
//! # Responsibility
//! - Define the `TutorialStore` contract that query operations delegate to.
//! - Keep SQLite statement building and row decoding inside this boundary.
//!
//! # Invariants
//! - Mutations run inside an IMMEDIATE transaction.
//! - Zero affected rows on bulk mutations is a count, not an error.

pub mod tutorial_repo;
