//! Infrastructure adapters. Implement outbound ports.
//!
//! Classifier HTTP client, SQLite/in-memory storage, console transport. Map errors to DomainError.

pub mod classifier;
pub mod persistence;
pub mod ui;
