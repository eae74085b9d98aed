//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod report;

pub use entities::{
    Chat, ChatType, IncomingMessage, Label, LabelUpdate, Message, normalize_text,
};
pub use errors::DomainError;
pub use report::{ActivityPoint, ProductivityIndicator, Report, UserActivity, aggregate};
