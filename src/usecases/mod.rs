//! Application use cases. Orchestrate domain logic via ports.

pub mod classification_service;
pub mod conversation_service;
pub mod report_renderer;
pub mod report_service;

pub use classification_service::{ClassificationService, CycleStats};
pub use conversation_service::{ConversationService, ReportPrompt};
pub use report_renderer::render_report;
pub use report_service::ReportService;
