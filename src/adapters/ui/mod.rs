//! Console transport: inquire prompts and a stdout gateway.

pub mod console_gateway;
pub mod tui;

pub use console_gateway::ConsoleGateway;
pub use tui::TuiInputPort;
