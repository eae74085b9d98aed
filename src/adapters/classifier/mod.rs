//! Classifier adapters. Implement ClassifierPort.
//!
//! HTTP adapter for the real service and a mock for local runs and tests.

pub mod http_adapter;
pub mod mock_adapter;

pub use http_adapter::HttpClassifier;
pub use mock_adapter::MockClassifier;
