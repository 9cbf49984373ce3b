//! Structured logging: `tracing` subscriber setup and one-line JSON reports.

mod format;

pub use format::{BatchReport, StructuredLogger};
