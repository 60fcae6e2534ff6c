//! Session Store
//!
//! Lifecycle of test sessions: creation, result collection, completion,
//! archival and cleanup.

#![warn(missing_docs)]

pub mod error;
pub mod store;
pub mod stats;
pub mod report;
pub mod export;

pub use error::{SessionError, Result};
pub use store::{SessionStore, DEFAULT_SESSIONS_TO_KEEP};
pub use stats::ExecutionStatistics;
pub use report::render_session_report;
pub use export::{
    markdown_cell, render_session, render_session_json, render_session_markdown, ReportFormat,
};
