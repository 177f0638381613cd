//! Diagnostic creation, severity management, and rendering for placement runs.
//!
//! Placement stages report user-visible events (cluster-count retries, the
//! flat fallback, capacity summaries) as structured [`Diagnostic`] values. The
//! thread-safe [`DiagnosticSink`] accumulates them across the orchestrator and
//! the worker pool, and a [`DiagnosticRenderer`] formats them for the terminal
//! or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
