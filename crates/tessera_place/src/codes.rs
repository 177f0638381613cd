//! Diagnostic codes emitted by the placement pipeline.

use tessera_diagnostics::{Category, DiagnosticCode};

/// Coarse placement was infeasible; retrying with one cluster fewer.
pub const CLUSTER_RETRY: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);

/// No cluster count was feasible; placing all movable blocks as one cluster.
pub const FLAT_FALLBACK: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);

/// Summary of a finished placement.
pub const PLACEMENT_SUMMARY: DiagnosticCode = DiagnosticCode::new(Category::Placement, 1);

/// Summary of job dispatch.
pub const DISPATCH_SUMMARY: DiagnosticCode = DiagnosticCode::new(Category::Dispatch, 1);
