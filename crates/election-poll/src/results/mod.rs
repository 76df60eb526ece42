//! Result tabulation, report export and the public results view.

pub mod export;
pub mod router;
pub mod service;
pub mod tally;

#[cfg(test)]
mod tests;

pub use export::{ExportDocument, ExportError, ExportFormat, ReportContext, ReportKind};
pub use router::results_router;
pub use service::{ElectionSummary, ExportQuery, ExportService, LatestResultsView};
pub use tally::{aggregate, group_by_position, CandidateStanding, PositionOutcome, PositionResult};
