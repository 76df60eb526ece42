//! Report rendering: one entry point, two encodings, three report kinds.

mod delimited;
mod metrics;
mod paginated;
pub mod pdf;

use chrono::{DateTime, FixedOffset, Utc};
use mime::Mime;

use crate::domain::Voter;
use crate::repository::ElectionBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Results,
    Voters,
    Candidates,
}

impl ReportKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "results" => Some(Self::Results),
            "voters" => Some(Self::Voters),
            "candidates" => Some(Self::Candidates),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Results => "Results",
            Self::Voters => "Voters",
            Self::Candidates => "Candidates",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn content_type(self) -> Mime {
        match self {
            Self::Csv => mime::TEXT_CSV,
            Self::Pdf => mime::APPLICATION_PDF,
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }
}

/// Clock and display zone used for every timestamp in a report.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext {
    pub generated_at: DateTime<Utc>,
    pub zone: FixedOffset,
}

/// A finished export ready to be written to disk or streamed to a client.
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub bytes: Vec<u8>,
    pub content_type: Mime,
    pub filename: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("report text is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Render `kind` for the bundle. `voters` is only read for [`ReportKind::Voters`].
pub fn render(
    kind: ReportKind,
    format: ExportFormat,
    bundle: &ElectionBundle,
    voters: &[Voter],
    context: &ReportContext,
) -> Result<ExportDocument, ExportError> {
    let bytes = match (format, kind) {
        (ExportFormat::Csv, ReportKind::Results) => delimited::results(bundle, context)?,
        (ExportFormat::Csv, ReportKind::Voters) => delimited::voters(voters, context)?,
        (ExportFormat::Csv, ReportKind::Candidates) => delimited::candidates(bundle, context)?,
        (ExportFormat::Pdf, ReportKind::Results) => paginated::results(bundle, context),
        (ExportFormat::Pdf, ReportKind::Voters) => {
            paginated::voters(voters, &bundle.election, context)
        }
        (ExportFormat::Pdf, ReportKind::Candidates) => paginated::candidates(bundle, context),
    };

    Ok(ExportDocument {
        bytes,
        content_type: format.content_type(),
        filename: export_filename(&bundle.election.title, kind, format),
    })
}

/// `<Title>_<Kind>.<ext>`, reduced to characters that are safe inside a quoted header value.
pub fn export_filename(title: &str, kind: ReportKind, format: ExportFormat) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    let stem = if stem.is_empty() { "Election" } else { stem.as_str() };
    format!("{}_{}.{}", stem, kind.label(), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_known_values() {
        assert_eq!(ReportKind::parse("results"), Some(ReportKind::Results));
        assert_eq!(ReportKind::parse("ballots"), None);
        assert_eq!(ExportFormat::parse("pdf"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::parse("xlsx"), None);
    }

    #[test]
    fn filename_keeps_title_and_strips_header_breakers() {
        assert_eq!(
            export_filename("SUG Election 2025", ReportKind::Results, ExportFormat::Pdf),
            "SUG Election 2025_Results.pdf"
        );
        assert_eq!(
            export_filename("The \"Big\" Vote/Ré", ReportKind::Voters, ExportFormat::Csv),
            "The _Big_ Vote_R__Voters.csv"
        );
        assert_eq!(
            export_filename("  ", ReportKind::Candidates, ExportFormat::Csv),
            "Election_Candidates.csv"
        );
    }

    #[test]
    fn content_types_match_format() {
        assert_eq!(ExportFormat::Csv.content_type().as_ref(), "text/csv");
        assert_eq!(ExportFormat::Pdf.content_type().as_ref(), "application/pdf");
    }
}
