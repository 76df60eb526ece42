use crate::infra::{
    seed_demo, LoggingMailTransport, Repository, Services, DEMO_ADMIN_ID, DEMO_ASSOCIATION_ID,
    DEMO_ELECTION_ID,
};
use chrono::Utc;
use clap::Args;
use election_poll::config::AppConfig;
use election_poll::credentials::CredentialRequest;
use election_poll::domain::{AdminId, AssociationId, ElectionId};
use election_poll::error::AppError;
use election_poll::repository::PollRepository;
use election_poll::results::tally::format_percentage;
use election_poll::results::{ExportQuery, LatestResultsView, PositionOutcome};
use election_poll::telemetry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Report to render
    #[arg(long, value_parser = ["results", "voters", "candidates"])]
    pub(crate) report: String,
    /// Output encoding; guessed from the output extension when omitted
    #[arg(long, value_parser = ["csv", "pdf"])]
    pub(crate) format: Option<String>,
    /// Destination file
    #[arg(long)]
    pub(crate) output: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Only send credentials to the first N seeded voters.
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Skip the credential dispatch portion of the demo.
    #[arg(long)]
    pub(crate) skip_dispatch: bool,
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        report,
        format,
        output,
    } = args;

    let config = AppConfig::load()?;
    let now = Utc::now();
    let repository = Arc::new(Repository::default());
    seed_demo(&repository, now)?;
    let services = Services::build(
        &config,
        repository,
        Arc::new(LoggingMailTransport::default()),
    )?;

    let query = ExportQuery {
        report: Some(report),
        format: format.or_else(|| guess_format(&output)),
    };
    let document = services.export.export(
        Some(&AdminId(DEMO_ADMIN_ID.to_string())),
        &ElectionId(DEMO_ELECTION_ID.to_string()),
        &query,
        now,
    )?;

    std::fs::write(&output, &document.bytes)?;
    println!(
        "Wrote {} ({} bytes, {}) to {}",
        document.filename,
        document.bytes.len(),
        document.content_type,
        output.display()
    );
    Ok(())
}

/// Unknown extensions are passed through so the export reports them as invalid.
fn guess_format(output: &Path) -> Option<String> {
    let guessed = mime_guess::from_path(output).first();
    match guessed.as_ref().map(|mime| mime.essence_str()) {
        Some("text/csv") => Some("csv".to_string()),
        Some("application/pdf") => Some("pdf".to_string()),
        _ => output
            .extension()
            .map(|extension| extension.to_string_lossy().to_ascii_lowercase()),
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        limit,
        skip_dispatch,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let now = Utc::now();
    let repository = Arc::new(Repository::default());
    seed_demo(&repository, now)?;
    let services = Services::build(
        &config,
        Arc::clone(&repository),
        Arc::new(LoggingMailTransport::default()),
    )?;

    println!("Election poll demo");
    let view = services.export.latest_results(now)?;
    render_results(&view);

    if skip_dispatch {
        return Ok(());
    }

    let voters =
        repository.voters_for_association(&AssociationId(DEMO_ASSOCIATION_ID.to_string()))?;
    let voter_ids = voters
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|voter| voter.id.0)
        .collect();
    let request = CredentialRequest {
        voter_ids: Some(voter_ids),
    };

    println!("\nCredential dispatch");
    let response = services
        .credentials
        .send_batch(Some(&AdminId(DEMO_ADMIN_ID.to_string())), &request, now)
        .await?;
    println!(
        "- {} (successful: {}, failed: {})",
        response.message, response.successful, response.failed
    );
    for usage in &response.key_usage_stats {
        println!("  {}: {}/{}", usage.key, usage.usage, usage.limit);
    }

    Ok(())
}

fn render_results(view: &LatestResultsView) {
    let election = &view.election;
    println!("{}", election.title);
    if let Some(association) = &election.association {
        println!("Association: {}", association.name);
    }

    for position in &view.positions {
        let outcome = match &position.outcome {
            PositionOutcome::NoVotes => "no votes cast",
            PositionOutcome::Decided { .. } => "decided",
            PositionOutcome::Tied { .. } => "tied",
        };
        println!(
            "\n{} ({} votes, {})",
            position.name, position.total_votes, outcome
        );
        for candidate in &position.candidates {
            let status = position.status_label(&candidate.id);
            println!(
                "  #{} {:<20} {:>3}  {:>8}  {}",
                candidate.rank,
                candidate.name,
                candidate.votes,
                format_percentage(candidate.percentage),
                status
            );
        }
    }
}
