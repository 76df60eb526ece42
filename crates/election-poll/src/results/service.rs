use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::export::{render, ExportDocument, ExportFormat, ReportContext, ReportKind};
use super::tally::{aggregate, group_by_position, PositionResult};
use crate::domain::{AdminId, ElectionId};
use crate::error::ApiError;
use crate::repository::{ElectionBundle, PollRepository};

const EXPORT_FAILED: &str = "Failed to generate export";
const RESULTS_FAILED: &str = "Failed to load results";

/// Raw query string of the export endpoint; values are validated by the service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(rename = "type")]
    pub report: Option<String>,
    pub format: Option<String>,
}

/// Association branding shown alongside public results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationBadge {
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSummary {
    pub id: ElectionId,
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub association: Option<AssociationBadge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestResultsView {
    pub election: ElectionSummary,
    pub positions: Vec<PositionResult>,
}

/// Authorizes and renders election reports.
pub struct ExportService<R> {
    repository: Arc<R>,
    zone: FixedOffset,
}

impl<R> ExportService<R>
where
    R: PollRepository + 'static,
{
    pub fn new(repository: Arc<R>, zone: FixedOffset) -> Self {
        Self { repository, zone }
    }

    /// Render one report for an election the caller administers.
    pub fn export(
        &self,
        caller: Option<&AdminId>,
        election_id: &ElectionId,
        query: &ExportQuery,
        now: DateTime<Utc>,
    ) -> Result<ExportDocument, ApiError> {
        let caller = caller.ok_or(ApiError::Unauthorized)?;

        let bundle = self
            .repository
            .election_bundle(election_id)
            .map_err(|err| ApiError::unexpected(EXPORT_FAILED, err))?
            .ok_or_else(|| ApiError::NotFound("Election not found".to_string()))?;

        self.authorize(caller, &bundle)?;

        let kind = query
            .report
            .as_deref()
            .and_then(ReportKind::parse)
            .ok_or_else(|| ApiError::Validation("Invalid export type".to_string()))?;
        let format = match query.format.as_deref() {
            None | Some("") => ExportFormat::Csv,
            Some(raw) => ExportFormat::parse(raw)
                .ok_or_else(|| ApiError::Validation("Invalid format".to_string()))?,
        };

        let voters = match kind {
            ReportKind::Voters => self
                .repository
                .voters_for_association(&bundle.election.association_id)
                .map_err(|err| ApiError::unexpected(EXPORT_FAILED, err))?,
            _ => Vec::new(),
        };

        let context = ReportContext {
            generated_at: now,
            zone: self.zone,
        };
        let document = render(kind, format, &bundle, &voters, &context)
            .map_err(|err| ApiError::unexpected(EXPORT_FAILED, err))?;

        info!(
            election = %election_id.0,
            report = kind.label(),
            format = format.extension(),
            bytes = document.bytes.len(),
            "export generated"
        );
        Ok(document)
    }

    /// Tabulated results of the most recently ended election.
    pub fn latest_results(&self, now: DateTime<Utc>) -> Result<LatestResultsView, ApiError> {
        let election = self
            .repository
            .latest_ended_election(now)
            .map_err(|err| ApiError::unexpected(RESULTS_FAILED, err))?
            .ok_or_else(|| ApiError::NotFound("No ended election found".to_string()))?;

        let bundle = self
            .repository
            .election_bundle(&election.id)
            .map_err(|err| ApiError::unexpected(RESULTS_FAILED, err))?
            .ok_or_else(|| ApiError::NotFound("Election not found".to_string()))?;

        let positions = aggregate(group_by_position(&bundle.candidates));
        let ElectionBundle {
            election,
            association,
            ..
        } = bundle;

        Ok(LatestResultsView {
            election: ElectionSummary {
                id: election.id,
                title: election.title,
                description: election.description,
                start_at: election.start_at,
                end_at: election.end_at,
                association: association.map(|association| AssociationBadge {
                    name: association.name,
                    logo_url: association.logo_url,
                }),
            },
            positions,
        })
    }

    fn authorize(&self, caller: &AdminId, bundle: &ElectionBundle) -> Result<(), ApiError> {
        let admin = self
            .repository
            .admin(caller)
            .map_err(|err| ApiError::unexpected(EXPORT_FAILED, err))?;

        match admin {
            Some(admin) if admin.administers(&bundle.election.association_id) => Ok(()),
            _ => {
                warn!(
                    caller = %caller.0,
                    association = %bundle.election.association_id.0,
                    "export permission denied"
                );
                Err(ApiError::Forbidden("Insufficient permissions".to_string()))
            }
        }
    }
}
