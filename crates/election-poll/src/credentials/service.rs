use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::dispatch::{CredentialDispatcher, DispatchEvent, DispatchJob};
use super::key_pool::KeyUsage;
use super::transport::MailTransport;
use crate::domain::{AdminId, VoterId};
use crate::error::ApiError;
use crate::repository::{PollRepository, RepositoryError};

const DISPATCH_FAILED: &str = "Failed to send credentials";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    #[serde(default)]
    pub voter_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub message: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub key_usage_stats: Vec<KeyUsage>,
}

/// Resolves the caller's voters and hands them to the dispatcher.
pub struct CredentialService<R, T> {
    repository: Arc<R>,
    dispatcher: Arc<CredentialDispatcher<T>>,
    zone: FixedOffset,
}

impl<R, T> CredentialService<R, T>
where
    R: PollRepository + 'static,
    T: MailTransport + 'static,
{
    pub fn new(
        repository: Arc<R>,
        dispatcher: Arc<CredentialDispatcher<T>>,
        zone: FixedOffset,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            zone,
        }
    }

    /// Validate the request and assemble the job without sending anything.
    pub fn prepare(
        &self,
        caller: Option<&AdminId>,
        request: &CredentialRequest,
        now: DateTime<Utc>,
    ) -> Result<DispatchJob, ApiError> {
        let caller = caller.ok_or(ApiError::Unauthorized)?;
        let admin = self
            .repository
            .admin(caller)
            .map_err(unexpected)?
            .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

        let ids: Vec<VoterId> = match request.voter_ids.as_deref() {
            Some(ids) if !ids.is_empty() => ids.iter().cloned().map(VoterId).collect(),
            _ => return Err(ApiError::Validation("Voter IDs are required".to_string())),
        };

        let voters = self
            .repository
            .voters_by_ids(&admin.association_id, &ids)
            .map_err(unexpected)?;
        if voters.is_empty() {
            return Err(ApiError::NotFound("No voters found".to_string()));
        }

        let association = self
            .repository
            .association(&admin.association_id)
            .map_err(unexpected)?;
        let election = self
            .repository
            .latest_election(&admin.association_id)
            .map_err(unexpected)?;

        Ok(DispatchJob {
            voters,
            association,
            election_start: election.map(|election| election.start_at),
            year: now.with_timezone(&self.zone).year(),
        })
    }

    pub async fn send_batch(
        &self,
        caller: Option<&AdminId>,
        request: &CredentialRequest,
        now: DateTime<Utc>,
    ) -> Result<BatchResponse, ApiError> {
        let job = self.prepare(caller, request, now)?;
        let report = self
            .dispatcher
            .run_batch(job)
            .await
            .map_err(|err| ApiError::unexpected(DISPATCH_FAILED, err))?;

        let summary = report.summary;
        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            "credential batch finished"
        );
        Ok(BatchResponse {
            message: format!(
                "Credentials sent to {} of {} voters",
                summary.successful, summary.total
            ),
            total: summary.total,
            successful: summary.successful,
            failed: summary.failed,
            key_usage_stats: report.key_usage,
        })
    }

    /// Validation errors surface before the stream starts; afterwards
    /// everything is reported in-band.
    pub fn stream(
        &self,
        caller: Option<&AdminId>,
        request: &CredentialRequest,
        now: DateTime<Utc>,
    ) -> Result<impl Stream<Item = DispatchEvent> + Send + 'static, ApiError> {
        let job = self.prepare(caller, request, now)?;
        info!(voters = job.voters.len(), "credential stream started");
        Ok(self.dispatcher.events(job))
    }
}

fn unexpected(err: RepositoryError) -> ApiError {
    ApiError::unexpected(DISPATCH_FAILED, err)
}
