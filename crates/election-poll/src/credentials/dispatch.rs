use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::key_pool::{KeyPool, KeyUsage};
use super::notice::{render_notice, NoticeContext};
use super::throttle::Throttle;
use super::transport::{MailTransport, OutboundEmail, TransportError};
use crate::config::MailConfig;
use crate::domain::{Association, Voter, VoterId};

/// Sender identity and links stamped on every credential email.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub sender_email: String,
    pub sender_name: String,
    pub login_url: String,
    pub zone: FixedOffset,
}

impl MailSettings {
    pub fn from_config(config: &MailConfig, zone: FixedOffset) -> Self {
        Self {
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
            login_url: config.login_url.clone(),
            zone,
        }
    }
}

/// Voters to notify plus the association details shown in the notice.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub voters: Vec<Voter>,
    pub association: Option<Association>,
    pub election_start: Option<DateTime<Utc>>,
    pub year: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// 1-based position within the job.
    pub index: usize,
    pub total: usize,
    pub voter_id: VoterId,
    pub email: String,
    pub status: DeliveryStatus,
    pub message: String,
    pub key: String,
}

/// One line of the progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DispatchEvent {
    Progress {
        status: DeliveryStatus,
        message: String,
    },
    Summary {
        total: usize,
        successful: usize,
        failed: usize,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl DispatchSummary {
    fn record(&mut self, outcome: &DeliveryOutcome) {
        self.total += 1;
        match outcome.status {
            DeliveryStatus::Success => self.successful += 1,
            _ => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub summary: DispatchSummary,
    pub deliveries: Vec<DeliveryOutcome>,
    pub key_usage: Vec<KeyUsage>,
}

/// Failures that stop a dispatch outright; per-voter failures never do.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("mail identity {key} was revoked: {reason}")]
    IdentityRevoked { key: String, reason: String },
}

/// Sends credential notices through the shared key pool and throttle.
pub struct CredentialDispatcher<T> {
    transport: Arc<T>,
    pool: Arc<KeyPool>,
    throttle: Arc<Throttle>,
    settings: MailSettings,
}

impl<T> CredentialDispatcher<T>
where
    T: MailTransport + 'static,
{
    pub fn new(
        transport: Arc<T>,
        pool: Arc<KeyPool>,
        throttle: Arc<Throttle>,
        settings: MailSettings,
    ) -> Self {
        Self {
            transport,
            pool,
            throttle,
            settings,
        }
    }

    /// Lazy, forward-only sequence of per-voter results.
    ///
    /// Nothing is sent until the stream is polled; dropping it cancels the
    /// remaining sends. A revoked identity is yielded once and ends the stream.
    pub fn outcomes(
        &self,
        job: DispatchJob,
    ) -> impl Stream<Item = Result<DeliveryOutcome, DispatchError>> + Send + 'static {
        let notice = NoticeContext {
            association_name: job.association.as_ref().map(|a| a.name.clone()),
            logo_url: job.association.as_ref().and_then(|a| a.logo_url.clone()),
            login_url: self.settings.login_url.clone(),
            election_start: job.election_start,
            zone: self.settings.zone,
            year: job.year,
        };
        let total = job.voters.len();
        let sender = Sender {
            transport: Arc::clone(&self.transport),
            pool: Arc::clone(&self.pool),
            settings: self.settings.clone(),
            notice,
            total,
        };
        let throttle = Arc::clone(&self.throttle);
        let queue = job.voters.into_iter().enumerate();

        stream::unfold(Some((sender, throttle, queue)), |state| async move {
            let (sender, throttle, mut queue) = state?;
            let (position, voter) = queue.next()?;

            throttle.acquire().await;
            match sender.deliver(position + 1, voter).await {
                Ok(outcome) => Some((Ok(outcome), Some((sender, throttle, queue)))),
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    /// Send everything and return the aggregate counts.
    pub async fn run_batch(&self, job: DispatchJob) -> Result<DispatchReport, DispatchError> {
        let mut outcomes = Box::pin(self.outcomes(job));
        let mut summary = DispatchSummary::default();
        let mut deliveries = Vec::new();

        while let Some(outcome) = outcomes.next().await {
            let outcome = outcome?;
            summary.record(&outcome);
            deliveries.push(outcome);
        }

        Ok(DispatchReport {
            summary,
            deliveries,
            key_usage: self.pool.usage_stats(),
        })
    }

    /// Progress events: a pending and a final event per voter, then a summary.
    pub fn events(&self, job: DispatchJob) -> impl Stream<Item = DispatchEvent> + Send + 'static {
        let total = job.voters.len();
        let previews: VecDeque<String> = job
            .voters
            .iter()
            .enumerate()
            .map(|(position, voter)| {
                format!(
                    "[{}/{}] Preparing email for {} ({})...",
                    position + 1,
                    total,
                    voter.first_name,
                    voter.email
                )
            })
            .collect();

        let state = EventState {
            outcomes: Box::pin(self.outcomes(job)),
            previews,
            summary: DispatchSummary::default(),
            awaiting: false,
            finished: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }

            if !state.awaiting {
                return match state.previews.pop_front() {
                    Some(message) => {
                        state.awaiting = true;
                        let event = DispatchEvent::Progress {
                            status: DeliveryStatus::Pending,
                            message,
                        };
                        Some((event, state))
                    }
                    None => {
                        state.finished = true;
                        Some((state.summary_event(), state))
                    }
                };
            }

            state.awaiting = false;
            match state.outcomes.next().await {
                Some(Ok(outcome)) => {
                    state.summary.record(&outcome);
                    let event = DispatchEvent::Progress {
                        status: outcome.status,
                        message: outcome.message,
                    };
                    Some((event, state))
                }
                Some(Err(err)) => {
                    state.finished = true;
                    let event = DispatchEvent::Error {
                        message: err.to_string(),
                    };
                    Some((event, state))
                }
                None => {
                    state.finished = true;
                    Some((state.summary_event(), state))
                }
            }
        })
    }
}

type OutcomeStream = Pin<Box<dyn Stream<Item = Result<DeliveryOutcome, DispatchError>> + Send>>;

struct EventState {
    outcomes: OutcomeStream,
    previews: VecDeque<String>,
    summary: DispatchSummary,
    awaiting: bool,
    finished: bool,
}

impl EventState {
    fn summary_event(&self) -> DispatchEvent {
        DispatchEvent::Summary {
            total: self.summary.total,
            successful: self.summary.successful,
            failed: self.summary.failed,
        }
    }
}

struct Sender<T> {
    transport: Arc<T>,
    pool: Arc<KeyPool>,
    settings: MailSettings,
    notice: NoticeContext,
    total: usize,
}

impl<T> Sender<T>
where
    T: MailTransport + 'static,
{
    async fn deliver(&self, index: usize, voter: Voter) -> Result<DeliveryOutcome, DispatchError> {
        let lease = self.pool.checkout();
        let identity = lease.identity().clone();
        let key = identity.label();

        let rendered = render_notice(&voter, &self.notice);
        let email = OutboundEmail {
            to_email: voter.email.clone(),
            to_name: voter.full_name(),
            sender_email: self.settings.sender_email.clone(),
            sender_name: self.settings.sender_name.clone(),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
        };

        let transport = Arc::clone(&self.transport);
        let result = tokio::task::spawn_blocking(move || transport.send(&identity, &email))
            .await
            .unwrap_or_else(|join| Err(TransportError::Unavailable(join.to_string())));
        self.pool.settle(&lease, result.is_ok());

        let (status, message) = match result {
            Ok(receipt) => {
                debug!(
                    voter = %voter.id.0,
                    key = %key,
                    message_id = receipt.message_id.as_deref().unwrap_or("-"),
                    "credential email sent"
                );
                (
                    DeliveryStatus::Success,
                    format!("[{}/{}] Sent successfully to {}", index, self.total, voter.email),
                )
            }
            Err(TransportError::Revoked(reason)) => {
                error!(voter = %voter.id.0, key = %key, %reason, "mail identity revoked, stopping dispatch");
                return Err(DispatchError::IdentityRevoked { key, reason });
            }
            Err(err) => {
                warn!(voter = %voter.id.0, key = %key, error = %err, "credential email failed");
                (
                    DeliveryStatus::Error,
                    format!("[{}/{}] Failed: {} - {}", index, self.total, voter.email, err),
                )
            }
        };

        Ok(DeliveryOutcome {
            index,
            total: self.total,
            voter_id: voter.id,
            email: voter.email,
            status,
            message,
            key,
        })
    }
}
