use chrono::{DateTime, Duration, Utc};
use election_poll::admin::{hash_password, AdminService};
use election_poll::config::{AppConfig, AppEnvironment};
use election_poll::credentials::{
    CredentialDispatcher, CredentialService, DeliveryReceipt, KeyPool, MailIdentity, MailSettings,
    MailTransport, OutboundEmail, Throttle, TransportError,
};
use election_poll::domain::{
    AdminAccount, AdminId, AdminRole, Association, AssociationId, Candidate, CandidateId,
    Election, ElectionId, Position, PositionId, Vote, VoteId, Voter, VoterId,
};
use election_poll::error::AppError;
use election_poll::repository::InMemoryPollRepository;
use election_poll::results::ExportService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) const DEMO_ELECTION_ID: &str = "election-demo";
pub(crate) const DEMO_ADMIN_ID: &str = "admin-demo";
pub(crate) const DEMO_ASSOCIATION_ID: &str = "assoc-demo";
pub(crate) const DEMO_ADMIN_PASSWORD: &str = "returning-officer";
const LOCAL_MAIL_KEY: &str = "local-dev-key";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes each message to the log instead of a mail provider.
#[derive(Debug, Default)]
pub(crate) struct LoggingMailTransport {
    sequence: AtomicU64,
}

impl MailTransport for LoggingMailTransport {
    fn send(
        &self,
        identity: &MailIdentity,
        email: &OutboundEmail,
    ) -> Result<DeliveryReceipt, TransportError> {
        if !email.to_email.contains('@') {
            return Err(TransportError::Rejected(format!(
                "invalid recipient address '{}'",
                email.to_email
            )));
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            identity = %identity.label(),
            to = %email.to_email,
            subject = %email.subject,
            sequence,
            "credential email logged"
        );
        Ok(DeliveryReceipt {
            message_id: Some(format!("local-{sequence}")),
        })
    }
}

pub(crate) type Repository = InMemoryPollRepository;

pub(crate) struct Services {
    pub(crate) export: Arc<ExportService<Repository>>,
    pub(crate) credentials: Arc<CredentialService<Repository, LoggingMailTransport>>,
    pub(crate) admin: Arc<AdminService<Repository>>,
}

impl Services {
    pub(crate) fn build(
        config: &AppConfig,
        repository: Arc<Repository>,
        transport: Arc<LoggingMailTransport>,
    ) -> Result<Self, AppError> {
        let zone = config.display_offset;
        let dispatcher = CredentialDispatcher::new(
            transport,
            Arc::new(key_pool(config)?),
            Arc::new(Throttle::new(1, config.mail.send_interval)),
            MailSettings::from_config(&config.mail, zone),
        );

        Ok(Self {
            export: Arc::new(ExportService::new(Arc::clone(&repository), zone)),
            credentials: Arc::new(CredentialService::new(
                Arc::clone(&repository),
                Arc::new(dispatcher),
                zone,
            )),
            admin: Arc::new(AdminService::new(repository)),
        })
    }
}

/// Production requires configured keys; other environments fall back to a local identity.
pub(crate) fn key_pool(config: &AppConfig) -> Result<KeyPool, AppError> {
    let mut keys = config.mail.api_keys.clone();
    if keys.is_empty() && config.environment != AppEnvironment::Production {
        warn!("MAIL_API_KEYS is empty; using a local mail identity");
        keys.push(LOCAL_MAIL_KEY.to_string());
    }
    Ok(KeyPool::new(keys, config.mail.quota_per_key)?)
}

/// Seed one ended election with a decided, a tied and an unvoted position.
pub(crate) fn seed_demo(repository: &Repository, now: DateTime<Utc>) -> Result<(), AppError> {
    let association_id = AssociationId(DEMO_ASSOCIATION_ID.to_string());
    let election_id = ElectionId(DEMO_ELECTION_ID.to_string());
    let start_at = now - Duration::days(2);
    let end_at = now - Duration::days(1);

    repository.insert_association(Association {
        id: association_id.clone(),
        name: "Students' Representative Council".to_string(),
        logo_url: None,
    })?;
    repository.insert_admin(AdminAccount {
        id: AdminId(DEMO_ADMIN_ID.to_string()),
        email: "returning.officer@poll.local".to_string(),
        role: AdminRole::SuperAdmin,
        association_id: association_id.clone(),
        password_hash: hash_password(DEMO_ADMIN_PASSWORD)?,
    })?;
    repository.insert_election(Election {
        id: election_id.clone(),
        title: "SRC General Election".to_string(),
        description: Some("Annual executive council election".to_string()),
        start_at,
        end_at,
        association_id: association_id.clone(),
        created_at: start_at - Duration::days(7),
    })?;

    let positions = [
        ("pos-president", "President", 1),
        ("pos-secretary", "General Secretary", 2),
        ("pos-treasurer", "Treasurer", 3),
    ];
    for (id, name, order) in positions {
        repository.insert_position(Position {
            id: PositionId(id.to_string()),
            name: name.to_string(),
            order,
            association_id: association_id.clone(),
        })?;
    }

    let candidates = [
        ("cand-amara", "Amara Okafor", "pos-president"),
        ("cand-tunde", "Tunde Bello", "pos-president"),
        ("cand-ife", "Ife Adeyemi", "pos-secretary"),
        ("cand-kofi", "Kofi Mensah", "pos-secretary"),
        ("cand-zainab", "Zainab Musa", "pos-treasurer"),
    ];
    for (id, name, position) in candidates {
        repository.insert_candidate(Candidate {
            id: CandidateId(id.to_string()),
            name: name.to_string(),
            photo_url: None,
            manifesto: None,
            position_id: PositionId(position.to_string()),
            election_id: election_id.clone(),
            created_at: start_at - Duration::days(3),
        })?;
    }

    let voters = [
        ("voter-1", "chidi.eze", "Chidi", "Eze", "300"),
        ("voter-2", "ngozi.obi", "Ngozi", "Obi", "200"),
        ("voter-3", "sola.ade", "Sola", "Ade", "400"),
        ("voter-4", "musa.bala", "Musa", "Bala", "100"),
        ("voter-5", "efe.ogun", "Efe", "Ogun", "300"),
    ];
    for (index, (id, handle, first_name, last_name, level)) in voters.into_iter().enumerate() {
        repository.insert_voter(Voter {
            id: VoterId(id.to_string()),
            email: format!("{handle}@students.poll.local"),
            student_id: format!("SRC/{:04}", index + 1),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            level: Some(level.to_string()),
            password: format!("demo-{:04}", (index + 1) * 37),
            association_id: association_id.clone(),
            has_voted: index < 4,
            created_at: start_at - Duration::days(5),
        })?;
    }

    let ballots = [
        ("voter-1", "cand-amara"),
        ("voter-2", "cand-amara"),
        ("voter-3", "cand-amara"),
        ("voter-4", "cand-tunde"),
        ("voter-1", "cand-ife"),
        ("voter-2", "cand-kofi"),
        ("voter-3", "cand-ife"),
        ("voter-4", "cand-kofi"),
    ];
    for (index, (voter, candidate)) in ballots.into_iter().enumerate() {
        repository.insert_vote(Vote {
            id: VoteId(format!("vote-{}", index + 1)),
            voter_id: VoterId(voter.to_string()),
            candidate_id: CandidateId(candidate.to_string()),
            election_id: election_id.clone(),
        })?;
    }

    Ok(())
}
