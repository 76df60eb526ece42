use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::Value;

use crate::credentials::{
    CredentialDispatcher, CredentialService, DeliveryReceipt, DispatchJob, KeyPool, MailIdentity,
    MailSettings, MailTransport, OutboundEmail, Throttle, TransportError,
};
use crate::domain::{
    AdminAccount, AdminId, AdminRole, Association, AssociationId, Election, ElectionId, Voter,
    VoterId,
};
use crate::repository::InMemoryPollRepository;

pub(super) const ADMIN_ID: &str = "admin-cs";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 27, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn zone() -> FixedOffset {
    FixedOffset::east_opt(3600).expect("valid offset")
}

pub(super) fn settings() -> MailSettings {
    MailSettings {
        sender_email: "noreply@poll.example.edu".to_string(),
        sender_name: "Election Poll".to_string(),
        login_url: "https://poll.example.edu/voter/login".to_string(),
        zone: zone(),
    }
}

pub(super) fn voter(id: &str, association_id: &str) -> Voter {
    Voter {
        id: VoterId(id.to_string()),
        email: format!("{id}@example.edu"),
        student_id: format!("STU-{id}"),
        first_name: "Voter".to_string(),
        last_name: id.to_uppercase(),
        level: Some("200".to_string()),
        password: format!("pw-{id}"),
        association_id: AssociationId(association_id.to_string()),
        has_voted: false,
        created_at: now(),
    }
}

pub(super) fn job(count: usize) -> DispatchJob {
    DispatchJob {
        voters: (1..=count)
            .map(|n| voter(&format!("v{n}"), "assoc-cs"))
            .collect(),
        association: None,
        election_start: None,
        year: 2025,
    }
}

/// Records every send; recipients listed in `reject` fail and identities
/// listed in `revoked` are refused outright.
#[derive(Default)]
pub(super) struct RecordingTransport {
    reject: HashSet<String>,
    revoked: HashSet<String>,
    sent: Mutex<Vec<(String, OutboundEmail)>>,
}

impl RecordingTransport {
    pub(super) fn rejecting(emails: &[&str]) -> Self {
        Self {
            reject: emails.iter().map(|email| email.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(super) fn revoking(keys: &[&str]) -> Self {
        Self {
            revoked: keys.iter().map(|key| key.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(super) fn sent(&self) -> Vec<(String, OutboundEmail)> {
        self.sent.lock().expect("lock").clone()
    }
}

impl MailTransport for RecordingTransport {
    fn send(
        &self,
        identity: &MailIdentity,
        email: &OutboundEmail,
    ) -> Result<DeliveryReceipt, TransportError> {
        if self.revoked.contains(identity.key()) {
            return Err(TransportError::Revoked("key disabled by provider".to_string()));
        }
        if self.reject.contains(&email.to_email) {
            return Err(TransportError::Rejected("mailbox unavailable".to_string()));
        }
        let mut sent = self.sent.lock().expect("lock");
        sent.push((identity.key().to_string(), email.clone()));
        Ok(DeliveryReceipt {
            message_id: Some(format!("msg-{}", sent.len())),
        })
    }
}

pub(super) fn dispatcher(
    transport: Arc<RecordingTransport>,
    keys: &[&str],
    quota: u32,
) -> CredentialDispatcher<RecordingTransport> {
    let pool = KeyPool::new(keys.iter().copied(), quota).expect("pool");
    CredentialDispatcher::new(
        transport,
        Arc::new(pool),
        Arc::new(Throttle::unthrottled()),
        settings(),
    )
}

pub(super) fn seeded_repository() -> Arc<InMemoryPollRepository> {
    let repository = InMemoryPollRepository::default();
    repository
        .insert_association(Association {
            id: AssociationId("assoc-cs".to_string()),
            name: "Computer Science Association".to_string(),
            logo_url: None,
        })
        .expect("association");
    repository
        .insert_admin(AdminAccount {
            id: AdminId(ADMIN_ID.to_string()),
            email: "admin@example.edu".to_string(),
            role: AdminRole::Admin,
            association_id: AssociationId("assoc-cs".to_string()),
            password_hash: String::new(),
        })
        .expect("admin");
    repository
        .insert_election(Election {
            id: ElectionId("e1".to_string()),
            title: "SRC Election 2025".to_string(),
            description: None,
            start_at: Utc
                .with_ymd_and_hms(2025, 3, 14, 8, 5, 0)
                .single()
                .expect("valid timestamp"),
            end_at: Utc
                .with_ymd_and_hms(2025, 3, 14, 18, 0, 0)
                .single()
                .expect("valid timestamp"),
            association_id: AssociationId("assoc-cs".to_string()),
            created_at: now(),
        })
        .expect("election");

    for entry in [
        voter("v1", "assoc-cs"),
        voter("v2", "assoc-cs"),
        voter("v3", "assoc-cs"),
        voter("outsider", "assoc-law"),
    ] {
        repository.insert_voter(entry).expect("voter");
    }
    Arc::new(repository)
}

pub(super) fn build_service(
    transport: Arc<RecordingTransport>,
) -> Arc<CredentialService<InMemoryPollRepository, RecordingTransport>> {
    let dispatcher = dispatcher(transport, &["xkeysib-primary-000", "xkeysib-backup-111"], 2);
    Arc::new(CredentialService::new(
        seeded_repository(),
        Arc::new(dispatcher),
        zone(),
    ))
}

pub(super) async fn read_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_str(&read_body(response).await).expect("json payload")
}
