use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::Value;

use crate::domain::{
    AdminAccount, AdminId, AdminRole, Association, AssociationId, Candidate, CandidateId,
    Election, ElectionId, Position, PositionId, Vote, VoteId, Voter, VoterId,
};
use crate::repository::{
    ElectionBundle, InMemoryPollRepository, PollRepository, RepositoryError,
};
use crate::results::{results_router, ExportService};

pub(super) const ELECTION_ID: &str = "election-2025";
pub(super) const ADMIN_ID: &str = "admin-cs";
pub(super) const FOREIGN_ADMIN_ID: &str = "admin-law";

pub(super) fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn now() -> DateTime<Utc> {
    at(3, 5, 12)
}

pub(super) fn zone() -> FixedOffset {
    FixedOffset::east_opt(3600).expect("valid offset")
}

fn association(id: &str, name: &str) -> Association {
    Association {
        id: AssociationId(id.to_string()),
        name: name.to_string(),
        logo_url: Some(format!("https://cdn.example.edu/{id}.png")),
    }
}

fn admin(id: &str, association_id: &str) -> AdminAccount {
    AdminAccount {
        id: AdminId(id.to_string()),
        email: format!("{id}@example.edu"),
        role: AdminRole::Admin,
        association_id: AssociationId(association_id.to_string()),
        password_hash: String::new(),
    }
}

fn position(id: &str, name: &str, order: i32) -> Position {
    Position {
        id: PositionId(id.to_string()),
        name: name.to_string(),
        order,
        association_id: AssociationId("assoc-cs".to_string()),
    }
}

fn candidate(id: &str, name: &str, position_id: &str) -> Candidate {
    Candidate {
        id: CandidateId(id.to_string()),
        name: name.to_string(),
        photo_url: None,
        manifesto: None,
        position_id: PositionId(position_id.to_string()),
        election_id: ElectionId(ELECTION_ID.to_string()),
        created_at: at(2, 21, 9),
    }
}

pub(super) fn voter(id: &str, email: &str, has_voted: bool) -> Voter {
    Voter {
        id: VoterId(id.to_string()),
        email: email.to_string(),
        student_id: format!("CS/{id}"),
        first_name: "Test".to_string(),
        last_name: id.to_uppercase(),
        level: None,
        password: "one-time".to_string(),
        association_id: AssociationId("assoc-cs".to_string()),
        has_voted,
        created_at: at(2, 25, 10),
    }
}

/// President: ada 3, grace 1, linus 0. Secretary: ken 2, dennis 2.
pub(super) fn seeded_repository() -> Arc<InMemoryPollRepository> {
    let repository = InMemoryPollRepository::default();

    repository
        .insert_association(association("assoc-cs", "Computer Science Association"))
        .expect("association");
    repository
        .insert_association(association("assoc-law", "Law Society"))
        .expect("association");
    repository
        .insert_admin(admin(ADMIN_ID, "assoc-cs"))
        .expect("admin");
    repository
        .insert_admin(admin(FOREIGN_ADMIN_ID, "assoc-law"))
        .expect("admin");

    repository
        .insert_election(Election {
            id: ElectionId(ELECTION_ID.to_string()),
            title: "SRC Election 2025".to_string(),
            description: Some("Annual executive election".to_string()),
            start_at: at(3, 1, 8),
            end_at: at(3, 2, 18),
            association_id: AssociationId("assoc-cs".to_string()),
            created_at: at(2, 20, 9),
        })
        .expect("election");

    // stored out of display order on purpose
    repository
        .insert_position(position("secretary", "Secretary", 2))
        .expect("position");
    repository
        .insert_position(position("president", "President", 1))
        .expect("position");

    for (id, name, position_id) in [
        ("ken", "Ken Thompson", "secretary"),
        ("dennis", "Dennis Ritchie", "secretary"),
        ("grace", "Grace Hopper", "president"),
        ("ada", "Ada Lovelace", "president"),
        ("linus", "Linus Torvalds", "president"),
    ] {
        let mut entry = candidate(id, name, position_id);
        if id == "linus" {
            entry.manifesto = Some("manifestos/linus.pdf".to_string());
        }
        repository.insert_candidate(entry).expect("candidate");
    }

    let ballots = [
        ("ada", 3),
        ("grace", 1),
        ("ken", 2),
        ("dennis", 2),
    ];
    let mut sequence = 0;
    for (candidate_id, count) in ballots {
        for _ in 0..count {
            sequence += 1;
            repository
                .insert_vote(Vote {
                    id: VoteId(format!("vote-{sequence}")),
                    voter_id: VoterId(format!("v{sequence}")),
                    candidate_id: CandidateId(candidate_id.to_string()),
                    election_id: ElectionId(ELECTION_ID.to_string()),
                })
                .expect("vote");
        }
    }

    for entry in [
        voter("v2", "zara@example.edu", false),
        voter("v1", "amos@example.edu", true),
        voter("v3", "mina@example.edu", true),
    ] {
        repository.insert_voter(entry).expect("voter");
    }

    Arc::new(repository)
}

pub(super) fn build_service() -> (
    Arc<ExportService<InMemoryPollRepository>>,
    Arc<InMemoryPollRepository>,
) {
    let repository = seeded_repository();
    let service = Arc::new(ExportService::new(repository.clone(), zone()));
    (service, repository)
}

pub(super) fn router() -> axum::Router {
    let (service, _) = build_service();
    results_router(service)
}

pub(super) struct UnavailableRepository;

impl PollRepository for UnavailableRepository {
    fn election_bundle(&self, _id: &ElectionId) -> Result<Option<ElectionBundle>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn voters_for_association(
        &self,
        _association_id: &AssociationId,
    ) -> Result<Vec<Voter>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn voters_by_ids(
        &self,
        _association_id: &AssociationId,
        _ids: &[VoterId],
    ) -> Result<Vec<Voter>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn admin(&self, _id: &AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn admin_by_email(&self, _email: &str) -> Result<Option<AdminAccount>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn association(&self, _id: &AssociationId) -> Result<Option<Association>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_election(
        &self,
        _association_id: &AssociationId,
    ) -> Result<Option<Election>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_ended_election(
        &self,
        _now: DateTime<Utc>,
    ) -> Result<Option<Election>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_admin_role(
        &self,
        _id: &AdminId,
        _role: AdminRole,
    ) -> Result<AdminAccount, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_admin(&self, _admin: AdminAccount) -> Result<AdminAccount, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_bytes(response).await;
    serde_json::from_slice(&body).expect("json payload")
}
