//! Storage seam shared by the export, credential and admin services.

mod memory;

pub use memory::InMemoryPollRepository;

use chrono::{DateTime, Utc};

use crate::domain::{
    AdminAccount, AdminId, AdminRole, Association, AssociationId, Candidate, Election,
    ElectionId, Position, Vote, Voter, VoterId,
};

/// Candidate joined with its position and the number of votes it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    pub candidate: Candidate,
    pub position: Position,
    pub vote_count: u64,
}

/// Everything a report needs about one election.
#[derive(Debug, Clone)]
pub struct ElectionBundle {
    pub election: Election,
    pub association: Option<Association>,
    /// Ordered by ascending position order, then insertion.
    pub candidates: Vec<CandidateEntry>,
    pub votes: Vec<Vote>,
}

impl ElectionBundle {
    pub fn association_name(&self) -> &str {
        self.association
            .as_ref()
            .map(|association| association.name.as_str())
            .unwrap_or("N/A")
    }

    pub fn total_votes(&self) -> usize {
        self.votes.len()
    }
}

/// Storage abstraction so the services can be exercised in isolation.
pub trait PollRepository: Send + Sync {
    fn election_bundle(&self, id: &ElectionId) -> Result<Option<ElectionBundle>, RepositoryError>;
    /// Voters of the association, sorted by email ascending.
    fn voters_for_association(
        &self,
        association_id: &AssociationId,
    ) -> Result<Vec<Voter>, RepositoryError>;
    /// Voters matching `ids` that belong to the association, in request order.
    fn voters_by_ids(
        &self,
        association_id: &AssociationId,
        ids: &[VoterId],
    ) -> Result<Vec<Voter>, RepositoryError>;
    fn admin(&self, id: &AdminId) -> Result<Option<AdminAccount>, RepositoryError>;
    fn admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, RepositoryError>;
    fn association(&self, id: &AssociationId) -> Result<Option<Association>, RepositoryError>;
    /// Most recently created election of the association.
    fn latest_election(
        &self,
        association_id: &AssociationId,
    ) -> Result<Option<Election>, RepositoryError>;
    /// Election with the greatest end time strictly before `now`.
    fn latest_ended_election(&self, now: DateTime<Utc>)
        -> Result<Option<Election>, RepositoryError>;
    fn update_admin_role(
        &self,
        id: &AdminId,
        role: AdminRole,
    ) -> Result<AdminAccount, RepositoryError>;
    /// Replace the stored account with the same id.
    fn update_admin(&self, admin: AdminAccount) -> Result<AdminAccount, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
