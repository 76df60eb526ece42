use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{CandidateEntry, ElectionBundle, PollRepository, RepositoryError};
use crate::domain::{
    AdminAccount, AdminId, AdminRole, Association, AssociationId, Candidate, CandidateId,
    Election, ElectionId, Position, PositionId, Vote, Voter, VoterId,
};

#[derive(Debug, Default)]
struct PollStore {
    associations: Vec<Association>,
    elections: Vec<Election>,
    positions: Vec<Position>,
    candidates: Vec<Candidate>,
    votes: Vec<Vote>,
    voters: Vec<Voter>,
    admins: Vec<AdminAccount>,
}

/// Process-local repository used by the service binary and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPollRepository {
    store: Arc<Mutex<PollStore>>,
}

impl InMemoryPollRepository {
    fn lock(&self) -> Result<MutexGuard<'_, PollStore>, RepositoryError> {
        self.store
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }

    pub fn insert_association(&self, association: Association) -> Result<(), RepositoryError> {
        self.lock()?.associations.push(association);
        Ok(())
    }

    pub fn insert_election(&self, election: Election) -> Result<(), RepositoryError> {
        self.lock()?.elections.push(election);
        Ok(())
    }

    pub fn insert_position(&self, position: Position) -> Result<(), RepositoryError> {
        self.lock()?.positions.push(position);
        Ok(())
    }

    pub fn insert_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError> {
        self.lock()?.candidates.push(candidate);
        Ok(())
    }

    pub fn insert_vote(&self, vote: Vote) -> Result<(), RepositoryError> {
        self.lock()?.votes.push(vote);
        Ok(())
    }

    pub fn insert_voter(&self, voter: Voter) -> Result<(), RepositoryError> {
        self.lock()?.voters.push(voter);
        Ok(())
    }

    pub fn insert_admin(&self, admin: AdminAccount) -> Result<(), RepositoryError> {
        self.lock()?.admins.push(admin);
        Ok(())
    }
}

impl PollRepository for InMemoryPollRepository {
    fn election_bundle(&self, id: &ElectionId) -> Result<Option<ElectionBundle>, RepositoryError> {
        let store = self.lock()?;
        let Some(election) = store.elections.iter().find(|e| &e.id == id).cloned() else {
            return Ok(None);
        };

        let association = store
            .associations
            .iter()
            .find(|a| a.id == election.association_id)
            .cloned();

        let votes: Vec<Vote> = store
            .votes
            .iter()
            .filter(|vote| &vote.election_id == id)
            .cloned()
            .collect();

        let mut counts: HashMap<&CandidateId, u64> = HashMap::new();
        for vote in &votes {
            *counts.entry(&vote.candidate_id).or_insert(0) += 1;
        }

        let positions: HashMap<&PositionId, &Position> =
            store.positions.iter().map(|p| (&p.id, p)).collect();

        let mut candidates: Vec<CandidateEntry> = store
            .candidates
            .iter()
            .filter(|candidate| &candidate.election_id == id)
            .filter_map(|candidate| {
                positions.get(&candidate.position_id).map(|position| CandidateEntry {
                    candidate: candidate.clone(),
                    position: (*position).clone(),
                    vote_count: counts.get(&candidate.id).copied().unwrap_or(0),
                })
            })
            .collect();
        candidates.sort_by_key(|entry| entry.position.order);

        Ok(Some(ElectionBundle {
            election,
            association,
            candidates,
            votes,
        }))
    }

    fn voters_for_association(
        &self,
        association_id: &AssociationId,
    ) -> Result<Vec<Voter>, RepositoryError> {
        let store = self.lock()?;
        let mut voters: Vec<Voter> = store
            .voters
            .iter()
            .filter(|voter| &voter.association_id == association_id)
            .cloned()
            .collect();
        voters.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(voters)
    }

    fn voters_by_ids(
        &self,
        association_id: &AssociationId,
        ids: &[VoterId],
    ) -> Result<Vec<Voter>, RepositoryError> {
        let store = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                store
                    .voters
                    .iter()
                    .find(|voter| &voter.id == id && &voter.association_id == association_id)
                    .cloned()
            })
            .collect())
    }

    fn admin(&self, id: &AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
        let store = self.lock()?;
        Ok(store.admins.iter().find(|admin| &admin.id == id).cloned())
    }

    fn admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, RepositoryError> {
        let store = self.lock()?;
        Ok(store.admins.iter().find(|admin| admin.email == email).cloned())
    }

    fn association(&self, id: &AssociationId) -> Result<Option<Association>, RepositoryError> {
        let store = self.lock()?;
        Ok(store.associations.iter().find(|a| &a.id == id).cloned())
    }

    fn latest_election(
        &self,
        association_id: &AssociationId,
    ) -> Result<Option<Election>, RepositoryError> {
        let store = self.lock()?;
        Ok(store
            .elections
            .iter()
            .filter(|election| &election.association_id == association_id)
            .max_by_key(|election| election.created_at)
            .cloned())
    }

    fn latest_ended_election(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<Election>, RepositoryError> {
        let store = self.lock()?;
        Ok(store
            .elections
            .iter()
            .filter(|election| election.has_ended(now))
            .max_by_key(|election| election.end_at)
            .cloned())
    }

    fn update_admin_role(
        &self,
        id: &AdminId,
        role: AdminRole,
    ) -> Result<AdminAccount, RepositoryError> {
        let mut store = self.lock()?;
        let admin = store
            .admins
            .iter_mut()
            .find(|admin| &admin.id == id)
            .ok_or(RepositoryError::NotFound)?;
        admin.role = role;
        Ok(admin.clone())
    }

    fn update_admin(&self, admin: AdminAccount) -> Result<AdminAccount, RepositoryError> {
        let mut store = self.lock()?;
        let stored = store
            .admins
            .iter_mut()
            .find(|stored| stored.id == admin.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = admin;
        Ok(stored.clone())
    }
}
