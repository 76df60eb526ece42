//! Per-position vote aggregation shared by the results view and every export format.

use serde::Serialize;

use crate::domain::{Candidate, CandidateId, Position, PositionId};
use crate::repository::CandidateEntry;

/// Raw tally for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTally {
    pub candidate: Candidate,
    pub votes: u64,
}

/// A position with its candidates in their stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionTally {
    pub position: Position,
    pub candidates: Vec<CandidateTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStanding {
    pub id: CandidateId,
    pub name: String,
    pub photo_url: Option<String>,
    /// 1-based rank after the descending sort.
    pub rank: usize,
    pub votes: u64,
    pub percentage: f64,
    /// Rank-1 candidate with a non-zero count. Ties are reported on [`PositionOutcome`].
    pub is_winner: bool,
}

/// How the top of a position resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PositionOutcome {
    NoVotes,
    Decided { winner: CandidateId },
    Tied { leaders: Vec<CandidateId> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResult {
    pub id: PositionId,
    pub name: String,
    pub order: i32,
    pub total_votes: u64,
    pub candidates: Vec<CandidateStanding>,
    pub outcome: PositionOutcome,
}

impl PositionResult {
    pub fn status_label(&self, candidate: &CandidateId) -> &'static str {
        match &self.outcome {
            PositionOutcome::Decided { winner } if winner == candidate => "WINNER",
            PositionOutcome::Tied { leaders } if leaders.contains(candidate) => "TIED",
            _ => "",
        }
    }
}

/// Group joined candidate rows by position, positions sorted by ascending order.
///
/// Positions with equal order keep the order in which they first appear, and
/// candidates keep their stored order within a position.
pub fn group_by_position(entries: &[CandidateEntry]) -> Vec<PositionTally> {
    let mut groups: Vec<PositionTally> = Vec::new();

    for entry in entries {
        let tally = CandidateTally {
            candidate: entry.candidate.clone(),
            votes: entry.vote_count,
        };
        match groups
            .iter_mut()
            .find(|group| group.position.id == entry.position.id)
        {
            Some(group) => group.candidates.push(tally),
            None => groups.push(PositionTally {
                position: entry.position.clone(),
                candidates: vec![tally],
            }),
        }
    }

    groups.sort_by_key(|group| group.position.order);
    groups
}

/// Rank every position's candidates by descending votes and compute shares.
pub fn aggregate(positions: Vec<PositionTally>) -> Vec<PositionResult> {
    let mut positions = positions;
    positions.sort_by_key(|tally| tally.position.order);
    positions.into_iter().map(aggregate_position).collect()
}

fn aggregate_position(tally: PositionTally) -> PositionResult {
    let PositionTally {
        position,
        mut candidates,
    } = tally;

    // stable: equal counts keep their stored order
    candidates.sort_by(|a, b| b.votes.cmp(&a.votes));

    let total_votes: u64 = candidates.iter().map(|c| c.votes).sum();
    let top = candidates.first().map(|c| c.votes).unwrap_or(0);

    let outcome = if top == 0 {
        PositionOutcome::NoVotes
    } else {
        let leaders: Vec<CandidateId> = candidates
            .iter()
            .take_while(|c| c.votes == top)
            .map(|c| c.candidate.id.clone())
            .collect();
        match leaders.as_slice() {
            [winner] => PositionOutcome::Decided {
                winner: winner.clone(),
            },
            _ => PositionOutcome::Tied { leaders },
        }
    };

    let standings = candidates
        .into_iter()
        .enumerate()
        .map(|(index, tally)| CandidateStanding {
            id: tally.candidate.id,
            name: tally.candidate.name,
            photo_url: tally.candidate.photo_url,
            rank: index + 1,
            votes: tally.votes,
            percentage: percentage(tally.votes, total_votes),
            is_winner: index == 0 && tally.votes > 0,
        })
        .collect();

    PositionResult {
        id: position.id,
        name: position.name,
        order: position.order,
        total_votes,
        candidates: standings,
        outcome,
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        votes as f64 / total as f64 * 100.0
    }
}

/// `60.00%`
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}
