use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant owning elections, positions, voters and admins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssociationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElectionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoterId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdminId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub id: AssociationId,
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    pub id: ElectionId,
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub association_id: AssociationId,
    pub created_at: DateTime<Utc>,
}

impl Election {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.end_at
    }
}

/// An electable office. Lower `order` sorts first; equal orders keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    pub name: String,
    pub order: i32,
    pub association_id: AssociationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub photo_url: Option<String>,
    pub manifesto: Option<String>,
    pub position_id: PositionId,
    pub election_id: ElectionId,
    pub created_at: DateTime<Utc>,
}

/// One ballot choice. At most one vote per (voter, position) is enforced upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: VoteId,
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
    pub election_id: ElectionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    pub id: VoterId,
    pub email: String,
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub level: Option<String>,
    /// One-time credential mailed to the voter.
    #[serde(skip_serializing)]
    pub password: String,
    pub association_id: AssociationId,
    pub has_voted: bool,
    pub created_at: DateTime<Utc>,
}

impl Voter {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdminRole {
    #[serde(rename = "SUPERADMIN")]
    SuperAdmin,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl AdminRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "SUPERADMIN" => Some(Self::SuperAdmin),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPERADMIN",
            Self::Admin => "ADMIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    pub id: AdminId,
    pub email: String,
    pub role: AdminRole,
    pub association_id: AssociationId,
    /// bcrypt hash; never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl AdminAccount {
    pub fn administers(&self, association_id: &AssociationId) -> bool {
        &self.association_id == association_id
    }
}
