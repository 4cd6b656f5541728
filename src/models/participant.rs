// src/models/participant.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{models::quiz::not_blank, utils::html::strip_markup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticipantStatus {
    #[default]
    Active,
    Completed,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Active => "Active",
            ParticipantStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(ParticipantStatus::Active),
            "Completed" => Ok(ParticipantStatus::Completed),
            other => Err(format!("Unknown participant status '{}'", other)),
        }
    }
}

/// Represents the 'participants' table: one registered team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub team: String,
    pub college: String,

    /// Member names, in registration order. Always at least one.
    pub members: Vec<String>,
    pub status: ParticipantStatus,
    pub email: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub team: String,
    pub college: String,
    pub members: Vec<String>,
    pub email: Option<String>,
}

/// Members column as found in storage: older rows hold a bare head-count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MembersRecord {
    Count(u32),
    Names(Vec<String>),
}

impl MembersRecord {
    /// Canonical shape used by the rest of the crate.
    pub fn into_names(self) -> Vec<String> {
        match self {
            MembersRecord::Names(names) => names,
            MembersRecord::Count(n) => (1..=n).map(|i| format!("Member {}", i)).collect(),
        }
    }
}

/// Team identity carried into a quiz session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub participant_id: Option<i64>,
    pub team: String,
    pub college: String,
    pub members: Vec<String>,
}

impl TeamIdentity {
    /// Used when a session starts without a registered team.
    pub fn anonymous() -> Self {
        Self {
            participant_id: None,
            team: "Anonymous Team".to_string(),
            college: "Unknown College".to_string(),
            members: Vec::new(),
        }
    }
}

impl From<&Participant> for TeamIdentity {
    fn from(p: &Participant) -> Self {
        Self {
            participant_id: Some(p.id),
            team: p.team.clone(),
            college: p.college.clone(),
            members: p.members.clone(),
        }
    }
}

/// DTO for team registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterParticipantRequest {
    #[validate(
        custom(function = not_blank),
        length(max = 100, message = "Team name must be at most 100 characters.")
    )]
    pub team: String,
    #[validate(
        custom(function = not_blank),
        length(max = 200, message = "College name must be at most 200 characters.")
    )]
    pub college: String,
    #[validate(custom(function = validate_members))]
    pub members: Vec<String>,
    #[validate(email)]
    pub email: Option<String>,
}

impl RegisterParticipantRequest {
    /// Strips markup, trims every field and drops blank member rows.
    pub fn into_new_participant(self) -> NewParticipant {
        NewParticipant {
            team: strip_markup(self.team.trim()).trim().to_string(),
            college: strip_markup(self.college.trim()).trim().to_string(),
            members: self
                .members
                .into_iter()
                .map(|m| strip_markup(m.trim()).trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            email: self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
        }
    }
}

fn validate_members(members: &[String]) -> Result<(), validator::ValidationError> {
    if !members.iter().any(|m| !m.trim().is_empty()) {
        return Err(validator::ValidationError::new("at_least_one_member"));
    }
    if members.iter().any(|m| m.len() > 100) {
        return Err(validator::ValidationError::new("member_name_too_long"));
    }
    Ok(())
}
