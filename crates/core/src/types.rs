use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Job opening that applicants can apply to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub requirements: Vec<String>,
    #[serde(rename = "type")]
    pub position_type: PositionType,
    pub department: String,
    pub posted_date: DateTime<Utc>,
    pub status: PositionStatus,
}

impl Position {
    /// Returns `true` when title, company, location or department contains the
    /// already-lowercased query.
    pub fn matches_query(&self, lowered_query: &str) -> bool {
        [&self.title, &self.company, &self.location, &self.department]
            .into_iter()
            .any(|field| field.to_lowercase().contains(lowered_query))
    }

    /// Applies every populated field of the patch.
    pub fn apply(&mut self, patch: PositionPatch) {
        let PositionPatch {
            title,
            company,
            location,
            description,
            requirements,
            position_type,
            department,
            status,
        } = patch;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(company) = company {
            self.company = company;
        }
        if let Some(location) = location {
            self.location = location;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(requirements) = requirements {
            self.requirements = requirements;
        }
        if let Some(position_type) = position_type {
            self.position_type = position_type;
        }
        if let Some(department) = department {
            self.department = department;
        }
        if let Some(status) = status {
            self.status = status;
        }
    }
}

/// Employment type of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl PositionType {
    pub const ALL: [Self; 4] = [
        Self::FullTime,
        Self::PartTime,
        Self::Contract,
        Self::Internship,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullTime => "full-time",
            Self::PartTime => "part-time",
            Self::Contract => "contract",
            Self::Internship => "internship",
        }
    }
}

/// Publication state of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Active,
    Closed,
    Draft,
}

impl PositionStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Closed, Self::Draft];

    /// Returns the canonical database representation for the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Draft => "draft",
        }
    }
}

impl FromStr for PositionStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ParseStatusError(value.to_string()))
    }
}

/// Data supplied by callers when opening a position.
///
/// The identifier, posting date and status are assigned on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPosition {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(rename = "type")]
    pub position_type: PositionType,
    pub department: String,
}

impl NewPosition {
    pub fn into_position(self, id: String, posted_date: DateTime<Utc>) -> Position {
        Position {
            id,
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            requirements: self.requirements,
            position_type: self.position_type,
            department: self.department,
            posted_date,
            status: PositionStatus::Active,
        }
    }
}

/// Partial update for a position. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub position_type: Option<PositionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PositionStatus>,
}

/// Submitted application for a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub position_id: String,
    pub candidate_name: String,
    pub email: String,
    pub phone: String,
    pub resume: String,
    pub cover_letter: String,
    pub experience: u32,
    pub skills: Vec<String>,
    pub application_date: DateTime<Utc>,
    pub status: ApplicationStatus,
}

/// Review pipeline stage of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Reviewed,
        Self::Shortlisted,
        Self::Rejected,
        Self::Hired,
    ];

    /// Returns the canonical database representation for the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Shortlisted => "shortlisted",
            Self::Rejected => "rejected",
            Self::Hired => "hired",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ParseStatusError(value.to_string()))
    }
}

/// Raised when a status string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status '{0}'")]
pub struct ParseStatusError(pub String);

/// Data supplied by an applicant.
///
/// Unknown fields are ignored when deserializing, so a payload carrying
/// `status` or `applicationDate` cannot influence the created record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub position_id: String,
    pub candidate_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl NewApplication {
    /// Builds the stored record. New applications always start out pending.
    pub fn into_application(self, id: String, application_date: DateTime<Utc>) -> Application {
        Application {
            id,
            position_id: self.position_id,
            candidate_name: self.candidate_name,
            email: self.email,
            phone: self.phone,
            resume: self.resume,
            cover_letter: self.cover_letter,
            experience: self.experience,
            skills: self.skills,
            application_date,
            status: ApplicationStatus::Pending,
        }
    }
}

/// Person identified by email, carrying full copies of their applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub applications: Vec<Application>,
}

impl Candidate {
    /// Creates the candidate implied by a first application.
    pub fn from_first_application(id: String, application: Application) -> Self {
        Self {
            id,
            name: application.candidate_name.clone(),
            email: application.email.clone(),
            phone: application.phone.clone(),
            applications: vec![application],
        }
    }

    /// Returns `true` when name or email contains the already-lowercased query.
    pub fn matches_query(&self, lowered_query: &str) -> bool {
        self.name.to_lowercase().contains(lowered_query)
            || self.email.to_lowercase().contains(lowered_query)
    }

    /// Returns `true` when any embedded application targets the position.
    pub fn has_applied_to(&self, position_id: &str) -> bool {
        self.applications
            .iter()
            .any(|application| application.position_id == position_id)
    }

    /// Replaces the embedded copy that shares the application's id.
    ///
    /// Returns `false` when no embedded copy matched.
    pub fn replace_application(&mut self, application: &Application) -> bool {
        match self
            .applications
            .iter_mut()
            .find(|embedded| embedded.id == application.id)
        {
            Some(embedded) => {
                *embedded = application.clone();
                true
            }
            None => false,
        }
    }

    /// Drops the embedded copy with the given id, returning whether one was removed.
    pub fn remove_application(&mut self, application_id: &str) -> bool {
        let before = self.applications.len();
        self.applications
            .retain(|embedded| embedded.id != application_id);
        self.applications.len() != before
    }

    pub fn apply(&mut self, patch: CandidatePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
    }
}

/// Contact details that may be corrected on an existing candidate.
///
/// Email is the candidate's identity and the application list is maintained by
/// the application operations, so neither appears here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
