use std::fmt::Debug;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::types::{Application, Candidate, Position};

/// Secondary index of a record collection.
pub trait IndexField: Copy + Debug + Send + Sync + 'static {
    /// Every index of the collection, in column order.
    const ALL: &'static [Self];

    /// Column that stores the indexed value.
    fn column(self) -> &'static str;
}

/// A type persisted as a standalone record in its own collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    type Field: IndexField;

    /// Name of the collection (and table) holding the records.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// Value stored in the index column for `field`.
    fn index_value(&self, field: Self::Field) -> String;
}

/// Formats timestamps so lexical order matches chronological order.
pub fn index_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionField {
    Title,
    Company,
    Location,
    Type,
    Department,
    Status,
    PostedDate,
}

impl IndexField for PositionField {
    const ALL: &'static [Self] = &[
        Self::Title,
        Self::Company,
        Self::Location,
        Self::Type,
        Self::Department,
        Self::Status,
        Self::PostedDate,
    ];

    fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Company => "company",
            Self::Location => "location",
            Self::Type => "type",
            Self::Department => "department",
            Self::Status => "status",
            Self::PostedDate => "posted_date",
        }
    }
}

impl Record for Position {
    type Field = PositionField;

    const COLLECTION: &'static str = "positions";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_value(&self, field: PositionField) -> String {
        match field {
            PositionField::Title => self.title.clone(),
            PositionField::Company => self.company.clone(),
            PositionField::Location => self.location.clone(),
            PositionField::Type => self.position_type.as_str().to_string(),
            PositionField::Department => self.department.clone(),
            PositionField::Status => self.status.as_str().to_string(),
            PositionField::PostedDate => index_timestamp(self.posted_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationField {
    PositionId,
    CandidateName,
    Email,
    Status,
    ApplicationDate,
}

impl IndexField for ApplicationField {
    const ALL: &'static [Self] = &[
        Self::PositionId,
        Self::CandidateName,
        Self::Email,
        Self::Status,
        Self::ApplicationDate,
    ];

    fn column(self) -> &'static str {
        match self {
            Self::PositionId => "position_id",
            Self::CandidateName => "candidate_name",
            Self::Email => "email",
            Self::Status => "status",
            Self::ApplicationDate => "application_date",
        }
    }
}

impl Record for Application {
    type Field = ApplicationField;

    const COLLECTION: &'static str = "applications";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_value(&self, field: ApplicationField) -> String {
        match field {
            ApplicationField::PositionId => self.position_id.clone(),
            ApplicationField::CandidateName => self.candidate_name.clone(),
            ApplicationField::Email => self.email.clone(),
            ApplicationField::Status => self.status.as_str().to_string(),
            ApplicationField::ApplicationDate => index_timestamp(self.application_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateField {
    Name,
    Email,
}

impl IndexField for CandidateField {
    const ALL: &'static [Self] = &[Self::Name, Self::Email];

    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
        }
    }
}

impl Record for Candidate {
    type Field = CandidateField;

    const COLLECTION: &'static str = "candidates";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_value(&self, field: CandidateField) -> String {
        match field {
            CandidateField::Name => self.name.clone(),
            CandidateField::Email => self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn index_timestamps_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert!(index_timestamp(earlier) < index_timestamp(later));
        assert_eq!(index_timestamp(later), "2024-01-10T00:00:00.000000000Z");
    }

    #[test]
    fn index_timestamps_order_within_one_millisecond() {
        let base = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let earlier = base + chrono::Duration::microseconds(100);
        let later = base + chrono::Duration::microseconds(200);
        assert!(index_timestamp(earlier) < index_timestamp(later));
        assert_eq!(index_timestamp(earlier), "2024-01-10T00:00:00.000100000Z");
    }

    #[test]
    fn index_columns_are_unique_per_collection() {
        let mut columns: Vec<_> = PositionField::ALL.iter().map(|f| f.column()).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), PositionField::ALL.len());

        let mut columns: Vec<_> = ApplicationField::ALL.iter().map(|f| f.column()).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), ApplicationField::ALL.len());
    }
}
