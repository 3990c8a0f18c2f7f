//! Record access operations over the local applicant-tracking store.
//!
//! Applications are stored twice: as standalone records and as embedded copies
//! inside the candidate that shares their email. The operations here keep both
//! copies in step. Writes across collections are not transactional; the
//! standalone record is always written before the embedded copy.
pub mod applications;
pub mod candidates;
pub mod latency;
pub mod locks;
pub mod positions;
pub mod seed;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use thiserror::Error;
use ulid::Ulid;

use ats_core::{Candidate, CandidateField};
use ats_storage::{Database, StorageError};

pub use applications::ApplicationService;
pub use candidates::CandidateService;
pub use latency::Latency;
pub use locks::EmailLocks;
pub use positions::PositionService;
pub use seed::{DatasetSummary, SeedOptions};

/// Source of "now" for creation timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Errors surfaced by record operations.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RecordError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// State shared by every operation group.
#[derive(Clone)]
pub(crate) struct Shared {
    database: Database,
    latency: Latency,
    clock: Clock,
    locks: Arc<EmailLocks>,
}

impl Shared {
    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Time-ordered identifier with a random suffix.
    fn next_id() -> String {
        Ulid::new().to_string()
    }

    /// Records the call and waits out the simulated latency.
    async fn enter(&self, entity: &'static str, operation: &'static str) {
        counter!("record_operations_total", "entity" => entity, "operation" => operation)
            .increment(1);
        self.latency.pause().await;
    }

    /// First candidate registered under `email`.
    async fn candidate_by_email(&self, email: &str) -> Result<Option<Candidate>, RecordError> {
        let mut matches = self
            .database
            .candidates()
            .query_by_field(CandidateField::Email, email)
            .await?;
        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.swap_remove(0)))
        }
    }
}

/// Entry point bundling the position, application and candidate operations.
#[derive(Clone)]
pub struct Records {
    shared: Shared,
    positions: PositionService,
    applications: ApplicationService,
    candidates: CandidateService,
}

impl Records {
    pub fn new(database: Database, latency: Latency) -> Self {
        Self::with_clock(database, latency, Arc::new(Utc::now))
    }

    /// Builds the operations with a custom clock for creation timestamps.
    pub fn with_clock(database: Database, latency: Latency, clock: Clock) -> Self {
        let shared = Shared {
            database,
            latency,
            clock,
            locks: Arc::new(EmailLocks::new()),
        };
        Self {
            positions: PositionService::new(shared.clone()),
            applications: ApplicationService::new(shared.clone()),
            candidates: CandidateService::new(shared.clone()),
            shared,
        }
    }

    pub fn positions(&self) -> &PositionService {
        &self.positions
    }

    pub fn applications(&self) -> &ApplicationService {
        &self.applications
    }

    pub fn candidates(&self) -> &CandidateService {
        &self.candidates
    }

    pub fn database(&self) -> &Database {
        &self.shared.database
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use ats_core::{NewApplication, NewPosition, PositionType};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI64, Ordering};
    use tempfile::TempDir;

    pub fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    /// Clock that advances one minute per reading, starting at [`start_time`].
    pub fn ticking_clock() -> Clock {
        clock_with_step(chrono::Duration::minutes(1))
    }

    /// Clock that advances by `step` per reading, starting at [`start_time`].
    pub fn clock_with_step(step: chrono::Duration) -> Clock {
        let ticks = Arc::new(AtomicI64::new(0));
        Arc::new(move || {
            let tick = ticks.fetch_add(1, Ordering::SeqCst);
            start_time() + step * tick as i32
        })
    }

    pub async fn setup_records() -> (TempDir, Records) {
        setup_records_with_clock(ticking_clock()).await
    }

    pub async fn setup_records_with_clock(clock: Clock) -> (TempDir, Records) {
        let dir = TempDir::new().expect("tempdir");
        let database = Database::open(&dir.path().join("records.db"))
            .await
            .expect("open");
        database.run_migrations().await.expect("migrations");
        let records = Records::with_clock(database, Latency::disabled(), clock);
        (dir, records)
    }

    pub fn new_position(
        title: &str,
        company: &str,
        location: &str,
        department: &str,
    ) -> NewPosition {
        NewPosition {
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            description: format!("{title} at {company}"),
            requirements: vec!["Git proficiency".to_string()],
            position_type: PositionType::FullTime,
            department: department.to_string(),
        }
    }

    pub fn new_application(position_id: &str, name: &str, email: &str) -> NewApplication {
        NewApplication {
            position_id: position_id.to_string(),
            candidate_name: name.to_string(),
            email: email.to_string(),
            phone: "+1-555-0100".to_string(),
            resume: "https://example.com/resume.pdf".to_string(),
            cover_letter: "Hello".to_string(),
            experience: 5,
            skills: vec!["Rust".to_string(), "SQL".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use ats_core::{ApplicationStatus, PositionStatus};
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn application_lifecycle_keeps_both_copies_in_step() {
        let (_dir, records) = setup_records().await;

        let position = records
            .positions()
            .create(new_position("Backend Developer", "StartupX", "Remote", "Engineering"))
            .await
            .expect("create position");
        assert_eq!(position.status, PositionStatus::Active);

        let application = records
            .applications()
            .create(new_application(&position.id, "Alex Kim", "a@x.com"))
            .await
            .expect("create application");

        let candidate = records
            .candidates()
            .get_by_email("a@x.com")
            .await
            .expect("lookup")
            .expect("candidate created");
        assert_eq!(candidate.applications, vec![application.clone()]);
        assert_eq!(candidate.applications[0].status, ApplicationStatus::Pending);

        let hired = records
            .applications()
            .update_status(&application.id, ApplicationStatus::Hired)
            .await
            .expect("update status");
        assert_eq!(hired.status, ApplicationStatus::Hired);

        let standalone = records
            .applications()
            .get_by_id(&application.id)
            .await
            .expect("get")
            .expect("present");
        let candidate = records
            .candidates()
            .get_by_id(&candidate.id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(standalone.status, ApplicationStatus::Hired);
        assert_eq!(candidate.applications, vec![standalone]);

        assert!(records
            .applications()
            .delete(&application.id)
            .await
            .expect("delete"));
        assert!(records
            .candidates()
            .get_by_id(&candidate.id)
            .await
            .expect("get")
            .is_none());
        assert!(records
            .candidates()
            .get_by_email("a@x.com")
            .await
            .expect("lookup")
            .is_none());
    }

    #[tokio::test]
    async fn embedded_ids_match_standalone_ids_per_email() {
        let (_dir, records) = setup_records().await;
        let applications = records.applications();

        let mut created = Vec::new();
        for (position, email) in [
            ("p-1", "a@x.com"),
            ("p-2", "b@x.com"),
            ("p-3", "a@x.com"),
            ("p-1", "b@x.com"),
            ("p-2", "a@x.com"),
        ] {
            created.push(
                applications
                    .create(new_application(position, "Someone", email))
                    .await
                    .expect("create"),
            );
        }
        applications
            .update_status(&created[2].id, ApplicationStatus::Reviewed)
            .await
            .expect("update");
        assert!(applications.delete(&created[0].id).await.expect("delete"));

        for email in ["a@x.com", "b@x.com"] {
            let candidate = records
                .candidates()
                .get_by_email(email)
                .await
                .expect("lookup")
                .expect("present");
            let embedded: BTreeSet<_> = candidate
                .applications
                .iter()
                .map(|a| a.id.clone())
                .collect();
            let standalone: BTreeSet<_> = applications
                .list_all()
                .await
                .expect("list")
                .into_iter()
                .filter(|a| a.email == email)
                .map(|a| a.id)
                .collect();
            assert_eq!(embedded, standalone, "copies diverged for {email}");

            for embedded in &candidate.applications {
                let standalone = applications
                    .get_by_id(&embedded.id)
                    .await
                    .expect("get")
                    .expect("present");
                assert_eq!(&standalone, embedded);
            }
        }
        assert_eq!(records.candidates().list().await.expect("list").len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_share_one_candidate() {
        let (_dir, records) = setup_records().await;

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let records = records.clone();
                tokio::spawn(async move {
                    records
                        .applications()
                        .create(new_application(&format!("p-{n}"), "Racer", "race@x.com"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join").expect("create");
        }

        let candidates = records.candidates().list().await.expect("list");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].applications.len(), 8);
    }

    #[test]
    fn not_found_error_names_the_record() {
        let err = RecordError::not_found("application", "a-404");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "application 'a-404' not found");
    }
}
