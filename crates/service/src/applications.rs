use tracing::{debug, warn};

use ats_core::{Application, ApplicationField, ApplicationStatus, Candidate, NewApplication};
use ats_storage::SortOrder;

use crate::{RecordError, Shared};

/// Operations on applications.
///
/// Every mutation writes the standalone record first and then rewrites the
/// owning candidate (found by email) with its embedded list replaced wholesale.
/// Both writes happen while holding that email's lock. If the second write
/// fails the first one stays; nothing is rolled back.
#[derive(Clone)]
pub struct ApplicationService {
    shared: Shared,
}

impl ApplicationService {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    /// Stores a new pending application and files it under the candidate with
    /// the same email, creating that candidate on first contact.
    pub async fn create(&self, input: NewApplication) -> Result<Application, RecordError> {
        self.shared.enter("application", "create").await;

        let application = input.into_application(Shared::next_id(), self.shared.now());
        let _guard = self.shared.locks.acquire(&application.email).await;

        self.shared
            .database
            .applications()
            .put(&application)
            .await?;

        let candidate = match self.shared.candidate_by_email(&application.email).await? {
            Some(mut candidate) => {
                candidate.applications.push(application.clone());
                candidate
            }
            None => Candidate::from_first_application(Shared::next_id(), application.clone()),
        };
        self.shared.database.candidates().put(&candidate).await?;

        debug!(
            stage = "api",
            entity = "application",
            op = "create",
            id = %application.id,
            position_id = %application.position_id,
            candidate_id = %candidate.id,
            embedded = candidate.applications.len(),
            "application created"
        );
        Ok(application)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Application>, RecordError> {
        self.shared.enter("application", "get_by_id").await;

        let application = self.shared.database.applications().get(id).await?;
        debug!(
            stage = "api",
            entity = "application",
            op = "get_by_id",
            id,
            found = application.is_some()
        );
        Ok(application)
    }

    /// Lists every application, newest first.
    pub async fn list_all(&self) -> Result<Vec<Application>, RecordError> {
        self.shared.enter("application", "list_all").await;

        let applications = self
            .shared
            .database
            .applications()
            .scan_ordered(ApplicationField::ApplicationDate, SortOrder::Descending)
            .await?;
        debug!(stage = "api", entity = "application", op = "list_all", count = applications.len());
        Ok(applications)
    }

    pub async fn list_by_position(
        &self,
        position_id: &str,
    ) -> Result<Vec<Application>, RecordError> {
        self.shared.enter("application", "list_by_position").await;

        let applications = self
            .shared
            .database
            .applications()
            .query_by_field(ApplicationField::PositionId, position_id)
            .await?;
        debug!(
            stage = "api",
            entity = "application",
            op = "list_by_position",
            position_id,
            count = applications.len()
        );
        Ok(applications)
    }

    pub async fn list_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<Application>, RecordError> {
        self.shared.enter("application", "list_by_status").await;

        let applications = self
            .shared
            .database
            .applications()
            .query_by_field(ApplicationField::Status, status.as_str())
            .await?;
        debug!(
            stage = "api",
            entity = "application",
            op = "list_by_status",
            status = status.as_str(),
            count = applications.len()
        );
        Ok(applications)
    }

    /// Moves an application to `status` in both the standalone record and the
    /// candidate's embedded copy.
    ///
    /// A missing candidate or embedded copy does not fail the call; the
    /// standalone record is still updated.
    pub async fn update_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application, RecordError> {
        self.shared.enter("application", "update_status").await;

        let repo = self.shared.database.applications();
        let email = match repo.get(id).await? {
            Some(existing) => existing.email,
            None => return Err(RecordError::not_found("application", id)),
        };

        let _guard = self.shared.locks.acquire(&email).await;
        let mut updated = repo
            .get(id)
            .await?
            .ok_or_else(|| RecordError::not_found("application", id))?;
        updated.status = status;
        repo.put(&updated).await?;

        match self.shared.candidate_by_email(&email).await? {
            Some(mut candidate) => {
                if candidate.replace_application(&updated) {
                    self.shared.database.candidates().put(&candidate).await?;
                } else {
                    warn!(stage = "api", entity = "application", op = "update_status", id, candidate_id = %candidate.id, "embedded copy missing; candidate left unchanged");
                }
            }
            None => {
                warn!(
                    stage = "api",
                    entity = "application",
                    op = "update_status",
                    id,
                    "no candidate for application email"
                );
            }
        }

        debug!(
            stage = "api",
            entity = "application",
            op = "update_status",
            id,
            status = status.as_str(),
            "application status updated"
        );
        Ok(updated)
    }

    /// Removes an application and its embedded copy. The candidate is removed
    /// as well once its last application is gone.
    ///
    /// Returns `false` when the application did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, RecordError> {
        self.shared.enter("application", "delete").await;

        let repo = self.shared.database.applications();
        let email = match repo.get(id).await? {
            Some(existing) => existing.email,
            None => {
                debug!(
                    stage = "api",
                    entity = "application",
                    op = "delete",
                    id,
                    "application not found"
                );
                return Ok(false);
            }
        };

        let _guard = self.shared.locks.acquire(&email).await;
        let deleted = repo.delete(id).await?;

        if let Some(mut candidate) = self.shared.candidate_by_email(&email).await? {
            let candidates = self.shared.database.candidates();
            if !candidate.remove_application(id) {
                warn!(stage = "api", entity = "application", op = "delete", id, candidate_id = %candidate.id, "embedded copy missing");
            } else if candidate.applications.is_empty() {
                candidates.delete(&candidate.id).await?;
                debug!(stage = "api", entity = "candidate", op = "delete", id = %candidate.id, "candidate removed with last application");
            } else {
                candidates.put(&candidate).await?;
            }
        }

        debug!(stage = "api", entity = "application", op = "delete", id, deleted);
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        clock_with_step, new_application, setup_records, setup_records_with_clock, start_time,
    };

    #[tokio::test]
    async fn create_starts_pending_at_current_time() {
        let (_dir, records) = setup_records().await;
        let payload = serde_json::json!({
            "positionId": "p-1",
            "candidateName": "Kim Lee",
            "email": "kim@x.com",
            "phone": "555",
            "resume": "cv",
            "coverLetter": "hi",
            "experience": 3,
            "skills": ["React"],
            "status": "hired",
            "applicationDate": "2001-01-01T00:00:00Z"
        });
        let input: NewApplication = serde_json::from_value(payload).expect("payload");

        let created = records.applications().create(input).await.expect("create");
        assert_eq!(created.status, ApplicationStatus::Pending);
        assert_eq!(created.application_date, start_time());

        let stored = records
            .applications()
            .get_by_id(&created.id)
            .await
            .expect("get");
        assert_eq!(stored, Some(created));
    }

    #[tokio::test]
    async fn second_application_appends_to_existing_candidate() {
        let (_dir, records) = setup_records().await;
        let first = records
            .applications()
            .create(new_application("p-1", "Robin Ray", "robin@x.com"))
            .await
            .expect("create");
        let second = records
            .applications()
            .create(new_application("p-2", "robin  RAY", "robin@x.com"))
            .await
            .expect("create");

        let candidates = records.candidates().list().await.expect("list");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Robin Ray");
        assert_eq!(candidates[0].applications, vec![first, second]);
    }

    #[tokio::test]
    async fn list_all_is_newest_first_and_filters_work() {
        let (_dir, records) = setup_records().await;
        let applications = records.applications();
        let oldest = applications
            .create(new_application("p-1", "A", "a@x.com"))
            .await
            .expect("create");
        let middle = applications
            .create(new_application("p-2", "B", "b@x.com"))
            .await
            .expect("create");
        let newest = applications
            .create(new_application("p-1", "C", "c@x.com"))
            .await
            .expect("create");

        let all: Vec<_> = applications
            .list_all()
            .await
            .expect("list")
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(all, vec![newest.id.clone(), middle.id.clone(), oldest.id.clone()]);

        let mut for_p1: Vec<_> = applications
            .list_by_position("p-1")
            .await
            .expect("list")
            .into_iter()
            .map(|a| a.id)
            .collect();
        for_p1.sort();
        let mut expected = vec![oldest.id.clone(), newest.id.clone()];
        expected.sort();
        assert_eq!(for_p1, expected);

        applications
            .update_status(&middle.id, ApplicationStatus::Shortlisted)
            .await
            .expect("update");
        let shortlisted = applications
            .list_by_status(ApplicationStatus::Shortlisted)
            .await
            .expect("list");
        assert_eq!(shortlisted.len(), 1);
        assert_eq!(shortlisted[0].id, middle.id);
        assert_eq!(
            applications
                .list_by_status(ApplicationStatus::Pending)
                .await
                .expect("list")
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn list_all_orders_creates_within_one_millisecond() {
        let (_dir, records) =
            setup_records_with_clock(clock_with_step(chrono::Duration::microseconds(100))).await;
        let applications = records.applications();
        let mut created = Vec::new();
        for n in 0..8 {
            let email = format!("c{n}@x.com");
            created.push(
                applications
                    .create(new_application("p-1", "Quick", &email))
                    .await
                    .expect("create"),
            );
        }

        let listed = applications.list_all().await.expect("list");
        let dates: Vec<_> = listed.iter().map(|a| a.application_date).collect();
        let mut expected: Vec<_> = created.iter().map(|a| a.application_date).collect();
        expected.reverse();
        assert_eq!(dates, expected);
    }

    #[tokio::test]
    async fn update_status_changes_only_status() {
        let (_dir, records) = setup_records().await;
        let created = records
            .applications()
            .create(new_application("p-1", "Lee", "lee@x.com"))
            .await
            .expect("create");

        let updated = records
            .applications()
            .update_status(&created.id, ApplicationStatus::Rejected)
            .await
            .expect("update");
        assert_eq!(
            updated,
            Application {
                status: ApplicationStatus::Rejected,
                ..created
            }
        );
    }

    #[tokio::test]
    async fn update_status_on_missing_id_mutates_nothing() {
        let (_dir, records) = setup_records().await;
        let created = records
            .applications()
            .create(new_application("p-1", "Lee", "lee@x.com"))
            .await
            .expect("create");
        let before = records.candidates().list().await.expect("list");

        let err = records
            .applications()
            .update_status("nope", ApplicationStatus::Hired)
            .await
            .expect_err("missing");
        assert!(matches!(err, RecordError::NotFound { kind: "application", .. }));

        assert_eq!(records.candidates().list().await.expect("list"), before);
        assert_eq!(
            records.applications().list_all().await.expect("list"),
            vec![created]
        );
    }

    #[tokio::test]
    async fn update_status_succeeds_without_candidate() {
        let (_dir, records) = setup_records().await;
        let created = records
            .applications()
            .create(new_application("p-1", "Orphan", "orphan@x.com"))
            .await
            .expect("create");
        records.database().candidates().clear().await.expect("clear");

        let updated = records
            .applications()
            .update_status(&created.id, ApplicationStatus::Reviewed)
            .await
            .expect("partial success");
        assert_eq!(updated.status, ApplicationStatus::Reviewed);
        assert!(records.candidates().list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn delete_keeps_candidate_with_remaining_applications() {
        let (_dir, records) = setup_records().await;
        let applications = records.applications();
        let first = applications
            .create(new_application("p-1", "Max", "max@x.com"))
            .await
            .expect("create");
        let second = applications
            .create(new_application("p-2", "Max", "max@x.com"))
            .await
            .expect("create");

        assert!(applications.delete(&first.id).await.expect("delete"));
        assert!(applications.get_by_id(&first.id).await.expect("get").is_none());

        let candidate = records
            .candidates()
            .get_by_email("max@x.com")
            .await
            .expect("lookup")
            .expect("still present");
        assert_eq!(candidate.applications, vec![second.clone()]);

        assert!(applications.delete(&second.id).await.expect("delete"));
        assert!(records
            .candidates()
            .get_by_email("max@x.com")
            .await
            .expect("lookup")
            .is_none());
    }

    #[tokio::test]
    async fn delete_missing_application_returns_false() {
        let (_dir, records) = setup_records().await;
        assert!(!records.applications().delete("ghost").await.expect("delete"));
    }
}
