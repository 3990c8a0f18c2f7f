use tracing::debug;

use ats_core::{Candidate, CandidatePatch};

use crate::{RecordError, Shared};

/// Operations on candidates.
#[derive(Clone)]
pub struct CandidateService {
    shared: Shared,
}

impl CandidateService {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Candidate>, RecordError> {
        self.shared.enter("candidate", "get_by_id").await;

        let candidate = self.shared.database.candidates().get(id).await?;
        debug!(
            stage = "api",
            entity = "candidate",
            op = "get_by_id",
            id,
            found = candidate.is_some()
        );
        Ok(candidate)
    }

    /// Exact-match lookup on email, the candidate's identity.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Candidate>, RecordError> {
        self.shared.enter("candidate", "get_by_email").await;

        let candidate = self.shared.candidate_by_email(email).await?;
        debug!(
            stage = "api",
            entity = "candidate",
            op = "get_by_email",
            email,
            found = candidate.is_some()
        );
        Ok(candidate)
    }

    pub async fn list(&self) -> Result<Vec<Candidate>, RecordError> {
        self.shared.enter("candidate", "list").await;

        let candidates = self.shared.database.candidates().scan_all().await?;
        debug!(stage = "api", entity = "candidate", op = "list", count = candidates.len());
        Ok(candidates)
    }

    /// Candidates holding at least one application for the position.
    ///
    /// Scans every candidate's embedded list; there is no index behind this.
    pub async fn list_by_position(&self, position_id: &str) -> Result<Vec<Candidate>, RecordError> {
        self.shared.enter("candidate", "list_by_position").await;

        let candidates: Vec<Candidate> = self
            .shared
            .database
            .candidates()
            .scan_all()
            .await?
            .into_iter()
            .filter(|candidate| candidate.has_applied_to(position_id))
            .collect();
        debug!(
            stage = "api",
            entity = "candidate",
            op = "list_by_position",
            position_id,
            count = candidates.len()
        );
        Ok(candidates)
    }

    /// Corrects a candidate's name or phone.
    pub async fn update(&self, id: &str, patch: CandidatePatch) -> Result<Candidate, RecordError> {
        self.shared.enter("candidate", "update").await;

        let repo = self.shared.database.candidates();
        let email = match repo.get(id).await? {
            Some(existing) => existing.email,
            None => return Err(RecordError::not_found("candidate", id)),
        };

        let _guard = self.shared.locks.acquire(&email).await;
        let mut candidate = repo
            .get(id)
            .await?
            .ok_or_else(|| RecordError::not_found("candidate", id))?;
        candidate.apply(patch);
        repo.put(&candidate).await?;

        debug!(stage = "api", entity = "candidate", op = "update", id, "candidate updated");
        Ok(candidate)
    }

    /// Deletes the candidate together with the standalone record of every
    /// application embedded in it.
    ///
    /// The standalone records are removed directly, not through
    /// [`ApplicationService::delete`](crate::ApplicationService::delete).
    /// Returns `false` when the candidate did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, RecordError> {
        self.shared.enter("candidate", "delete").await;

        let repo = self.shared.database.candidates();
        let email = match repo.get(id).await? {
            Some(existing) => existing.email,
            None => {
                debug!(
                    stage = "api",
                    entity = "candidate",
                    op = "delete",
                    id,
                    "candidate not found"
                );
                return Ok(false);
            }
        };

        let _guard = self.shared.locks.acquire(&email).await;
        let Some(candidate) = repo.get(id).await? else {
            return Ok(false);
        };

        let applications = self.shared.database.applications();
        let mut applications_deleted = 0;
        for application in &candidate.applications {
            applications_deleted += applications.delete(&application.id).await?;
        }
        let deleted = repo.delete(id).await?;

        debug!(
            stage = "api",
            entity = "candidate",
            op = "delete",
            id,
            deleted,
            applications_deleted,
            "candidate deleted"
        );
        Ok(deleted > 0)
    }

    /// Case-insensitive substring search over name and email.
    pub async fn search(&self, query: &str) -> Result<Vec<Candidate>, RecordError> {
        self.shared.enter("candidate", "search").await;

        let lowered = query.to_lowercase();
        let candidates: Vec<Candidate> = self
            .shared
            .database
            .candidates()
            .scan_all()
            .await?
            .into_iter()
            .filter(|candidate| candidate.matches_query(&lowered))
            .collect();
        debug!(stage = "api", entity = "candidate", op = "search", query, count = candidates.len());
        Ok(candidates)
    }
}
