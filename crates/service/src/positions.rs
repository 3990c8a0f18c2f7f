use tracing::debug;

use ats_core::{NewPosition, Position, PositionField, PositionPatch, PositionStatus};
use ats_storage::SortOrder;

use crate::{RecordError, Shared};

/// Operations on job positions. No other collection is touched from here;
/// deleting a position leaves its applications in place.
#[derive(Clone)]
pub struct PositionService {
    shared: Shared,
}

impl PositionService {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    /// Opens a new position. It is always created active and stamped with the current time.
    pub async fn create(&self, input: NewPosition) -> Result<Position, RecordError> {
        self.shared.enter("position", "create").await;

        let position = input.into_position(Shared::next_id(), self.shared.now());
        self.shared.database.positions().put(&position).await?;

        debug!(stage = "api", entity = "position", op = "create", id = %position.id, title = %position.title, "position created");
        Ok(position)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Position>, RecordError> {
        self.shared.enter("position", "get_by_id").await;

        let position = self.shared.database.positions().get(id).await?;
        debug!(
            stage = "api",
            entity = "position",
            op = "get_by_id",
            id,
            found = position.is_some()
        );
        Ok(position)
    }

    /// Lists every position, most recently posted first.
    pub async fn list(&self) -> Result<Vec<Position>, RecordError> {
        self.shared.enter("position", "list").await;

        let positions = self
            .shared
            .database
            .positions()
            .scan_ordered(PositionField::PostedDate, SortOrder::Descending)
            .await?;
        debug!(stage = "api", entity = "position", op = "list", count = positions.len());
        Ok(positions)
    }

    pub async fn list_by_status(
        &self,
        status: PositionStatus,
    ) -> Result<Vec<Position>, RecordError> {
        self.shared.enter("position", "list_by_status").await;

        let positions = self
            .shared
            .database
            .positions()
            .query_by_field(PositionField::Status, status.as_str())
            .await?;
        debug!(
            stage = "api",
            entity = "position",
            op = "list_by_status",
            status = status.as_str(),
            count = positions.len()
        );
        Ok(positions)
    }

    /// Applies `patch` to an existing position. The id and posting date never change.
    pub async fn update(&self, id: &str, patch: PositionPatch) -> Result<Position, RecordError> {
        self.shared.enter("position", "update").await;

        let repo = self.shared.database.positions();
        let mut position = repo
            .get(id)
            .await?
            .ok_or_else(|| RecordError::not_found("position", id))?;
        position.apply(patch);
        repo.put(&position).await?;

        debug!(
            stage = "api",
            entity = "position",
            op = "update",
            id,
            status = position.status.as_str(),
            "position updated"
        );
        Ok(position)
    }

    /// Removes the position, returning `false` when it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, RecordError> {
        self.shared.enter("position", "delete").await;

        let deleted = self.shared.database.positions().delete(id).await?;
        debug!(stage = "api", entity = "position", op = "delete", id, deleted);
        Ok(deleted > 0)
    }

    /// Case-insensitive substring search over title, company, location and department.
    pub async fn search(&self, query: &str) -> Result<Vec<Position>, RecordError> {
        self.shared.enter("position", "search").await;

        let lowered = query.to_lowercase();
        let positions: Vec<Position> = self
            .shared
            .database
            .positions()
            .scan_all()
            .await?
            .into_iter()
            .filter(|position| position.matches_query(&lowered))
            .collect();
        debug!(stage = "api", entity = "position", op = "search", query, count = positions.len());
        Ok(positions)
    }
}
