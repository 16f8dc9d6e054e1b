use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{parse_date, parse_timestamp, parse_uuid};
use crate::error::Result;
use crate::models::PeriodiqPlan;

pub struct PlanRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: String,
    name: String,
    description: Option<String>,
    start_date: String,
    end_date: String,
    created_at: String,
    updated_at: String,
}

impl PlanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, plan: &PeriodiqPlan) -> Result<PeriodiqPlan> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO periodiq_plans (id, name, description, start_date, end_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(plan.id.to_string())
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.start_date.to_string())
        .bind(plan.end_date.to_string())
        .bind(plan.created_at.to_rfc3339())
        .bind(plan.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        insert_routine_links(&mut tx, plan).await?;
        tx.commit().await?;

        self.get_by_id(plan.id)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound.into())
    }

    /// Full update. The routine-link set is replaced wholesale
    /// (delete-all-then-insert) inside the same transaction as the row
    /// update.
    pub async fn update(&self, plan: &PeriodiqPlan) -> Result<PeriodiqPlan> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE periodiq_plans
            SET name = ?, description = ?, start_date = ?, end_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.start_date.to_string())
        .bind(plan.end_date.to_string())
        .bind(plan.updated_at.to_rfc3339())
        .bind(plan.id.to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM plan_routines WHERE plan_id = ?")
            .bind(plan.id.to_string())
            .execute(&mut *tx)
            .await?;
        insert_routine_links(&mut tx, plan).await?;

        tx.commit().await?;

        self.get_by_id(plan.id)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound.into())
    }

    /// Returns whether a row was actually removed. Deleting a missing id is
    /// not an error.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        // CASCADE removes the routine links
        let result = sqlx::query("DELETE FROM periodiq_plans WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<PeriodiqPlan>> {
        let row: Option<PlanRow> = sqlx::query_as("SELECT * FROM periodiq_plans WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<PeriodiqPlan>> {
        let rows: Vec<PlanRow> =
            sqlx::query_as("SELECT * FROM periodiq_plans ORDER BY start_date")
                .fetch_all(&self.pool)
                .await?;

        let mut plans = Vec::with_capacity(rows.len());
        for row in rows {
            plans.push(self.hydrate(row).await?);
        }
        Ok(plans)
    }

    /// Plans whose inclusive date range intersects `[start, end]`,
    /// optionally excluding one plan by id (the plan being updated).
    pub async fn find_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<PeriodiqPlan>> {
        // ISO date strings compare lexicographically in date order
        let rows: Vec<PlanRow> = match exclude {
            Some(id) => {
                sqlx::query_as(
                    "SELECT * FROM periodiq_plans WHERE start_date <= ? AND end_date >= ? AND id != ?",
                )
                .bind(end.to_string())
                .bind(start.to_string())
                .bind(id.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT * FROM periodiq_plans WHERE start_date <= ? AND end_date >= ?",
                )
                .bind(end.to_string())
                .bind(start.to_string())
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut plans = Vec::with_capacity(rows.len());
        for row in rows {
            plans.push(self.hydrate(row).await?);
        }
        Ok(plans)
    }

    async fn hydrate(&self, row: PlanRow) -> Result<PeriodiqPlan> {
        let link_rows: Vec<(String,)> = sqlx::query_as(
            "SELECT routine_uuid FROM plan_routines WHERE plan_id = ? ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let mut routine_uuids = Vec::with_capacity(link_rows.len());
        for (raw,) in link_rows {
            routine_uuids.push(parse_uuid(&raw)?);
        }

        Ok(PeriodiqPlan {
            id: parse_uuid(&row.id)?,
            name: row.name,
            description: row.description,
            start_date: parse_date(&row.start_date)?,
            end_date: parse_date(&row.end_date)?,
            routine_uuids,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

async fn insert_routine_links(
    tx: &mut Transaction<'_, Sqlite>,
    plan: &PeriodiqPlan,
) -> Result<()> {
    for (position, routine_uuid) in plan.routine_uuids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO plan_routines (plan_id, position, routine_uuid) VALUES (?, ?, ?)",
        )
        .bind(plan.id.to_string())
        .bind(position as i64)
        .bind(routine_uuid.to_string())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup() -> (PlanRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        (PlanRepository::new(pool), temp_dir)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_preserves_link_order() {
        let (repo, _dir) = setup().await;
        let routines = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let plan = PeriodiqPlan::new("Block 1", date(2024, 1, 1), date(2024, 1, 31))
            .with_routines(routines.clone());

        let created = repo.create(&plan).await.unwrap();
        assert_eq!(created.routine_uuids, routines);

        let fetched = repo.get_by_id(plan.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Block 1");
        assert_eq!(fetched.routine_uuids, routines);
    }

    #[tokio::test]
    async fn test_update_replaces_links() {
        let (repo, _dir) = setup().await;
        let mut plan = PeriodiqPlan::new("Block 1", date(2024, 1, 1), date(2024, 1, 31))
            .with_routines(vec![Uuid::new_v4()]);
        repo.create(&plan).await.unwrap();

        let replacement = vec![Uuid::new_v4(), Uuid::new_v4()];
        plan.routine_uuids = replacement.clone();
        plan.name = "Block 1b".to_string();
        let updated = repo.update(&plan).await.unwrap();

        assert_eq!(updated.name, "Block 1b");
        assert_eq!(updated.routine_uuids, replacement);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let (repo, _dir) = setup().await;
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_overlapping_excludes_self() {
        let (repo, _dir) = setup().await;
        let plan = PeriodiqPlan::new("A", date(2024, 1, 1), date(2024, 1, 31));
        repo.create(&plan).await.unwrap();

        let hits = repo
            .find_overlapping(date(2024, 1, 15), date(2024, 2, 15), None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let excluding_self = repo
            .find_overlapping(date(2024, 1, 15), date(2024, 2, 15), Some(plan.id))
            .await
            .unwrap();
        assert!(excluding_self.is_empty());

        let disjoint = repo
            .find_overlapping(date(2024, 2, 1), date(2024, 2, 28), None)
            .await
            .unwrap();
        assert!(disjoint.is_empty());
    }
}
