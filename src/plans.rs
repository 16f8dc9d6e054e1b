//! Plan lifecycle: validate-then-write CRUD over training blocks.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::db::PlanRepository;
use crate::error::{Error, Result};
use crate::models::PeriodiqPlan;

/// User input for creating or updating a plan, before validation.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub routine_uuids: Vec<Uuid>,
}

pub struct PlanManager<'a> {
    plans: &'a PlanRepository,
}

impl<'a> PlanManager<'a> {
    pub fn new(plans: &'a PlanRepository) -> Self {
        Self { plans }
    }

    pub async fn create(&self, draft: PlanDraft) -> Result<PeriodiqPlan> {
        let (name, description, routine_uuids) = validate(&draft)?;
        self.ensure_no_overlap(draft.start_date, draft.end_date, None)
            .await?;

        let mut plan = PeriodiqPlan::new(name, draft.start_date, draft.end_date)
            .with_routines(routine_uuids);
        if let Some(description) = description {
            plan = plan.with_description(description);
        }

        let created = self.plans.create(&plan).await?;
        info!("created plan '{}'", created.name);
        Ok(created)
    }

    /// Full replacement of an existing plan, including its routine-link
    /// set. The overlap check excludes the plan being updated.
    pub async fn update(&self, id: Uuid, draft: PlanDraft) -> Result<PeriodiqPlan> {
        let (name, description, routine_uuids) = validate(&draft)?;
        let existing = self
            .plans
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::InvalidPlan(format!("no plan with id {}", id)))?;
        self.ensure_no_overlap(draft.start_date, draft.end_date, Some(id))
            .await?;

        let plan = PeriodiqPlan {
            id,
            name,
            description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            routine_uuids,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        let updated = self.plans.update(&plan).await?;
        info!("updated plan '{}'", updated.name);
        Ok(updated)
    }

    /// Deleting a plan that does not exist is a silent no-op.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if self.plans.delete(id).await? {
            info!("deleted plan {}", id);
        }
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<PeriodiqPlan>> {
        self.plans.get_by_id(id).await
    }

    pub async fn list(&self) -> Result<Vec<PeriodiqPlan>> {
        self.plans.list().await
    }

    async fn ensure_no_overlap(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<()> {
        let conflicts = self.plans.find_overlapping(start, end, exclude).await?;
        match conflicts.into_iter().next() {
            Some(other) => Err(Error::PlanOverlap {
                name: other.name,
                start: other.start_date,
                end: other.end_date,
            }),
            None => Ok(()),
        }
    }
}

/// Trim and check the name, normalize a blank description to `None`, check
/// date ordering, and dedup routine references preserving first-seen order.
fn validate(draft: &PlanDraft) -> Result<(String, Option<String>, Vec<Uuid>)> {
    let name = draft.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidPlan("name must not be blank".to_string()));
    }

    let description = draft
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    if draft.start_date > draft.end_date {
        return Err(Error::InvalidPlan(format!(
            "start date {} is after end date {}",
            draft.start_date, draft.end_date
        )));
    }

    let mut seen: HashSet<Uuid> = HashSet::new();
    let routine_uuids: Vec<Uuid> = draft
        .routine_uuids
        .iter()
        .copied()
        .filter(|uuid| seen.insert(*uuid))
        .collect();

    Ok((name, description, routine_uuids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    struct TestContext {
        plans: PlanRepository,
        _temp_dir: TempDir,
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        TestContext {
            plans: PlanRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(name: &str, start: NaiveDate, end: NaiveDate) -> PlanDraft {
        PlanDraft {
            name: name.to_string(),
            description: None,
            start_date: start,
            end_date: end,
            routine_uuids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_trims_name_and_description() {
        let ctx = setup().await;
        let manager = PlanManager::new(&ctx.plans);

        let mut d = draft("  Block 1  ", date(2024, 1, 1), date(2024, 1, 31));
        d.description = Some("   ".to_string());
        let plan = manager.create(d).await.unwrap();

        assert_eq!(plan.name, "Block 1");
        assert_eq!(plan.description, None);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let ctx = setup().await;
        let manager = PlanManager::new(&ctx.plans);

        let err = manager
            .create(draft("   ", date(2024, 1, 1), date(2024, 1, 31)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPlan(_)));
    }

    #[tokio::test]
    async fn test_inverted_dates_rejected() {
        let ctx = setup().await;
        let manager = PlanManager::new(&ctx.plans);

        let err = manager
            .create(draft("A", date(2024, 2, 1), date(2024, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPlan(_)));
    }

    #[tokio::test]
    async fn test_overlapping_plan_rejected_disjoint_accepted() {
        let ctx = setup().await;
        let manager = PlanManager::new(&ctx.plans);

        manager
            .create(draft("A", date(2024, 1, 1), date(2024, 1, 31)))
            .await
            .unwrap();

        // B overlaps A
        let err = manager
            .create(draft("B", date(2024, 1, 15), date(2024, 2, 15)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PlanOverlap { .. }));

        // C is adjacent but disjoint
        manager
            .create(draft("C", date(2024, 2, 1), date(2024, 2, 28)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_excludes_self_from_overlap_check() {
        let ctx = setup().await;
        let manager = PlanManager::new(&ctx.plans);

        let plan = manager
            .create(draft("A", date(2024, 1, 1), date(2024, 1, 31)))
            .await
            .unwrap();

        // shrinking the same plan's range must not conflict with itself
        let updated = manager
            .update(plan.id, draft("A", date(2024, 1, 5), date(2024, 1, 25)))
            .await
            .unwrap();
        assert_eq!(updated.start_date, date(2024, 1, 5));
    }

    #[tokio::test]
    async fn test_update_dedups_routines_preserving_order() {
        let ctx = setup().await;
        let manager = PlanManager::new(&ctx.plans);

        let plan = manager
            .create(draft("A", date(2024, 1, 1), date(2024, 1, 31)))
            .await
            .unwrap();

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut d = draft("A", date(2024, 1, 1), date(2024, 1, 31));
        d.routine_uuids = vec![first, second, first];

        let updated = manager.update(plan.id, d).await.unwrap();
        assert_eq!(updated.routine_uuids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_delete_missing_plan_is_silent() {
        let ctx = setup().await;
        let manager = PlanManager::new(&ctx.plans);
        manager.delete(Uuid::new_v4()).await.unwrap();
    }
}
