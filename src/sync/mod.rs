//! Watermark-based incremental synchronization against the remote source.
//!
//! The watermark is the maximum `updated_at` across locally stored
//! workouts. It is derived from stored rows on every run rather than
//! tracked separately, so a failed or rolled-back sync leaves the cursor
//! exactly where it was and a retry is always safe.

use std::collections::HashSet;

use chrono::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{RoutineRepository, TemplateRepository, WorkoutRepository};
use crate::error::Result;
use crate::hevy::{
    parse_event, parse_routine, parse_template, parse_workout, parse_workout_id, WorkoutSource,
};
use crate::models::Workout;

const EVENT_UPDATED: &str = "updated";
const EVENT_DELETED: &str = "deleted";

/// Result of an incremental workout sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No local workouts, so there is no watermark to sync from. Bootstrap
    /// first.
    EmptyStore,
    /// The remote reported no events past the watermark.
    UpToDate,
    Applied {
        deleted: usize,
        inserted: usize,
        /// Records dropped because their payload was malformed. Skipped
        /// records are left untouched locally.
        skipped: usize,
    },
}

/// Result of a full backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The store already has workouts; backfill refused to touch it.
    NotEmpty,
    Imported { inserted: usize, skipped: usize },
}

/// How to reconcile reference data (templates, routines) with the remote
/// catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Insert records whose uuid is not yet present; leave the rest alone.
    InsertNew,
    /// Delete the whole local catalog and bulk-insert the remote one.
    OverwriteAll,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub inserted: usize,
    pub skipped_existing: usize,
    pub malformed: usize,
}

pub struct Synchronizer<'a, S> {
    source: &'a S,
    workouts: &'a WorkoutRepository,
    routines: &'a RoutineRepository,
    templates: &'a TemplateRepository,
}

impl<'a, S: WorkoutSource> Synchronizer<'a, S> {
    pub fn new(
        source: &'a S,
        workouts: &'a WorkoutRepository,
        routines: &'a RoutineRepository,
        templates: &'a TemplateRepository,
    ) -> Self {
        Self {
            source,
            workouts,
            routines,
            templates,
        }
    }

    /// Apply remote change events since the watermark.
    ///
    /// For both `updated` and `deleted` events the local workout is
    /// deleted; `updated` events are then re-inserted from the fresh
    /// payload. Both halves run in one transaction, so a crash can never
    /// leave an old and a new copy, nor neither. Events with other type
    /// tags are ignored.
    pub async fn sync_workouts(&self) -> Result<SyncOutcome> {
        let Some(watermark) = self.workouts.max_updated_at().await? else {
            info!("no local workouts yet; nothing to sync (bootstrap to backfill)");
            return Ok(SyncOutcome::EmptyStore);
        };

        // The 1-second pad keeps the event that established the current
        // watermark from being fetched again.
        let since = watermark + Duration::seconds(1);
        let raw_events = self.source.fetch_workout_events(since).await?;
        if raw_events.is_empty() {
            info!("no new workout events");
            return Ok(SyncOutcome::UpToDate);
        }

        let mut delete_uuids: HashSet<Uuid> = HashSet::new();
        let mut replacements: Vec<Workout> = Vec::new();
        let mut skipped = 0usize;

        for raw in &raw_events {
            let event = match parse_event(raw) {
                Ok(event) => event,
                Err(err) => {
                    warn!("skipping unreadable event: {}", err);
                    skipped += 1;
                    continue;
                }
            };

            match event.event_type.as_str() {
                EVENT_DELETED => match parse_workout_id(&event.workout) {
                    Ok(uuid) => {
                        delete_uuids.insert(uuid);
                    }
                    Err(err) => {
                        warn!("skipping deleted event without workout id: {}", err);
                        skipped += 1;
                    }
                },
                EVENT_UPDATED => match parse_workout(&event.workout) {
                    Ok(workout) => {
                        delete_uuids.insert(workout.uuid);
                        replacements.push(workout);
                    }
                    // A malformed updated record is skipped whole: deleting
                    // the local copy without a replacement would lose data.
                    Err(err) => {
                        warn!("skipping malformed workout payload: {}", err);
                        skipped += 1;
                    }
                },
                other => {
                    debug!("ignoring event type '{}'", other);
                }
            }
        }

        // If the same workout was updated more than once in the window,
        // keep only the last payload.
        let mut seen: HashSet<Uuid> = HashSet::new();
        replacements.reverse();
        replacements.retain(|w| seen.insert(w.uuid));
        replacements.reverse();

        // Insert order follows start time; grouping and display code treat
        // this as stable input.
        replacements.sort_by_key(|w| w.start_time);

        let delete_uuids: Vec<Uuid> = delete_uuids.into_iter().collect();
        let deleted = delete_uuids.len();
        let inserted = replacements.len();
        self.workouts.replace(&delete_uuids, &replacements).await?;

        info!(
            "applied workout events: {} deleted, {} re-inserted, {} skipped",
            deleted, inserted, skipped
        );
        Ok(SyncOutcome::Applied {
            deleted,
            inserted,
            skipped,
        })
    }

    /// Full backfill of an empty store from the complete remote history.
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome> {
        if self.workouts.count().await? > 0 {
            info!("store is not empty; refusing to bootstrap over it");
            return Ok(BootstrapOutcome::NotEmpty);
        }

        let raw_workouts = self.source.fetch_workouts().await?;
        let mut workouts = Vec::with_capacity(raw_workouts.len());
        let mut skipped = 0usize;
        for raw in &raw_workouts {
            match parse_workout(raw) {
                Ok(workout) => workouts.push(workout),
                Err(err) => {
                    warn!("skipping malformed workout payload: {}", err);
                    skipped += 1;
                }
            }
        }

        workouts.sort_by_key(|w| w.start_time);
        self.workouts.insert_all(&workouts).await?;

        info!("bootstrapped {} workouts ({} skipped)", workouts.len(), skipped);
        Ok(BootstrapOutcome::Imported {
            inserted: workouts.len(),
            skipped,
        })
    }

    /// Refresh the routine catalog from the remote.
    pub async fn refresh_routines(&self, mode: RefreshMode) -> Result<RefreshOutcome> {
        let raw = self.source.fetch_routines().await?;
        let mut routines = Vec::with_capacity(raw.len());
        let mut outcome = RefreshOutcome::default();

        for value in &raw {
            match parse_routine(value) {
                Ok(routine) => routines.push(routine),
                Err(err) => {
                    warn!("skipping malformed routine payload: {}", err);
                    outcome.malformed += 1;
                }
            }
        }

        match mode {
            RefreshMode::OverwriteAll => {
                outcome.inserted = routines.len();
                self.routines.replace_all(&routines).await?;
            }
            RefreshMode::InsertNew => {
                let existing: HashSet<Uuid> =
                    self.routines.existing_uuids().await?.into_iter().collect();
                let (new, known): (Vec<_>, Vec<_>) = routines
                    .into_iter()
                    .partition(|r| !existing.contains(&r.uuid));
                outcome.inserted = new.len();
                outcome.skipped_existing = known.len();
                self.routines.insert_all(&new).await?;
            }
        }

        info!(
            "refreshed routines: {} inserted, {} already present, {} malformed",
            outcome.inserted, outcome.skipped_existing, outcome.malformed
        );
        Ok(outcome)
    }

    /// Refresh the exercise-template catalog from the remote.
    pub async fn refresh_templates(&self, mode: RefreshMode) -> Result<RefreshOutcome> {
        let raw = self.source.fetch_exercise_templates().await?;
        let mut templates = Vec::with_capacity(raw.len());
        let mut outcome = RefreshOutcome::default();

        for value in &raw {
            match parse_template(value) {
                Ok(template) => templates.push(template),
                Err(err) => {
                    warn!("skipping malformed template payload: {}", err);
                    outcome.malformed += 1;
                }
            }
        }

        match mode {
            RefreshMode::OverwriteAll => {
                outcome.inserted = templates.len();
                self.templates.replace_all(&templates).await?;
            }
            RefreshMode::InsertNew => {
                let existing: HashSet<String> =
                    self.templates.existing_uuids().await?.into_iter().collect();
                let (new, known): (Vec<_>, Vec<_>) = templates
                    .into_iter()
                    .partition(|t| !existing.contains(&t.uuid));
                outcome.inserted = new.len();
                outcome.skipped_existing = known.len();
                self.templates.insert_all(&new).await?;
            }
        }

        info!(
            "refreshed exercise templates: {} inserted, {} already present, {} malformed",
            outcome.inserted, outcome.skipped_existing, outcome.malformed
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    struct ScriptedSource {
        workouts: Vec<Value>,
        /// Raw events alongside the timestamp the remote indexed them at.
        events: Vec<(DateTime<Utc>, Value)>,
        routines: Vec<Value>,
        templates: Vec<Value>,
    }

    impl ScriptedSource {
        fn empty() -> Self {
            Self {
                workouts: Vec::new(),
                events: Vec::new(),
                routines: Vec::new(),
                templates: Vec::new(),
            }
        }
    }

    impl WorkoutSource for ScriptedSource {
        async fn fetch_workouts(&self) -> Result<Vec<Value>> {
            Ok(self.workouts.clone())
        }

        async fn fetch_workout_events(&self, since: DateTime<Utc>) -> Result<Vec<Value>> {
            Ok(self
                .events
                .iter()
                .filter(|(at, _)| *at >= since)
                .map(|(_, event)| event.clone())
                .collect())
        }

        async fn fetch_exercise_templates(&self) -> Result<Vec<Value>> {
            Ok(self.templates.clone())
        }

        async fn fetch_routines(&self) -> Result<Vec<Value>> {
            Ok(self.routines.clone())
        }
    }

    struct TestContext {
        workouts: WorkoutRepository,
        routines: RoutineRepository,
        templates: TemplateRepository,
        _temp_dir: TempDir,
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        TestContext {
            workouts: WorkoutRepository::new(pool.clone()),
            routines: RoutineRepository::new(pool.clone()),
            templates: TemplateRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, h, 0, 0).unwrap()
    }

    fn workout_json(uuid: &str, title: &str, start: DateTime<Utc>, updated: DateTime<Utc>) -> Value {
        json!({
            "id": uuid,
            "title": title,
            "description": null,
            "start_time": start.to_rfc3339(),
            "end_time": (start + Duration::hours(1)).to_rfc3339(),
            "updated_at": updated.to_rfc3339(),
            "created_at": updated.to_rfc3339(),
            "exercises": [{
                "index": 0,
                "title": "Bench Press (Barbell)",
                "exercise_template_id": "79D0BB3A",
                "sets": [{ "index": 0, "type": "normal", "weight_kg": 100.0, "reps": 5 }]
            }]
        })
    }

    const UUID_A: &str = "25c2ed8b-c0b8-4e2a-b99d-3215cb054b40";
    const UUID_B: &str = "dde076a7-899f-4e7c-8924-3a346ba6299a";

    #[tokio::test]
    async fn test_sync_empty_store_is_noop() {
        let ctx = setup().await;
        let source = ScriptedSource::empty();
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);

        assert_eq!(sync.sync_workouts().await.unwrap(), SyncOutcome::EmptyStore);
        assert_eq!(ctx.workouts.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_then_refuses_second_run() {
        let ctx = setup().await;
        let mut source = ScriptedSource::empty();
        source.workouts = vec![
            workout_json(UUID_B, "B", hour(12), hour(13)),
            workout_json(UUID_A, "A", hour(8), hour(9)),
        ];
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);

        let outcome = sync.bootstrap().await.unwrap();
        assert_eq!(
            outcome,
            BootstrapOutcome::Imported {
                inserted: 2,
                skipped: 0
            }
        );

        assert_eq!(sync.bootstrap().await.unwrap(), BootstrapOutcome::NotEmpty);
        assert_eq!(ctx.workouts.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_updated_event_replaces_local_copy() {
        let ctx = setup().await;
        let mut source = ScriptedSource::empty();
        source.workouts = vec![workout_json(UUID_A, "A", hour(8), hour(9))];
        source.events = vec![(
            hour(11),
            json!({ "type": "updated", "workout": workout_json(UUID_A, "A renamed", hour(8), hour(11)) }),
        )];
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);
        sync.bootstrap().await.unwrap();

        let outcome = sync.sync_workouts().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Applied {
                deleted: 1,
                inserted: 1,
                skipped: 0
            }
        );

        let workouts = ctx.workouts.list().await.unwrap();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].title, "A renamed");
    }

    #[tokio::test]
    async fn test_deleted_event_removes_local_copy() {
        let ctx = setup().await;
        let mut source = ScriptedSource::empty();
        source.workouts = vec![
            workout_json(UUID_A, "A", hour(8), hour(9)),
            workout_json(UUID_B, "B", hour(10), hour(10)),
        ];
        source.events = vec![(
            hour(12),
            json!({ "type": "deleted", "workout": workout_json(UUID_A, "A", hour(8), hour(12)) }),
        )];
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);
        sync.bootstrap().await.unwrap();

        let outcome = sync.sync_workouts().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Applied {
                deleted: 1,
                inserted: 0,
                skipped: 0
            }
        );

        let remaining = ctx.workouts.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "B");
    }

    #[tokio::test]
    async fn test_sync_twice_is_idempotent() {
        let ctx = setup().await;
        let mut source = ScriptedSource::empty();
        source.workouts = vec![workout_json(UUID_A, "A", hour(8), hour(9))];
        source.events = vec![(
            hour(11),
            json!({ "type": "updated", "workout": workout_json(UUID_A, "A v2", hour(8), hour(11)) }),
        )];
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);
        sync.bootstrap().await.unwrap();

        assert!(matches!(
            sync.sync_workouts().await.unwrap(),
            SyncOutcome::Applied { .. }
        ));
        let after_first = ctx.workouts.list().await.unwrap();

        // The watermark advanced past the event, so the second run sees an
        // empty event list and changes nothing.
        assert_eq!(sync.sync_workouts().await.unwrap(), SyncOutcome::UpToDate);
        let after_second = ctx.workouts.list().await.unwrap();

        assert_eq!(
            serde_json::to_string(&after_first).unwrap(),
            serde_json::to_string(&after_second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_malformed_updated_record_is_isolated() {
        let ctx = setup().await;
        let mut source = ScriptedSource::empty();
        source.workouts = vec![
            workout_json(UUID_A, "A", hour(8), hour(9)),
            workout_json(UUID_B, "B", hour(10), hour(10)),
        ];

        let mut broken = workout_json(UUID_A, "A v2", hour(8), hour(11));
        broken.as_object_mut().unwrap().remove("title");
        source.events = vec![
            (hour(11), json!({ "type": "updated", "workout": broken })),
            (
                hour(12),
                json!({ "type": "updated", "workout": workout_json(UUID_B, "B v2", hour(10), hour(12)) }),
            ),
        ];
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);
        sync.bootstrap().await.unwrap();

        let outcome = sync.sync_workouts().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Applied {
                deleted: 1,
                inserted: 1,
                skipped: 1
            }
        );

        // The malformed record's old copy survives; the good record was
        // replaced.
        let titles: Vec<String> = ctx
            .workouts
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.title)
            .collect();
        assert!(titles.contains(&"A".to_string()));
        assert!(titles.contains(&"B v2".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_event_types_are_ignored() {
        let ctx = setup().await;
        let mut source = ScriptedSource::empty();
        source.workouts = vec![workout_json(UUID_A, "A", hour(8), hour(9))];
        source.events = vec![(
            hour(11),
            json!({ "type": "archived", "workout": workout_json(UUID_A, "A v2", hour(8), hour(11)) }),
        )];
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);
        sync.bootstrap().await.unwrap();

        let outcome = sync.sync_workouts().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Applied {
                deleted: 0,
                inserted: 0,
                skipped: 0
            }
        );
        assert_eq!(ctx.workouts.list().await.unwrap()[0].title, "A");
    }

    #[tokio::test]
    async fn test_duplicate_updated_events_keep_last_payload() {
        let ctx = setup().await;
        let mut source = ScriptedSource::empty();
        source.workouts = vec![workout_json(UUID_A, "A", hour(8), hour(9))];
        source.events = vec![
            (
                hour(11),
                json!({ "type": "updated", "workout": workout_json(UUID_A, "A v2", hour(8), hour(11)) }),
            ),
            (
                hour(12),
                json!({ "type": "updated", "workout": workout_json(UUID_A, "A v3", hour(8), hour(12)) }),
            ),
        ];
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);
        sync.bootstrap().await.unwrap();

        let outcome = sync.sync_workouts().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Applied {
                deleted: 1,
                inserted: 1,
                skipped: 0
            }
        );
        assert_eq!(ctx.workouts.list().await.unwrap()[0].title, "A v3");
    }

    fn routine_json(uuid: &str, title: &str) -> Value {
        json!({
            "id": uuid,
            "title": title,
            "updated_at": hour(0).to_rfc3339(),
            "created_at": hour(0).to_rfc3339(),
            "exercises": []
        })
    }

    #[tokio::test]
    async fn test_refresh_routines_insert_new_skips_existing() {
        let ctx = setup().await;
        let mut source = ScriptedSource::empty();
        source.routines = vec![routine_json(UUID_A, "Push"), routine_json(UUID_B, "Pull")];
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);

        let first = sync.refresh_routines(RefreshMode::InsertNew).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.skipped_existing, 0);

        let second = sync.refresh_routines(RefreshMode::InsertNew).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped_existing, 2);
        assert_eq!(ctx.routines.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_templates_overwrite_all() {
        let ctx = setup().await;
        let mut source = ScriptedSource::empty();
        source.templates = vec![json!({
            "id": "79D0BB3A",
            "title": "Bench Press (Barbell)",
            "type": "weight_reps",
            "primary_muscle_group": "chest"
        })];
        let sync = Synchronizer::new(&source, &ctx.workouts, &ctx.routines, &ctx.templates);

        sync.refresh_templates(RefreshMode::OverwriteAll)
            .await
            .unwrap();
        sync.refresh_templates(RefreshMode::OverwriteAll)
            .await
            .unwrap();

        assert_eq!(ctx.templates.list().await.unwrap().len(), 1);
    }
}
