use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::error::Result;
use crate::models::{Workout, WorkoutExercise, WorkoutSet};

/// Persistence for the workout hierarchy.
///
/// Reads return fully-materialized graphs (exercises and sets included) so
/// nothing downstream ever touches the pool after a query scope closes.
pub struct WorkoutRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct WorkoutRow {
    uuid: String,
    title: String,
    description: Option<String>,
    start_time: String,
    end_time: String,
    updated_at: String,
    created_at: String,
}

#[derive(sqlx::FromRow)]
struct ExerciseRow {
    id: i64,
    position: i64,
    title: String,
    notes: Option<String>,
    exercise_template_id: String,
    superset_id: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct SetRow {
    position: i64,
    set_type: String,
    weight_kg: Option<f64>,
    reps: Option<i64>,
    distance_meters: Option<i64>,
    duration_seconds: Option<i64>,
    rpe: Option<f64>,
    custom_metric: Option<f64>,
}

impl WorkoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// The sync watermark: latest `updated_at` across all stored workouts.
    /// Derived from stored rows, never tracked separately, so a rolled-back
    /// sync leaves it exactly where it was.
    pub async fn max_updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        let max: Option<String> = sqlx::query_scalar("SELECT MAX(updated_at) FROM workouts")
            .fetch_one(&self.pool)
            .await?;

        match max {
            Some(value) => Ok(Some(parse_timestamp(&value)?)),
            None => Ok(None),
        }
    }

    /// Insert a batch of workouts in one transaction.
    pub async fn insert_all(&self, workouts: &[Workout]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for workout in workouts {
            insert_workout(&mut tx, workout).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// The sync replace step: delete stale workouts, then insert their
    /// replacements, atomically. A failure rolls the whole step back, so a
    /// crash can never leave both an old and a new copy, nor neither.
    ///
    /// Deletes are idempotent: a uuid with no local row is not an error.
    pub async fn replace(&self, delete_uuids: &[Uuid], inserts: &[Workout]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for uuid in delete_uuids {
            // CASCADE removes exercises and sets
            sqlx::query("DELETE FROM workouts WHERE uuid = ?")
                .bind(uuid.to_string())
                .execute(&mut *tx)
                .await?;
        }

        for workout in inserts {
            insert_workout(&mut tx, workout).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// All workouts, most recent first. Backs the workout list view.
    pub async fn list(&self) -> Result<Vec<Workout>> {
        let rows: Vec<WorkoutRow> =
            sqlx::query_as("SELECT * FROM workouts ORDER BY start_time DESC")
                .fetch_all(&self.pool)
                .await?;
        self.hydrate_all(rows).await
    }

    /// Workouts for a uuid set, ordered by start time ascending. Grouping
    /// and pivot code depend on this ordering being stable input.
    pub async fn list_by_uuids(&self, uuids: &[Uuid]) -> Result<Vec<Workout>> {
        let mut workouts = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            let row: Option<WorkoutRow> = sqlx::query_as("SELECT * FROM workouts WHERE uuid = ?")
                .bind(uuid.to_string())
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = row {
                workouts.push(self.hydrate(row).await?);
            }
        }
        workouts.sort_by_key(|w| w.start_time);
        Ok(workouts)
    }

    /// Workouts whose start time falls inside `[from, to]`, ascending.
    pub async fn list_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Workout>> {
        let rows: Vec<WorkoutRow> = sqlx::query_as(
            "SELECT * FROM workouts WHERE start_time >= ? AND start_time <= ? ORDER BY start_time",
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn hydrate_all(&self, rows: Vec<WorkoutRow>) -> Result<Vec<Workout>> {
        let mut workouts = Vec::with_capacity(rows.len());
        for row in rows {
            workouts.push(self.hydrate(row).await?);
        }
        Ok(workouts)
    }

    async fn hydrate(&self, row: WorkoutRow) -> Result<Workout> {
        let exercise_rows: Vec<ExerciseRow> = sqlx::query_as(
            "SELECT id, position, title, notes, exercise_template_id, superset_id \
             FROM workout_exercises WHERE workout_uuid = ? ORDER BY position",
        )
        .bind(&row.uuid)
        .fetch_all(&self.pool)
        .await?;

        let mut exercises = Vec::with_capacity(exercise_rows.len());
        for exercise_row in exercise_rows {
            let set_rows: Vec<SetRow> = sqlx::query_as(
                "SELECT position, set_type, weight_kg, reps, distance_meters, \
                        duration_seconds, rpe, custom_metric \
                 FROM workout_sets WHERE exercise_id = ? ORDER BY position",
            )
            .bind(exercise_row.id)
            .fetch_all(&self.pool)
            .await?;

            exercises.push(WorkoutExercise {
                position: exercise_row.position,
                title: exercise_row.title,
                notes: exercise_row.notes,
                exercise_template_id: exercise_row.exercise_template_id,
                superset_id: exercise_row.superset_id,
                sets: set_rows
                    .into_iter()
                    .map(|s| WorkoutSet {
                        position: s.position,
                        set_type: s.set_type,
                        weight_kg: s.weight_kg,
                        reps: s.reps,
                        distance_meters: s.distance_meters,
                        duration_seconds: s.duration_seconds,
                        rpe: s.rpe,
                        custom_metric: s.custom_metric,
                    })
                    .collect(),
            });
        }

        Ok(Workout {
            uuid: parse_uuid(&row.uuid)?,
            title: row.title,
            description: row.description,
            start_time: parse_timestamp(&row.start_time)?,
            end_time: parse_timestamp(&row.end_time)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            created_at: parse_timestamp(&row.created_at)?,
            exercises,
        })
    }
}

async fn insert_workout(tx: &mut Transaction<'_, Sqlite>, workout: &Workout) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO workouts (uuid, title, description, start_time, end_time, updated_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(workout.uuid.to_string())
    .bind(&workout.title)
    .bind(&workout.description)
    .bind(workout.start_time.to_rfc3339())
    .bind(workout.end_time.to_rfc3339())
    .bind(workout.updated_at.to_rfc3339())
    .bind(workout.created_at.to_rfc3339())
    .execute(&mut **tx)
    .await?;

    for exercise in &workout.exercises {
        let result = sqlx::query(
            r#"
            INSERT INTO workout_exercises (workout_uuid, position, title, notes, exercise_template_id, superset_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(workout.uuid.to_string())
        .bind(exercise.position)
        .bind(&exercise.title)
        .bind(&exercise.notes)
        .bind(&exercise.exercise_template_id)
        .bind(exercise.superset_id)
        .execute(&mut **tx)
        .await?;

        let exercise_id = result.last_insert_rowid();
        for set in &exercise.sets {
            sqlx::query(
                r#"
                INSERT INTO workout_sets (exercise_id, position, set_type, weight_kg, reps,
                                          distance_meters, duration_seconds, rpe, custom_metric)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(exercise_id)
            .bind(set.position)
            .bind(&set.set_type)
            .bind(set.weight_kg)
            .bind(set.reps)
            .bind(set.distance_meters)
            .bind(set.duration_seconds)
            .bind(set.rpe)
            .bind(set.custom_metric)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}
