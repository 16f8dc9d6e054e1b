use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::error::Result;
use crate::models::{Routine, RoutineExercise, RoutineSet};

pub struct RoutineRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct RoutineRow {
    uuid: String,
    title: String,
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
    rest_seconds: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct SetRow {
    position: i64,
    set_type: String,
    weight_kg: Option<f64>,
    reps: Option<i64>,
    distance_meters: Option<i64>,
    duration_seconds: Option<i64>,
    custom_metric: Option<f64>,
}

impl RoutineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn existing_uuids(&self) -> Result<Vec<Uuid>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT uuid FROM routines")
            .fetch_all(&self.pool)
            .await?;
        let mut uuids = Vec::with_capacity(rows.len());
        for (raw,) in rows {
            uuids.push(parse_uuid(&raw)?);
        }
        Ok(uuids)
    }

    pub async fn insert_all(&self, routines: &[Routine]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for routine in routines {
            insert_routine(&mut tx, routine).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Overwrite-all refresh: drop the whole catalog and bulk-insert the
    /// fresh one in a single transaction.
    pub async fn replace_all(&self, routines: &[Routine]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM routines").execute(&mut *tx).await?;
        for routine in routines {
            insert_routine(&mut tx, routine).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Routine>> {
        let rows: Vec<RoutineRow> = sqlx::query_as("SELECT * FROM routines ORDER BY title")
            .fetch_all(&self.pool)
            .await?;

        let mut routines = Vec::with_capacity(rows.len());
        for row in rows {
            routines.push(self.hydrate(row).await?);
        }
        Ok(routines)
    }

    /// Titles for a set of routine references, skipping uuids that no
    /// longer resolve (routines may be deleted remotely at any time).
    pub async fn titles_by_uuids(&self, uuids: &[Uuid]) -> Result<Vec<String>> {
        let mut titles = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            let title: Option<(String,)> =
                sqlx::query_as("SELECT title FROM routines WHERE uuid = ?")
                    .bind(uuid.to_string())
                    .fetch_optional(&self.pool)
                    .await?;
            if let Some((title,)) = title {
                titles.push(title);
            }
        }
        Ok(titles)
    }

    async fn hydrate(&self, row: RoutineRow) -> Result<Routine> {
        let exercise_rows: Vec<ExerciseRow> = sqlx::query_as(
            "SELECT id, position, title, notes, exercise_template_id, superset_id, rest_seconds \
             FROM routine_exercises WHERE routine_uuid = ? ORDER BY position",
        )
        .bind(&row.uuid)
        .fetch_all(&self.pool)
        .await?;

        let mut exercises = Vec::with_capacity(exercise_rows.len());
        for exercise_row in exercise_rows {
            let set_rows: Vec<SetRow> = sqlx::query_as(
                "SELECT position, set_type, weight_kg, reps, distance_meters, \
                        duration_seconds, custom_metric \
                 FROM routine_sets WHERE exercise_id = ? ORDER BY position",
            )
            .bind(exercise_row.id)
            .fetch_all(&self.pool)
            .await?;

            exercises.push(RoutineExercise {
                position: exercise_row.position,
                title: exercise_row.title,
                notes: exercise_row.notes,
                exercise_template_id: exercise_row.exercise_template_id,
                superset_id: exercise_row.superset_id,
                rest_seconds: exercise_row.rest_seconds,
                sets: set_rows
                    .into_iter()
                    .map(|s| RoutineSet {
                        position: s.position,
                        set_type: s.set_type,
                        weight_kg: s.weight_kg,
                        reps: s.reps,
                        distance_meters: s.distance_meters,
                        duration_seconds: s.duration_seconds,
                        custom_metric: s.custom_metric,
                    })
                    .collect(),
            });
        }

        Ok(Routine {
            uuid: parse_uuid(&row.uuid)?,
            title: row.title,
            updated_at: parse_timestamp(&row.updated_at)?,
            created_at: parse_timestamp(&row.created_at)?,
            exercises,
        })
    }
}

async fn insert_routine(tx: &mut Transaction<'_, Sqlite>, routine: &Routine) -> Result<()> {
    sqlx::query(
        "INSERT INTO routines (uuid, title, updated_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(routine.uuid.to_string())
    .bind(&routine.title)
    .bind(routine.updated_at.to_rfc3339())
    .bind(routine.created_at.to_rfc3339())
    .execute(&mut **tx)
    .await?;

    for exercise in &routine.exercises {
        let result = sqlx::query(
            r#"
            INSERT INTO routine_exercises (routine_uuid, position, title, notes,
                                           exercise_template_id, superset_id, rest_seconds)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(routine.uuid.to_string())
        .bind(exercise.position)
        .bind(&exercise.title)
        .bind(&exercise.notes)
        .bind(&exercise.exercise_template_id)
        .bind(exercise.superset_id)
        .bind(exercise.rest_seconds)
        .execute(&mut **tx)
        .await?;

        let exercise_id = result.last_insert_rowid();
        for set in &exercise.sets {
            sqlx::query(
                r#"
                INSERT INTO routine_sets (exercise_id, position, set_type, weight_kg, reps,
                                          distance_meters, duration_seconds, custom_metric)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(exercise_id)
            .bind(set.position)
            .bind(&set.set_type)
            .bind(set.weight_kg)
            .bind(set.reps)
            .bind(set.distance_meters)
            .bind(set.duration_seconds)
            .bind(set.custom_metric)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}
