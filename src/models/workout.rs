use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed training session imported from Hevy.
///
/// Workouts are only ever written by the synchronizer and only ever removed
/// by a remote delete or replace event. Exercises and sets live and die with
/// their parent workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub uuid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub exercises: Vec<WorkoutExercise>,
}

/// One exercise within a workout.
///
/// `position` defines display order, which is not necessarily insertion
/// order. `exercise_template_id` is a soft reference: the template catalog
/// may not contain a matching row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub position: i64,
    pub title: String,
    pub notes: Option<String>,
    pub exercise_template_id: String,
    pub superset_id: Option<i64>,
    pub sets: Vec<WorkoutSet>,
}

/// One set within an exercise. Every numeric dimension is independently
/// optional: a null value means "not recorded", which is never the same as
/// zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub position: i64,
    pub set_type: String,
    pub weight_kg: Option<f64>,
    pub reps: Option<i64>,
    pub distance_meters: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub rpe: Option<f64>,
    pub custom_metric: Option<f64>,
}

impl Workout {
    /// Total number of sets across all exercises.
    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}
