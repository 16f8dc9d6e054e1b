use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reusable session template mirrored from Hevy. Structurally parallel to
/// [`crate::models::Workout`] but describes a type of session rather than a
/// completed instance, so it carries no start or end time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routine {
    pub uuid: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub exercises: Vec<RoutineExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineExercise {
    pub position: i64,
    pub title: String,
    pub notes: Option<String>,
    pub exercise_template_id: String,
    pub superset_id: Option<i64>,
    /// Planned rest between sets, seconds.
    pub rest_seconds: Option<i64>,
    pub sets: Vec<RoutineSet>,
}

/// A planned set. No perceived-exertion field: RPE is only recorded against
/// performed sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineSet {
    pub position: i64,
    pub set_type: String,
    pub weight_kg: Option<f64>,
    pub reps: Option<i64>,
    pub distance_meters: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub custom_metric: Option<f64>,
}
