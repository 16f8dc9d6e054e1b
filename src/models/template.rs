use serde::{Deserialize, Serialize};

/// Exercise catalog entry. `uuid` is Hevy's template identifier, which for
/// library exercises is a short hex code rather than a real UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    pub uuid: String,
    pub title: String,
    pub category: String,
    pub primary_muscle_group: String,
    pub secondary_muscle_groups: Vec<String>,
    pub is_custom: bool,
}
