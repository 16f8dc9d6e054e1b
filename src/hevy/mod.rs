mod api;
mod payload;

pub use api::HevyClient;
pub use payload::{
    parse_event, parse_routine, parse_template, parse_workout, parse_workout_id, EventPayload,
};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;

/// Remote source of workout data.
///
/// The Hevy API client is the only production implementation; the
/// synchronizer is written against this trait so its protocol can be tested
/// with a scripted source.
pub trait WorkoutSource {
    /// Fetch the complete remote workout history.
    async fn fetch_workouts(&self) -> Result<Vec<Value>>;

    /// Fetch change events with a timestamp strictly after `since`.
    async fn fetch_workout_events(&self, since: DateTime<Utc>) -> Result<Vec<Value>>;

    /// Fetch the full exercise-template catalog.
    async fn fetch_exercise_templates(&self) -> Result<Vec<Value>>;

    /// Fetch the full routine catalog.
    async fn fetch_routines(&self) -> Result<Vec<Value>>;
}
