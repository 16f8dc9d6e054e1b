//! Typed Hevy API payloads and conversion into the entity graph.
//!
//! Each raw record arrives as a `serde_json::Value` and is converted
//! individually, so one malformed record never poisons the batch it came
//! in with. Missing required identity fields (id, title, timestamps) fail
//! the record; optional numeric fields deserialize to `None`, never zero.
//! Metric code downstream depends on that distinction.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    ExerciseTemplate, Routine, RoutineExercise, RoutineSet, Workout, WorkoutExercise, WorkoutSet,
};

#[derive(Debug, Deserialize)]
struct WorkoutPayload {
    id: Uuid,
    title: String,
    #[serde(default)]
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    exercises: Vec<ExercisePayload>,
}

#[derive(Debug, Deserialize)]
struct ExercisePayload {
    index: i64,
    title: String,
    #[serde(default)]
    notes: Option<String>,
    exercise_template_id: String,
    #[serde(default)]
    superset_id: Option<i64>,
    #[serde(default)]
    sets: Vec<SetPayload>,
}

#[derive(Debug, Deserialize)]
struct SetPayload {
    index: i64,
    #[serde(rename = "type")]
    set_type: String,
    #[serde(default)]
    weight_kg: Option<f64>,
    #[serde(default)]
    reps: Option<i64>,
    #[serde(default)]
    distance_meters: Option<i64>,
    #[serde(default)]
    duration_seconds: Option<i64>,
    #[serde(default)]
    rpe: Option<f64>,
    #[serde(default)]
    custom_metric: Option<f64>,
}

/// One entry from `/workouts/events`. Tags other than `updated` and
/// `deleted` are carried through and ignored by the synchronizer.
#[derive(Debug, Deserialize)]
pub struct EventPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub workout: Value,
}

#[derive(Debug, Deserialize)]
struct WorkoutIdPayload {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct RoutinePayload {
    id: Uuid,
    title: String,
    updated_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    exercises: Vec<RoutineExercisePayload>,
}

#[derive(Debug, Deserialize)]
struct RoutineExercisePayload {
    index: i64,
    title: String,
    #[serde(default)]
    notes: Option<String>,
    exercise_template_id: String,
    #[serde(default)]
    superset_id: Option<i64>,
    #[serde(default)]
    rest_seconds: Option<i64>,
    #[serde(default)]
    sets: Vec<RoutineSetPayload>,
}

#[derive(Debug, Deserialize)]
struct RoutineSetPayload {
    index: i64,
    #[serde(rename = "type")]
    set_type: String,
    #[serde(default)]
    weight_kg: Option<f64>,
    #[serde(default)]
    reps: Option<i64>,
    #[serde(default)]
    distance_meters: Option<i64>,
    #[serde(default)]
    duration_seconds: Option<i64>,
    #[serde(default)]
    custom_metric: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TemplatePayload {
    id: String,
    title: String,
    #[serde(rename = "type")]
    category: String,
    primary_muscle_group: String,
    #[serde(default)]
    secondary_muscle_groups: Vec<String>,
    #[serde(default)]
    is_custom: bool,
}

fn malformed(kind: &str, err: serde_json::Error) -> Error {
    Error::MalformedPayload(format!("{}: {}", kind, err))
}

/// Parse one raw workout record into a fully-populated entity graph with
/// children ordered by their declared index.
pub fn parse_workout(raw: &Value) -> Result<Workout> {
    let payload: WorkoutPayload =
        serde_json::from_value(raw.clone()).map_err(|e| malformed("workout", e))?;

    let mut exercises: Vec<WorkoutExercise> = payload
        .exercises
        .into_iter()
        .map(|ex| {
            let mut sets: Vec<WorkoutSet> = ex
                .sets
                .into_iter()
                .map(|s| WorkoutSet {
                    position: s.index,
                    set_type: s.set_type,
                    weight_kg: s.weight_kg,
                    reps: s.reps,
                    distance_meters: s.distance_meters,
                    duration_seconds: s.duration_seconds,
                    rpe: s.rpe,
                    custom_metric: s.custom_metric,
                })
                .collect();
            sets.sort_by_key(|s| s.position);
            WorkoutExercise {
                position: ex.index,
                title: ex.title,
                notes: ex.notes,
                exercise_template_id: ex.exercise_template_id,
                superset_id: ex.superset_id,
                sets,
            }
        })
        .collect();
    exercises.sort_by_key(|e| e.position);

    Ok(Workout {
        uuid: payload.id,
        title: payload.title,
        description: payload.description,
        start_time: payload.start_time,
        end_time: payload.end_time,
        updated_at: payload.updated_at,
        created_at: payload.created_at,
        exercises,
    })
}

/// Parse one raw event envelope. The embedded workout stays raw so a broken
/// workout body surfaces when that record is parsed, not here.
pub fn parse_event(raw: &Value) -> Result<EventPayload> {
    serde_json::from_value(raw.clone()).map_err(|e| malformed("event", e))
}

/// Extract just the workout uuid from a raw workout body. Enough for
/// processing a `deleted` event.
pub fn parse_workout_id(raw: &Value) -> Result<Uuid> {
    let payload: WorkoutIdPayload =
        serde_json::from_value(raw.clone()).map_err(|e| malformed("workout id", e))?;
    Ok(payload.id)
}

pub fn parse_routine(raw: &Value) -> Result<Routine> {
    let payload: RoutinePayload =
        serde_json::from_value(raw.clone()).map_err(|e| malformed("routine", e))?;

    let mut exercises: Vec<RoutineExercise> = payload
        .exercises
        .into_iter()
        .map(|ex| {
            let mut sets: Vec<RoutineSet> = ex
                .sets
                .into_iter()
                .map(|s| RoutineSet {
                    position: s.index,
                    set_type: s.set_type,
                    weight_kg: s.weight_kg,
                    reps: s.reps,
                    distance_meters: s.distance_meters,
                    duration_seconds: s.duration_seconds,
                    custom_metric: s.custom_metric,
                })
                .collect();
            sets.sort_by_key(|s| s.position);
            RoutineExercise {
                position: ex.index,
                title: ex.title,
                notes: ex.notes,
                exercise_template_id: ex.exercise_template_id,
                superset_id: ex.superset_id,
                rest_seconds: ex.rest_seconds,
                sets,
            }
        })
        .collect();
    exercises.sort_by_key(|e| e.position);

    Ok(Routine {
        uuid: payload.id,
        title: payload.title,
        updated_at: payload.updated_at,
        created_at: payload.created_at,
        exercises,
    })
}

pub fn parse_template(raw: &Value) -> Result<ExerciseTemplate> {
    let payload: TemplatePayload =
        serde_json::from_value(raw.clone()).map_err(|e| malformed("exercise template", e))?;
    Ok(ExerciseTemplate {
        uuid: payload.id,
        title: payload.title,
        category: payload.category,
        primary_muscle_group: payload.primary_muscle_group,
        secondary_muscle_groups: payload.secondary_muscle_groups,
        is_custom: payload.is_custom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn workout_json() -> Value {
        json!({
            "id": "25c2ed8b-c0b8-4e2a-b99d-3215cb054b40",
            "title": "Week 3 // Push",
            "description": null,
            "start_time": "2024-03-06T17:30:00+00:00",
            "end_time": "2024-03-06T18:45:00+00:00",
            "updated_at": "2024-03-06T19:00:00+00:00",
            "created_at": "2024-03-06T19:00:00+00:00",
            "exercises": [
                {
                    "index": 1,
                    "title": "Incline Press",
                    "notes": null,
                    "exercise_template_id": "07B38369",
                    "superset_id": null,
                    "sets": [
                        {
                            "index": 1,
                            "type": "normal",
                            "weight_kg": 60.0,
                            "reps": 8,
                            "distance_meters": null,
                            "duration_seconds": null,
                            "rpe": 8.5,
                            "custom_metric": null
                        },
                        {
                            "index": 0,
                            "type": "warmup",
                            "weight_kg": 40.0,
                            "reps": null,
                            "distance_meters": null,
                            "duration_seconds": null,
                            "rpe": null,
                            "custom_metric": null
                        }
                    ]
                },
                {
                    "index": 0,
                    "title": "Bench Press (Barbell)",
                    "exercise_template_id": "79D0BB3A",
                    "sets": []
                }
            ]
        })
    }

    #[test]
    fn test_parse_workout_orders_children_by_index() {
        let workout = parse_workout(&workout_json()).unwrap();

        assert_eq!(workout.title, "Week 3 // Push");
        assert_eq!(workout.exercises.len(), 2);
        assert_eq!(workout.exercises[0].title, "Bench Press (Barbell)");
        assert_eq!(workout.exercises[1].title, "Incline Press");

        let sets = &workout.exercises[1].sets;
        assert_eq!(sets[0].set_type, "warmup");
        assert_eq!(sets[1].set_type, "normal");
    }

    #[test]
    fn test_parse_workout_preserves_null_numerics() {
        let workout = parse_workout(&workout_json()).unwrap();
        let warmup = &workout.exercises[1].sets[0];

        // null reps must stay None, not become zero
        assert_eq!(warmup.weight_kg, Some(40.0));
        assert_eq!(warmup.reps, None);
        assert_eq!(warmup.rpe, None);
    }

    #[test]
    fn test_parse_workout_missing_title_fails() {
        let mut raw = workout_json();
        raw.as_object_mut().unwrap().remove("title");

        let err = parse_workout(&raw).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_parse_workout_missing_timestamp_fails() {
        let mut raw = workout_json();
        raw.as_object_mut().unwrap().remove("updated_at");

        assert!(parse_workout(&raw).is_err());
    }

    #[test]
    fn test_parse_event_and_workout_id() {
        let raw = json!({ "type": "deleted", "workout": workout_json() });

        let event = parse_event(&raw).unwrap();
        assert_eq!(event.event_type, "deleted");
        assert_eq!(
            parse_workout_id(&event.workout).unwrap().to_string(),
            "25c2ed8b-c0b8-4e2a-b99d-3215cb054b40"
        );
    }

    #[test]
    fn test_parse_routine() {
        let raw = json!({
            "id": "dde076a7-899f-4e7c-8924-3a346ba6299a",
            "title": "Push",
            "updated_at": "2024-01-01T00:00:00+00:00",
            "created_at": "2024-01-01T00:00:00+00:00",
            "exercises": [{
                "index": 0,
                "title": "Bench Press (Barbell)",
                "exercise_template_id": "79D0BB3A",
                "rest_seconds": 180,
                "sets": [{ "index": 0, "type": "normal", "weight_kg": 80.0, "reps": 5 }]
            }]
        });

        let routine = parse_routine(&raw).unwrap();
        assert_eq!(routine.title, "Push");
        assert_eq!(routine.exercises[0].rest_seconds, Some(180));
        assert_eq!(routine.exercises[0].sets[0].reps, Some(5));
    }

    #[test]
    fn test_parse_template() {
        let raw = json!({
            "id": "79D0BB3A",
            "title": "Bench Press (Barbell)",
            "type": "weight_reps",
            "primary_muscle_group": "chest",
            "secondary_muscle_groups": ["triceps", "shoulders"],
            "is_custom": false
        });

        let template = parse_template(&raw).unwrap();
        assert_eq!(template.uuid, "79D0BB3A");
        assert_eq!(template.category, "weight_reps");
        assert_eq!(template.secondary_muscle_groups.len(), 2);
        assert!(!template.is_custom);
    }
}
