//! Point-in-time and windowed analytics over stored sets.
//!
//! All aggregates ignore sets without a positive rep count or without a
//! recorded weight. An unset value never counts as zero here: a set with
//! `reps = 0` and a set with `reps = null` are both excluded, which is why
//! the parser keeps the distinction alive.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use super::to_lbs;
use crate::db::WorkoutRepository;
use crate::error::{Error, Result};
use crate::models::Workout;

const WINDOW_DAYS: i64 = 90;

/// A windowed metric in whole pounds: the current 90-day value and the
/// change against the preceding 90 days. `change` is `None` when the
/// previous window has no qualifying sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDelta {
    pub current: i64,
    pub change: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklySetCount {
    /// Monday of the ISO week.
    pub week_start: NaiveDate,
    pub set_count: i64,
}

pub struct MetricEngine<'a> {
    workouts: &'a WorkoutRepository,
}

impl<'a> MetricEngine<'a> {
    pub fn new(workouts: &'a WorkoutRepository) -> Self {
        Self { workouts }
    }

    /// Best Epley one-rep-max estimate for an exercise in the trailing 90
    /// days, with the change against the preceding 90 days.
    ///
    /// Returns [`Error::NoData`] when the current window has no qualifying
    /// sets, which is not the same thing as a zero value.
    pub async fn one_rep_max_change(
        &self,
        exercise: &str,
        now: DateTime<Utc>,
    ) -> Result<MetricDelta> {
        self.windowed_change(exercise, now, best_one_rep_max_kg).await
    }

    /// Heaviest weight moved for an exercise, same windows and filters.
    pub async fn heaviest_weight_change(
        &self,
        exercise: &str,
        now: DateTime<Utc>,
    ) -> Result<MetricDelta> {
        self.windowed_change(exercise, now, heaviest_weight_kg).await
    }

    async fn windowed_change(
        &self,
        exercise: &str,
        now: DateTime<Utc>,
        aggregate: fn(&[Workout], &str) -> Option<f64>,
    ) -> Result<MetricDelta> {
        let window = Duration::days(WINDOW_DAYS);
        let current_window = self.workouts.list_in_range(now - window, now).await?;
        // the previous window ends just before the current one begins
        let previous_window = self
            .workouts
            .list_in_range(now - window * 2, now - window - Duration::seconds(1))
            .await?;

        let current_kg = aggregate(&current_window, exercise).ok_or(Error::NoData)?;
        let current = to_lbs(current_kg);
        let change = aggregate(&previous_window, exercise).map(|prev_kg| current - to_lbs(prev_kg));

        Ok(MetricDelta { current, change })
    }

    /// Number of sets per ISO week (Monday start) over the trailing 90
    /// days, ascending by week.
    pub async fn weekly_set_counts(&self, now: DateTime<Utc>) -> Result<Vec<WeeklySetCount>> {
        let from = now - Duration::days(WINDOW_DAYS);
        let workouts = self.workouts.list_in_range(from, now).await?;

        let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for workout in &workouts {
            let monday = week_start(workout.start_time.date_naive());
            *buckets.entry(monday).or_insert(0) += workout.set_count() as i64;
        }

        Ok(buckets
            .into_iter()
            .map(|(week_start, set_count)| WeeklySetCount {
                week_start,
                set_count,
            })
            .collect())
    }
}

/// Epley estimate: `weight * (1 + reps / 30)`.
fn epley(weight_kg: f64, reps: i64) -> f64 {
    weight_kg * (1.0 + reps as f64 / 30.0)
}

fn qualifying_values(
    workouts: &[Workout],
    exercise: &str,
    value: fn(f64, i64) -> f64,
) -> Option<f64> {
    workouts
        .iter()
        .flat_map(|w| w.exercises.iter())
        .filter(|e| e.title == exercise)
        .flat_map(|e| e.sets.iter())
        .filter_map(|s| match (s.weight_kg, s.reps) {
            (Some(weight), Some(reps)) if reps > 0 => Some(value(weight, reps)),
            _ => None,
        })
        .fold(None, |best: Option<f64>, v| {
            Some(best.map_or(v, |b| b.max(v)))
        })
}

fn best_one_rep_max_kg(workouts: &[Workout], exercise: &str) -> Option<f64> {
    qualifying_values(workouts, exercise, epley)
}

fn heaviest_weight_kg(workouts: &[Workout], exercise: &str) -> Option<f64> {
    qualifying_values(workouts, exercise, |weight, _| weight)
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}
