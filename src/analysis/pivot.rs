//! Wide per-day comparison tables.
//!
//! Rows are exercise titles; each member workout contributes one
//! (weight, reps) column pair per set position, labelled with the session
//! timestamp. Columns live in an explicit ordered structure built
//! incrementally, so first-seen order is preserved by construction.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{grouping::group_exercise_titles, to_lbs};
use crate::models::Workout;

/// One data column: a (session, sub-column) pair such as
/// `("2024-03-06 17:30", "W 2")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotColumn {
    pub session: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub exercise: String,
    /// Aligned with [`PivotTable::columns`]. `None` means the exercise was
    /// not performed that many times in that session.
    pub cells: Vec<Option<i64>>,
}

/// A run of adjacent columns sharing one session, with a derived shading
/// flag for alternate-group banding. Presentation hint only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnGroup {
    pub session: String,
    pub span: usize,
    pub shaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    pub columns: Vec<PivotColumn>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Columns grouped by session in first-seen order. Every other group is
    /// flagged for shaded rendering.
    pub fn column_groups(&self) -> Vec<ColumnGroup> {
        let mut groups: Vec<ColumnGroup> = Vec::new();
        for column in &self.columns {
            match groups.last_mut() {
                Some(group) if group.session == column.session => group.span += 1,
                _ => {
                    let shaded = groups.len() % 2 == 1;
                    groups.push(ColumnGroup {
                        session: column.session.clone(),
                        span: 1,
                        shaded,
                    });
                }
            }
        }
        groups
    }
}

fn session_label(start: DateTime<Utc>) -> String {
    start.format("%Y-%m-%d %H:%M").to_string()
}

/// Pivot a list of workouts (already in display order) against a fixed row
/// set of exercise titles.
///
/// Weight is converted from kilograms to whole pounds, truncated. Within an
/// existing set a missing weight or rep count is treated as zero; only a
/// missing set produces a null cell.
pub fn pivot_workouts(exercises: &[String], workouts: &[Workout]) -> PivotTable {
    let mut columns: Vec<PivotColumn> = Vec::new();
    let mut rows: Vec<PivotRow> = exercises
        .iter()
        .map(|title| PivotRow {
            exercise: title.clone(),
            cells: Vec::new(),
        })
        .collect();

    for workout in workouts {
        let session = session_label(workout.start_time);
        let max_sets = workout
            .exercises
            .iter()
            .map(|e| e.sets.len())
            .max()
            .unwrap_or(0);

        for position in 1..=max_sets {
            columns.push(PivotColumn {
                session: session.clone(),
                label: format!("W {}", position),
            });
            columns.push(PivotColumn {
                session: session.clone(),
                label: format!("R {}", position),
            });
        }

        for row in &mut rows {
            let mut cells: Vec<Option<i64>> = Vec::with_capacity(max_sets * 2);
            if let Some(exercise) = workout.exercises.iter().find(|e| e.title == row.exercise) {
                for set in &exercise.sets {
                    cells.push(Some(to_lbs(set.weight_kg.unwrap_or(0.0))));
                    cells.push(Some(set.reps.unwrap_or(0)));
                }
            }
            cells.resize(max_sets * 2, None);
            row.cells.extend(cells);
        }
    }

    PivotTable { columns, rows }
}

/// Pivot with the row set derived from the workouts themselves.
pub fn pivot_by_exercise(workouts: &[Workout]) -> PivotTable {
    let exercises = group_exercise_titles(workouts);
    pivot_workouts(&exercises, workouts)
}
