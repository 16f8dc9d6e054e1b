mod grouping;
mod metrics;
mod pivot;

pub use grouping::{
    day_label, exercise_names, group_by_day, group_by_day_for_plan, group_exercise_titles,
    DayGroup, UNCATEGORIZED,
};
pub use metrics::{MetricDelta, MetricEngine, WeeklySetCount};
pub use pivot::{pivot_by_exercise, pivot_workouts, ColumnGroup, PivotColumn, PivotRow, PivotTable};

pub(crate) const LBS_PER_KG: f64 = 2.20462;

/// Kilograms to whole display pounds, truncated.
pub(crate) fn to_lbs(kg: f64) -> i64 {
    (kg * LBS_PER_KG) as i64
}
