//! Grouping workouts into "workout days" by title convention.
//!
//! A workout titled `"Week 3 // Push"` belongs to the day `"Push"`. The
//! convention is the second `//`-separated segment of the title, trimmed;
//! anything without one lands in the UNCATEGORIZED group.

use std::collections::HashSet;

use crate::models::Workout;

pub const UNCATEGORIZED: &str = "UNCATEGORIZED";

/// Derive the day label from a workout title.
pub fn day_label(title: &str) -> String {
    match title.split("//").nth(1).map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => UNCATEGORIZED.to_string(),
    }
}

/// One workout day: a label and its member workouts sorted by start time
/// ascending.
#[derive(Debug, Clone)]
pub struct DayGroup {
    pub label: String,
    pub workouts: Vec<Workout>,
}

impl DayGroup {
    fn earliest_start(&self) -> chrono::DateTime<chrono::Utc> {
        // members are sorted before group ordering happens
        self.workouts[0].start_time
    }
}

/// Group workouts by their title-derived day label.
///
/// Groups are ordered by the earliest start time among their members,
/// ascending, except UNCATEGORIZED which always sorts last regardless of
/// its timestamps.
pub fn group_by_day(workouts: Vec<Workout>) -> Vec<DayGroup> {
    group_internal(workouts, None)
}

/// Plan-scoped grouping: a workout keeps its extracted label only when it
/// matches one of the plan's routine titles; everything else is forced into
/// UNCATEGORIZED. Ad hoc sessions surface separately instead of polluting
/// planned-session comparisons.
pub fn group_by_day_for_plan(
    workouts: Vec<Workout>,
    routine_titles: &HashSet<String>,
) -> Vec<DayGroup> {
    group_internal(workouts, Some(routine_titles))
}

fn group_internal(workouts: Vec<Workout>, allowed: Option<&HashSet<String>>) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();

    for workout in workouts {
        let mut label = day_label(&workout.title);
        if let Some(allowed) = allowed {
            if !allowed.contains(&label) {
                label = UNCATEGORIZED.to_string();
            }
        }

        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.workouts.push(workout),
            None => groups.push(DayGroup {
                label,
                workouts: vec![workout],
            }),
        }
    }

    for group in &mut groups {
        group.workouts.sort_by_key(|w| w.start_time);
    }
    groups.sort_by_key(|g| g.earliest_start());

    if let Some(position) = groups.iter().position(|g| g.label == UNCATEGORIZED) {
        let uncategorized = groups.remove(position);
        groups.push(uncategorized);
    }

    groups
}

/// Distinct exercise titles across a set of workouts, ordered by exercise
/// position index. The sort is stable, so ties keep workout order, and the
/// first occurrence of a title wins. Exercise order reflects routine
/// structure, not insertion order.
pub fn group_exercise_titles(workouts: &[Workout]) -> Vec<String> {
    let mut indexed: Vec<(i64, &str)> = workouts
        .iter()
        .flat_map(|w| w.exercises.iter().map(|e| (e.position, e.title.as_str())))
        .collect();
    indexed.sort_by_key(|(position, _)| *position);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut titles = Vec::new();
    for (_, title) in indexed {
        if seen.insert(title) {
            titles.push(title.to_string());
        }
    }
    titles
}

/// Distinct exercise titles sorted alphabetically. Backs the exercise
/// picker view.
pub fn exercise_names(workouts: &[Workout]) -> Vec<String> {
    let mut names = group_exercise_titles(workouts);
    names.sort();
    names
}
