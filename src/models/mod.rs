mod plan;
mod routine;
mod template;
mod workout;

pub use plan::PeriodiqPlan;
pub use routine::{Routine, RoutineExercise, RoutineSet};
pub use template::ExerciseTemplate;
pub use workout::{Workout, WorkoutExercise, WorkoutSet};
