use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use clap::{Args, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::analysis::{
    exercise_names, group_by_day, group_exercise_titles, pivot_by_exercise, pivot_workouts,
    PivotTable,
};
use crate::db::WorkoutRepository;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct WorkoutCommand {
    #[command(subcommand)]
    pub command: WorkoutSubcommand,
}

#[derive(Subcommand)]
pub enum WorkoutSubcommand {
    /// List stored workouts, most recent first
    List {
        /// Show at most this many workouts
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Day-grouped comparison tables for the given workout uuids
    Table {
        /// Workout uuids to compare
        #[arg(required = true)]
        uuids: Vec<Uuid>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Distinct exercise names performed in a date range
    Exercises {
        /// Start date (YYYY-MM-DD), defaults to 90 days ago
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,

        /// Also print the per-exercise comparison table for the range
        #[arg(long)]
        table: bool,
    },
}

impl WorkoutCommand {
    pub async fn run(&self, repo: &WorkoutRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            WorkoutSubcommand::List { limit } => {
                let workouts = repo.list().await?;
                if workouts.is_empty() {
                    println!("No workouts stored. Run 'periodiq sync bootstrap' first.");
                    return Ok(());
                }

                let shown = limit.unwrap_or(workouts.len());
                println!("{:<36}  {:<30}  START", "UUID", "TITLE");
                println!("{}", "-".repeat(86));
                for workout in workouts.iter().take(shown) {
                    let title: String = workout.title.chars().take(30).collect();
                    println!(
                        "{:<36}  {:<30}  {}",
                        workout.uuid,
                        title,
                        workout.start_time.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("\nTotal: {} workout(s)", workouts.len());
                Ok(())
            }

            WorkoutSubcommand::Table { uuids, format } => {
                let workouts = repo.list_by_uuids(uuids).await?;
                if workouts.is_empty() {
                    println!("No matching workouts found.");
                    return Ok(());
                }

                let groups = group_by_day(workouts);
                match format {
                    OutputFormat::Json => {
                        let mut out = Vec::with_capacity(groups.len());
                        for group in &groups {
                            let exercises = group_exercise_titles(&group.workouts);
                            let table = pivot_workouts(&exercises, &group.workouts);
                            out.push(serde_json::json!({
                                "day": group.label,
                                "column_groups": table.column_groups(),
                                "table": table,
                            }));
                        }
                        println!("{}", serde_json::to_string_pretty(&out)?);
                    }
                    OutputFormat::Text => {
                        for group in &groups {
                            let exercises = group_exercise_titles(&group.workouts);
                            let table = pivot_workouts(&exercises, &group.workouts);
                            println!("{}", group.label);
                            println!("{}", "=".repeat(group.label.len()));
                            print_pivot(&table);
                            println!();
                        }
                    }
                }
                Ok(())
            }

            WorkoutSubcommand::Exercises { from, to, table } => {
                let today = Local::now().date_naive();
                let from_date = parse_date_arg(from.as_deref(), today - Duration::days(90))?;
                let to_date = parse_date_arg(to.as_deref(), today)?;

                let (from_dt, to_dt) = day_range(from_date, to_date);
                let workouts = repo.list_in_range(from_dt, to_dt).await?;
                let names = exercise_names(&workouts);
                if names.is_empty() {
                    println!("No exercises in range.");
                    return Ok(());
                }

                for name in &names {
                    println!("{}", name);
                }
                println!("\nTotal: {} exercise(s)", names.len());

                if *table {
                    println!();
                    print_pivot(&pivot_by_exercise(&workouts));
                }
                Ok(())
            }
        }
    }
}

pub(crate) fn parse_date_arg(
    value: Option<&str>,
    default: NaiveDate,
) -> Result<NaiveDate, String> {
    match value {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", raw)),
        None => Ok(default),
    }
}

/// Inclusive day range as UTC timestamps spanning whole days.
pub(crate) fn day_range(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = (to + Duration::days(1)).and_time(NaiveTime::MIN).and_utc() - Duration::seconds(1);
    (start, end)
}

/// Render a pivot table as fixed-width text. Session dates mark each column
/// group; empty cells print as '-'.
pub(crate) fn print_pivot(table: &PivotTable) {
    const CELL: usize = 6;

    if table.is_empty() {
        println!("  (no data)");
        return;
    }

    let name_width = table
        .rows
        .iter()
        .map(|r| r.exercise.len())
        .max()
        .unwrap_or(0)
        .max("Exercise".len());

    let mut session_line = format!("{:<width$}", "", width = name_width);
    for group in table.column_groups() {
        // "2024-03-06 17:30" -> "03-06"
        let marker = group.session.get(5..10).unwrap_or(&group.session);
        session_line.push_str(&format!("{:>width$}", marker, width = group.span * CELL));
    }
    println!("{}", session_line);

    let mut label_line = format!("{:<width$}", "Exercise", width = name_width);
    for column in &table.columns {
        label_line.push_str(&format!("{:>width$}", column.label, width = CELL));
    }
    println!("{}", label_line);

    for row in &table.rows {
        let mut line = format!("{:<width$}", row.exercise, width = name_width);
        for cell in &row.cells {
            match cell {
                Some(value) => line.push_str(&format!("{:>width$}", value, width = CELL)),
                None => line.push_str(&format!("{:>width$}", "-", width = CELL)),
            }
        }
        println!("{}", line);
    }
}
