use std::collections::HashSet;

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use uuid::Uuid;

use super::workout::{day_range, print_pivot};
use crate::analysis::{group_by_day_for_plan, group_exercise_titles, pivot_workouts};
use crate::db::{PlanRepository, RoutineRepository, WorkoutRepository};
use crate::plans::{PlanDraft, PlanManager};

#[derive(Args)]
pub struct PlanCommand {
    #[command(subcommand)]
    pub command: PlanSubcommand,
}

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Create a new training plan
    Create {
        /// Plan name
        name: String,

        /// Focus or goals for the block
        #[arg(long, short)]
        description: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: String,

        /// Routine uuid to include (can be repeated)
        #[arg(long = "routine", value_name = "UUID")]
        routines: Vec<Uuid>,
    },

    /// List plans ordered by start date
    List,

    /// Show a plan with its workouts grouped by routine day
    Show {
        /// Plan id
        id: Uuid,
    },

    /// Update a plan, replacing its routine set
    Update {
        /// Plan id
        id: Uuid,

        /// Plan name
        name: String,

        /// Focus or goals for the block
        #[arg(long, short)]
        description: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: String,

        /// Routine uuid to include (can be repeated)
        #[arg(long = "routine", value_name = "UUID")]
        routines: Vec<Uuid>,
    },

    /// Delete a plan
    Delete {
        /// Plan id
        id: Uuid,
    },
}

impl PlanCommand {
    pub async fn run(
        &self,
        plan_repo: &PlanRepository,
        routine_repo: &RoutineRepository,
        workout_repo: &WorkoutRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let manager = PlanManager::new(plan_repo);

        match &self.command {
            PlanSubcommand::Create {
                name,
                description,
                from,
                to,
                routines,
            } => {
                let draft = build_draft(name, description, from, to, routines)?;
                let created = manager.create(draft).await?;
                println!("Created plan {}:", created.id);
                println!("{}", created);
                Ok(())
            }

            PlanSubcommand::List => {
                let plans = manager.list().await?;
                if plans.is_empty() {
                    println!("No plans yet.");
                    return Ok(());
                }

                println!("{:<36}  {:<20}  FROM        TO", "ID", "NAME");
                println!("{}", "-".repeat(84));
                for plan in &plans {
                    let name: String = plan.name.chars().take(20).collect();
                    println!(
                        "{:<36}  {:<20}  {}  {}",
                        plan.id, name, plan.start_date, plan.end_date
                    );
                }
                println!("\nTotal: {} plan(s)", plans.len());
                Ok(())
            }

            PlanSubcommand::Show { id } => {
                let Some(plan) = manager.get(*id).await? else {
                    println!("No plan with id {}", id);
                    return Ok(());
                };
                println!("{}", plan);

                let routine_titles: HashSet<String> = routine_repo
                    .titles_by_uuids(&plan.routine_uuids)
                    .await?
                    .into_iter()
                    .collect();

                let (from, to) = day_range(plan.start_date, plan.end_date);
                let workouts = workout_repo.list_in_range(from, to).await?;
                if workouts.is_empty() {
                    println!("No workouts in this plan's date range.");
                    return Ok(());
                }

                for group in group_by_day_for_plan(workouts, &routine_titles) {
                    let exercises = group_exercise_titles(&group.workouts);
                    let table = pivot_workouts(&exercises, &group.workouts);
                    println!("{}", group.label);
                    println!("{}", "=".repeat(group.label.len()));
                    print_pivot(&table);
                    println!();
                }
                Ok(())
            }

            PlanSubcommand::Update {
                id,
                name,
                description,
                from,
                to,
                routines,
            } => {
                let draft = build_draft(name, description, from, to, routines)?;
                let updated = manager.update(*id, draft).await?;
                println!("Updated plan:");
                println!("{}", updated);
                Ok(())
            }

            PlanSubcommand::Delete { id } => {
                manager.delete(*id).await?;
                println!("Deleted plan {}", id);
                Ok(())
            }
        }
    }
}

fn build_draft(
    name: &str,
    description: &Option<String>,
    from: &str,
    to: &str,
    routines: &[Uuid],
) -> Result<PlanDraft, String> {
    let start_date = parse_date(from)?;
    let end_date = parse_date(to)?;
    Ok(PlanDraft {
        name: name.to_string(),
        description: description.clone(),
        start_date,
        end_date,
        routine_uuids: routines.to_vec(),
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", raw))
}
