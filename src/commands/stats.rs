use chrono::Utc;
use clap::Args;

use crate::analysis::MetricEngine;
use crate::db::WorkoutRepository;
use crate::error::Error;

/// One-rep-max, heaviest-weight and weekly set-volume stats
#[derive(Args)]
pub struct StatsCommand {
    /// Exercise titles to report on, e.g. "Bench Press (Barbell)"
    #[arg(required = true)]
    pub exercises: Vec<String>,
}

impl StatsCommand {
    pub async fn run(&self, repo: &WorkoutRepository) -> Result<(), Box<dyn std::error::Error>> {
        let engine = MetricEngine::new(repo);
        let now = Utc::now();

        println!("One Rep Max (last 90 days, lbs)");
        println!("===============================");
        for exercise in &self.exercises {
            match engine.one_rep_max_change(exercise, now).await {
                Ok(delta) => println!("{:<30}  {:>5}  {}", exercise, delta.current, change(&delta.change)),
                Err(Error::NoData) => println!("{:<30}  no data", exercise),
                Err(err) => return Err(err.into()),
            }
        }
        println!();

        println!("Heaviest Weight (last 90 days, lbs)");
        println!("===================================");
        for exercise in &self.exercises {
            match engine.heaviest_weight_change(exercise, now).await {
                Ok(delta) => println!("{:<30}  {:>5}  {}", exercise, delta.current, change(&delta.change)),
                Err(Error::NoData) => println!("{:<30}  no data", exercise),
                Err(err) => return Err(err.into()),
            }
        }
        println!();

        println!("Sets per Week (last 90 days)");
        println!("============================");
        let weeks = engine.weekly_set_counts(now).await?;
        if weeks.is_empty() {
            println!("no data");
        }
        for week in &weeks {
            println!("{}  {:>4}", week.week_start, week.set_count);
        }

        Ok(())
    }
}

fn change(value: &Option<i64>) -> String {
    match value {
        Some(delta) => format!("{:+}", delta),
        None => "(no prior window)".to_string(),
    }
}
