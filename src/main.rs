use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod analysis;
mod commands;
mod config;
mod db;
mod error;
mod hevy;
mod models;
mod plans;
mod sync;

use commands::{
    CatalogCommand, ConfigCommand, PlanCommand, StatsCommand, SyncCommand, WorkoutCommand,
};
use config::Config;
use db::{init_db, PlanRepository, RoutineRepository, TemplateRepository, WorkoutRepository};

#[derive(Parser)]
#[command(name = "periodiq")]
#[command(version)]
#[command(about = "Workout sync and periodization analytics for Hevy", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync workout data from Hevy
    Sync(SyncCommand),

    /// Browse stored workouts and comparison tables
    Workout(WorkoutCommand),

    /// Manage training plans
    Plan(PlanCommand),

    /// One-rep-max, heaviest-weight and weekly volume stats
    Stats(StatsCommand),

    /// Browse synced routines and exercise templates
    Catalog(CatalogCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("periodiq=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Sync(cmd)) => {
            let pool = init_db(&config.database_path).await?;
            cmd.run(&pool, &config).await?;
        }
        Some(Commands::Workout(cmd)) => {
            let pool = init_db(&config.database_path).await?;
            let repo = WorkoutRepository::new(pool);
            cmd.run(&repo).await?;
        }
        Some(Commands::Plan(cmd)) => {
            let pool = init_db(&config.database_path).await?;
            let plan_repo = PlanRepository::new(pool.clone());
            let routine_repo = RoutineRepository::new(pool.clone());
            let workout_repo = WorkoutRepository::new(pool);
            cmd.run(&plan_repo, &routine_repo, &workout_repo).await?;
        }
        Some(Commands::Stats(cmd)) => {
            let pool = init_db(&config.database_path).await?;
            let repo = WorkoutRepository::new(pool);
            cmd.run(&repo).await?;
        }
        Some(Commands::Catalog(cmd)) => {
            let pool = init_db(&config.database_path).await?;
            let routine_repo = RoutineRepository::new(pool.clone());
            let template_repo = TemplateRepository::new(pool);
            cmd.run(&routine_repo, &template_repo).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
