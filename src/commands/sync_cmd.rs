//! Sync CLI commands: incremental event sync, full bootstrap, and
//! reference-data refresh.

use clap::{Args, Subcommand};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::{RoutineRepository, TemplateRepository, WorkoutRepository};
use crate::hevy::HevyClient;
use crate::sync::{BootstrapOutcome, RefreshMode, SyncOutcome, Synchronizer};

/// Sync workout data from Hevy
#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Subcommand)]
enum SyncSubcommand {
    /// Backfill the complete remote history into an empty store
    Bootstrap,

    /// Refresh exercise templates and routines from the remote catalog
    Refresh {
        /// Only refresh exercise templates
        #[arg(long)]
        templates: bool,

        /// Only refresh routines
        #[arg(long)]
        routines: bool,

        /// Replace the whole local catalog instead of inserting new entries
        #[arg(long)]
        overwrite: bool,
    },
}

impl SyncCommand {
    pub async fn run(
        &self,
        pool: &SqlitePool,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let Some(api_key) = &config.hevy_api_key else {
            return Err(
                "Hevy API key not configured. Set hevy_api_key in the config file \
                 or the HEVY_API_KEY environment variable."
                    .into(),
            );
        };

        let client = HevyClient::new(&config.hevy_base_url, api_key);
        let workouts = WorkoutRepository::new(pool.clone());
        let routines = RoutineRepository::new(pool.clone());
        let templates = TemplateRepository::new(pool.clone());
        let sync = Synchronizer::new(&client, &workouts, &routines, &templates);

        match &self.command {
            None => {
                println!("Syncing workout events...");
                match sync.sync_workouts().await? {
                    SyncOutcome::EmptyStore => {
                        println!("No local workouts yet. Run 'periodiq sync bootstrap' first.");
                    }
                    SyncOutcome::UpToDate => println!("Already up to date."),
                    SyncOutcome::Applied {
                        deleted,
                        inserted,
                        skipped,
                    } => {
                        println!(
                            "✓ {} removed, {} re-imported, {} skipped",
                            deleted, inserted, skipped
                        );
                    }
                }
                Ok(())
            }

            Some(SyncSubcommand::Bootstrap) => {
                println!("Importing complete workout history...");
                match sync.bootstrap().await? {
                    BootstrapOutcome::NotEmpty => {
                        println!("Store already has workouts; bootstrap skipped.");
                    }
                    BootstrapOutcome::Imported { inserted, skipped } => {
                        println!("✓ imported {} workout(s), {} skipped", inserted, skipped);
                    }
                }
                Ok(())
            }

            Some(SyncSubcommand::Refresh {
                templates: only_templates,
                routines: only_routines,
                overwrite,
            }) => {
                let mode = if *overwrite {
                    RefreshMode::OverwriteAll
                } else {
                    RefreshMode::InsertNew
                };
                let both = !only_templates && !only_routines;

                if *only_templates || both {
                    let outcome = sync.refresh_templates(mode).await?;
                    println!(
                        "Exercise templates: {} new, {} already present, {} malformed",
                        outcome.inserted, outcome.skipped_existing, outcome.malformed
                    );
                }
                if *only_routines || both {
                    let outcome = sync.refresh_routines(mode).await?;
                    println!(
                        "Routines: {} new, {} already present, {} malformed",
                        outcome.inserted, outcome.skipped_existing, outcome.malformed
                    );
                }
                Ok(())
            }
        }
    }
}
