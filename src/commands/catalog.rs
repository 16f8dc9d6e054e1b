use clap::{Args, Subcommand};

use crate::db::{RoutineRepository, TemplateRepository};

/// Browse synced reference data
#[derive(Args)]
pub struct CatalogCommand {
    #[command(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// List synced routines
    Routines,

    /// List the exercise-template catalog
    Templates,
}

impl CatalogCommand {
    pub async fn run(
        &self,
        routine_repo: &RoutineRepository,
        template_repo: &TemplateRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CatalogSubcommand::Routines => {
                let routines = routine_repo.list().await?;
                if routines.is_empty() {
                    println!("No routines synced. Run 'periodiq sync refresh --routines'.");
                    return Ok(());
                }

                println!("{:<36}  {:<30}  EXERCISES", "UUID", "TITLE");
                println!("{}", "-".repeat(80));
                for routine in &routines {
                    let title: String = routine.title.chars().take(30).collect();
                    println!(
                        "{:<36}  {:<30}  {}",
                        routine.uuid,
                        title,
                        routine.exercises.len()
                    );
                }
                println!("\nTotal: {} routine(s)", routines.len());
                Ok(())
            }

            CatalogSubcommand::Templates => {
                let templates = template_repo.list().await?;
                if templates.is_empty() {
                    println!("No templates synced. Run 'periodiq sync refresh --templates'.");
                    return Ok(());
                }

                println!("{:<10}  {:<30}  {:<14}  MUSCLES", "ID", "TITLE", "TYPE");
                println!("{}", "-".repeat(80));
                for template in &templates {
                    let title: String = template.title.chars().take(30).collect();
                    let mut muscles = vec![template.primary_muscle_group.clone()];
                    muscles.extend(template.secondary_muscle_groups.iter().cloned());
                    println!(
                        "{:<10}  {:<30}  {:<14}  {}",
                        template.uuid,
                        title,
                        template.category,
                        muscles.join(", ")
                    );
                }
                println!("\nTotal: {} template(s)", templates.len());
                Ok(())
            }
        }
    }
}
