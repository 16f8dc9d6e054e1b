use clap::{Args, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        // never echo the key itself
                        let mut masked = config.clone();
                        if masked.hevy_api_key.is_some() {
                            masked.hevy_api_key = Some("********".to_string());
                        }
                        println!("{}", serde_json::to_string_pretty(&masked)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        println!("Config file: {}", Config::default_config_path().display());
                        println!("database_path: {}", config.database_path.display());
                        println!("hevy_base_url: {}", config.hevy_base_url);
                        println!(
                            "hevy_api_key: {}",
                            if config.hevy_api_key.is_some() {
                                "set"
                            } else {
                                "not set"
                            }
                        );
                    }
                }
                Ok(())
            }
        }
    }
}
