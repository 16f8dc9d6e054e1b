mod catalog;
mod config_cmd;
mod plan;
mod stats;
mod sync_cmd;
mod workout;

pub use catalog::CatalogCommand;
pub use config_cmd::ConfigCommand;
pub use plan::PlanCommand;
pub use stats::StatsCommand;
pub use sync_cmd::SyncCommand;
pub use workout::WorkoutCommand;
