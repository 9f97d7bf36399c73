//! CLI command-name contract for logging fields.

use crate::cli::parse::Commands;

/// Command name recorded on the `command` log field.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Start { .. } => "start",
        Commands::Resume { .. } => "resume",
        Commands::List { .. } => "list",
        Commands::Show { .. } => "show",
        Commands::Watch { .. } => "watch",
    }
}
