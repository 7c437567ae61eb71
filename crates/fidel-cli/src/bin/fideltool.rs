use clap::{Parser, Subcommand};

use fidel_cli::commands::{config_ops, mapping_ops, replay_ops};

#[derive(Parser)]
#[command(name = "fideltool", about = "Fidel mapping and engine diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mapping table tools
    Mapping {
        #[command(subcommand)]
        action: MappingAction,
    },
    /// Settings file tools
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Type text into a virtual field and show the result
    Replay {
        /// Text to type, one key per character
        text: String,
        /// Mapping file (default: built-in table)
        #[arg(long)]
        mapping: Option<String>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MappingAction {
    /// Print the built-in mapping table
    Export,
    /// Check a mapping file
    Validate {
        /// Mapping CSV file
        file: String,
    },
    /// Show how a sequence classifies and what it can still become
    Probe {
        /// Latin sequence
        sequence: String,
        /// Mapping file (default: built-in table)
        #[arg(long)]
        mapping: Option<String>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the default settings
    Export,
    /// Check a settings file
    Validate {
        /// Settings TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Mapping { action } => match action {
            MappingAction::Export => mapping_ops::mapping_export(),
            MappingAction::Validate { file } => mapping_ops::mapping_validate(&file),
            MappingAction::Probe { sequence, mapping } => {
                mapping_ops::mapping_probe(&sequence, mapping.as_deref())
            }
        },
        Command::Settings { action } => match action {
            SettingsAction::Export => config_ops::settings_export(),
            SettingsAction::Validate { file } => config_ops::settings_validate(&file),
        },
        Command::Replay {
            text,
            mapping,
            json,
        } => replay_ops::replay_cmd(&text, mapping.as_deref(), json),
    }
}
