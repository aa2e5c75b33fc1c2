//! Command-line interface for tictactoe_lab.

use crate::providers::GameMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tic-tac-toe lab - play against remote agents and train new ones
#[derive(Parser, Debug)]
#[command(name = "tictactoe_lab")]
#[command(about = "Play tic-tac-toe against remote agents and follow training jobs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "tictactoe_lab.toml")]
    pub config: PathBuf,

    /// Server URL, overriding the config file and environment
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game in the terminal
    Play {
        /// Who produces the agent's moves
        #[arg(short, long, value_enum, default_value_t = GameMode::Random)]
        mode: GameMode,
    },

    /// Submit a training job and follow its progress
    Train {
        /// Generations to evolve (config default if omitted)
        #[arg(long)]
        generations: Option<i64>,

        /// Games per individual each generation
        #[arg(long)]
        games: Option<i64>,

        /// Individuals per generation
        #[arg(long)]
        population: Option<i64>,
    },

    /// Show whether a trained model is loaded
    ModelStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_mode_and_global_flags() {
        let cli = Cli::try_parse_from([
            "tictactoe_lab",
            "play",
            "--mode",
            "neural",
            "--server-url",
            "http://example:5001",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Play { mode: GameMode::Neural }));
        assert_eq!(cli.server_url.as_deref(), Some("http://example:5001"));
        assert_eq!(cli.config, PathBuf::from("tictactoe_lab.toml"));
    }

    #[test]
    fn test_train_accepts_negative_values_for_validation_later() {
        let cli = Cli::try_parse_from(["tictactoe_lab", "train", "--generations", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Train {
                generations: Some(5),
                games: None,
                population: None
            }
        ));
    }
}
