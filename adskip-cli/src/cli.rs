use std::path::PathBuf;

use adskip_engine::control::ControlAction;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "adskip")]
#[command(about = "Strip ads from HLS playlists and manage the ad blackhole proxy")]
#[command(version)]
pub struct Args {
    /// Configuration file (defaults to <config dir>/adskip/config.toml)
    #[arg(short, long, global = true, env = "ADSKIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove ad segments from a playlist file or URL
    Clean {
        /// Playlist file path or http(s) URL
        input: String,

        /// Write the cleaned playlist here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report whether each URL looks like ad content
    Classify {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Print the blackhole PAC script
    Pac {
        /// Write the script here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Query or change the activation state
    Control {
        #[arg(value_enum)]
        action: ControlAction,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_control_actions() {
        let args = Args::try_parse_from(["adskip", "control", "toggle"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Control {
                action: ControlAction::ToggleRules
            }
        ));

        let args = Args::try_parse_from(["adskip", "-v", "control", "status"]).unwrap();
        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Commands::Control {
                action: ControlAction::GetStatus
            }
        ));
    }

    #[test]
    fn rejects_conflicting_verbosity() {
        assert!(Args::try_parse_from(["adskip", "-v", "-q", "pac"]).is_err());
    }

    #[test]
    fn classify_needs_a_url() {
        assert!(Args::try_parse_from(["adskip", "classify"]).is_err());
    }
}
