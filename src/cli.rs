use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rainfall-dash",
    version,
    about = "Monthly rainfall statistics for a weather station"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch once and print monthly statistics (default)
    Report {
        /// Year to report; defaults to the current year or the latest with data
        #[arg(short, long)]
        year: Option<i32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List years that contain observations
    Years,
    /// Keep refreshing on the configured interval until Ctrl-C
    Watch {
        #[arg(short, long)]
        year: Option<i32>,

        #[arg(long)]
        json: bool,
    },
    /// Validate config and test the store connection
    Check,
    /// Re-run interactive setup
    Init,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Report {
            year: None,
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_report() {
        let cli = Cli::parse_from(["rainfall-dash"]);
        assert!(cli.command.is_none());
        assert!(matches!(
            cli.command.unwrap_or_default(),
            Commands::Report {
                year: None,
                json: false
            }
        ));
    }

    #[test]
    fn parses_report_year_and_verbosity() {
        let cli = Cli::parse_from(["rainfall-dash", "-vv", "report", "--year", "2024", "--json"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Report { year, json }) => {
                assert_eq!(year, Some(2024));
                assert!(json);
            }
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["rainfall-dash", "watch", "--config", "/tmp/c.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
        assert!(matches!(cli.command, Some(Commands::Watch { .. })));
    }
}
