use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tracklet: lidar/radar fusion with an unscented Kalman filter.
///
/// Replays recorded measurement logs, or generates and filters a synthetic
/// scenario, and reports accuracy and consistency of the estimates.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Scenario TOML file with filter tuning (and, for `simulate`, the target and sensors).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at DEBUG level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Print the fully resolved configuration as TOML and exit.
    #[arg(long, global = true, default_value_t = false)]
    pub print_config: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Filter one recorded log, or every `*.txt` log below a directory.
    Replay {
        /// Log file or directory of log files.
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the estimates as TSV. A directory when several logs are replayed.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a synthetic scenario and filter it.
    Simulate {
        /// Overrides `simulation.seed` from the config.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Where to write the estimates as TSV.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the generated measurement log in replayable form.
        #[arg(long)]
        save_log: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["tracklet", "replay", "-i", "data/log.txt", "--verbose"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Replay { input, output } => {
                assert_eq!(input, PathBuf::from("data/log.txt"));
                assert!(output.is_none());
            }
            other => panic!("wrong subcommand {:?}", other),
        }
    }

    #[test]
    fn test_simulate_seed() {
        let cli = Cli::parse_from(["tracklet", "--config", "a.toml", "simulate", "--seed", "4"]);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert!(matches!(cli.command, Command::Simulate { seed: Some(4), .. }));
    }
}
