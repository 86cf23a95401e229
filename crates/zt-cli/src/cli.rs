//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::compute::ComputeArgs;
use crate::commands::track::TrackArgs;

/// Zone interval tracker.
///
/// Records which zone a subject occupies over a 30-minute session and derives
/// per-bin time and entry matrices.
#[derive(Debug, Parser)]
#[command(name = "zt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open (or resume) a session and read commands from the terminal.
    Track(TrackArgs),

    /// List stored sessions.
    Sessions {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute a matrix for a stored session and export it.
    Compute(ComputeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::exports::MatrixKind;

    #[test]
    fn parses_track_arguments() {
        let cli = Cli::try_parse_from(["zt", "track", "12", "3"]).unwrap();
        match cli.command {
            Some(Commands::Track(args)) => {
                assert_eq!(args.subject, 12);
                assert_eq!(args.day, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn compute_defaults_to_time_matrix() {
        let cli = Cli::try_parse_from(["zt", "compute", "1", "2"]).unwrap();
        let Some(Commands::Compute(args)) = cli.command else {
            panic!("expected compute");
        };
        assert_eq!(args.kind, MatrixKind::Time);

        let cli = Cli::try_parse_from(["zt", "compute", "1", "2", "--kind", "entry"]).unwrap();
        let Some(Commands::Compute(args)) = cli.command else {
            panic!("expected compute");
        };
        assert_eq!(args.kind, MatrixKind::Entry);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["zt", "sessions", "--json", "-v", "--config", "zt.toml"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("zt.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Sessions { json: true })
        ));
    }

    #[test]
    fn rejects_negative_subject() {
        assert!(Cli::try_parse_from(["zt", "track", "-1", "3"]).is_err());
    }
}
