use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fieldops", version, about = "Field operation data toolkit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to fieldops.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a dataset directory and print its field operation report as JSON
    Import {
        path: PathBuf,

        /// Keep every record of 5 Hz source data
        #[arg(short = '5', conflicts_with = "one_hz")]
        five_hz: bool,

        /// Decimate to 1 Hz
        #[arg(short = '1')]
        one_hz: bool,

        /// Import every optional sensor group (the single-dash `-all` of other
        /// tools is spelled `--all` or `-a` here)
        #[arg(short = 'a', long)]
        all: bool,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },
    /// Write the reference prescription dataset to a directory
    Export { path: PathBuf },
    /// Re-run interactive setup
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn import_flags() {
        let cli = Cli::try_parse_from(["fieldops", "import", "data", "-a", "-5", "--pretty"]).unwrap();
        match cli.command {
            Commands::Import {
                path,
                five_hz,
                one_hz,
                all,
                pretty,
            } => {
                assert_eq!(path, PathBuf::from("data"));
                assert!(five_hz && all && pretty);
                assert!(!one_hz);
            }
            _ => panic!("expected import"),
        }

        let cli = Cli::try_parse_from(["fieldops", "-vv", "import", "data", "--all", "-1"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Import { all: true, one_hz: true, .. }));
    }

    #[test]
    fn all_flag_help_mentions_single_dash_form() {
        let help = Cli::command()
            .find_subcommand_mut("import")
            .map(|c| c.render_long_help().to_string())
            .unwrap();
        assert!(help.contains("single-dash"));
        assert!(help.contains("--all"));
    }

    #[test]
    fn frequency_flags_conflict() {
        assert!(Cli::try_parse_from(["fieldops", "import", "data", "-5", "-1"]).is_err());
    }
}
