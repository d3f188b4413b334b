use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `sift` binary.
#[derive(Debug, Parser)]
#[command(name = "sift", version, about = "Sift - systematic review screening")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory (defaults to auto-detect via .sift)
    #[arg(long, global = true)]
    pub project_dir: Option<String>,

    /// Review project id for project-scoped commands
    #[arg(short, long, global = true)]
    pub project: Option<i64>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
            project_dir: self.project_dir.clone(),
            project: self.project,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::subcommands::{CriterionCommands, ScreenCommands};
    use super::{Cli, Commands, GlobalFlags, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "sift", "--format", "table", "--limit", "10", "--verbose", "stats",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.limit, Some(10));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Stats));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["sift", "stats", "--format", "raw", "--quiet", "-p", "3"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert_eq!(cli.project, Some(3));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["sift", "--format", "xml", "stats"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_extraction_copies_values() {
        let cli = Cli::try_parse_from(["sift", "--project-dir", "/tmp/review", "stats"])
            .expect("cli should parse");
        let flags: GlobalFlags = cli.global_flags();
        assert_eq!(flags.project_dir.as_deref(), Some("/tmp/review"));
    }

    #[test]
    fn decide_parses_decision_arguments() {
        let cli = Cli::try_parse_from([
            "sift",
            "screen",
            "decide",
            "42",
            "--stage",
            "title-abstract",
            "--decision",
            "include",
            "--reviewer",
            "7",
            "--confidence",
            "0.8",
        ])
        .expect("cli should parse");

        let Commands::Screen {
            action:
                ScreenCommands::Decide {
                    article_id,
                    reviewer,
                    confidence,
                    ..
                },
        } = cli.command
        else {
            panic!("expected screen decide");
        };
        assert_eq!(article_id, 42);
        assert_eq!(reviewer, 7);
        assert_eq!(confidence, Some(0.8));
    }

    #[test]
    fn reorder_takes_id_list() {
        let cli = Cli::try_parse_from(["sift", "criterion", "reorder", "3", "1", "2"])
            .expect("cli should parse");
        let Commands::Criterion {
            action: CriterionCommands::Reorder { ids },
        } = cli.command
        else {
            panic!("expected criterion reorder");
        };
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
