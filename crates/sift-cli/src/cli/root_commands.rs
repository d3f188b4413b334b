use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    ArticleCommands, CriterionCommands, ImportCommands, ProjectCommands, ScreenCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Initialize sift in a directory.
    Init(InitArgs),
    /// Review projects.
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Import a bibliographic export into the selected project.
    Import {
        #[command(subcommand)]
        action: ImportCommands,
    },
    /// Eligibility criteria.
    Criterion {
        #[command(subcommand)]
        action: CriterionCommands,
    },
    /// Articles.
    Article {
        #[command(subcommand)]
        action: ArticleCommands,
    },
    /// Screening workflow.
    Screen {
        #[command(subcommand)]
        action: ScreenCommands,
    },
    /// Screening progress for the selected project.
    Stats,
    /// View audit trail.
    Audit(AuditArgs),
}

/// Arguments for `sift init`.
#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory).
    pub path: Option<String>,
    /// Overwrite an existing `.sift/config.toml`.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `sift audit`.
#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Filter by entity type (project, article, criterion, decision).
    #[arg(long)]
    pub entity_type: Option<String>,
    /// Filter by entity id.
    #[arg(long)]
    pub entity_id: Option<i64>,
    /// Filter by action (created, status_changed, decision_recorded, ...).
    #[arg(long)]
    pub action: Option<String>,
    /// Include entries from every project, not only the selected one.
    #[arg(long)]
    pub all_projects: bool,
}
