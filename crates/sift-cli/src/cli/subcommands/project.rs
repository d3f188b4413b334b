use clap::Subcommand;

/// Review project commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ProjectCommands {
    /// Create a project.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Research question the review answers.
        #[arg(long)]
        question: Option<String>,
        #[arg(long)]
        owner: Option<i64>,
    },
    /// List projects.
    List,
    /// Get a project by ID.
    Get { id: i64 },
    /// Set the review question of a project.
    #[command(name = "set-question")]
    SetQuestion { id: i64, question: String },
}
