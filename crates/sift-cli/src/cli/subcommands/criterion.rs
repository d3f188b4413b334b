use clap::Subcommand;

/// Eligibility criterion commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CriterionCommands {
    /// Add a criterion.
    Add {
        /// inclusion or exclusion
        #[arg(long = "type")]
        criterion_type: String,
        /// Short code such as I1 or E2.
        #[arg(long)]
        code: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        rationale: Option<String>,
        /// Position within its type; appended when omitted.
        #[arg(long)]
        order: Option<i64>,
        /// Create the criterion switched off.
        #[arg(long)]
        inactive: bool,
    },
    /// List criteria.
    List {
        #[arg(long)]
        active_only: bool,
    },
    /// Get a criterion by ID.
    Get { id: i64 },
    /// Update a criterion.
    Update {
        id: i64,
        #[arg(long = "type")]
        criterion_type: Option<String>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        rationale: Option<String>,
        #[arg(long)]
        order: Option<i64>,
    },
    /// Switch a criterion on.
    Activate { id: i64 },
    /// Switch a criterion off.
    Deactivate { id: i64 },
    /// Delete a criterion.
    Delete { id: i64 },
    /// Set criterion order from an ID list.
    Reorder {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}
