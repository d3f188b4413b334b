use clap::Subcommand;

/// Screening workflow commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ScreenCommands {
    /// Move every imported article into title/abstract screening.
    Start,
    /// Show the next article to screen.
    Next {
        /// title-abstract or full-text
        #[arg(long, default_value = "title_abstract")]
        stage: String,
    },
    /// Record a reviewer decision.
    Decide {
        article_id: i64,
        #[arg(long)]
        stage: String,
        /// include, exclude or uncertain
        #[arg(long)]
        decision: String,
        #[arg(long)]
        reviewer: i64,
        #[arg(long)]
        confidence: Option<f64>,
        #[arg(long)]
        reasoning: Option<String>,
        /// Criterion code behind an exclusion.
        #[arg(long)]
        exclusion_reason: Option<String>,
    },
    /// List decisions for an article.
    Decisions { article_id: i64 },
    /// Screen one article with the AI evaluator.
    Ai { article_id: i64 },
    /// Screen every eligible article with the AI evaluator.
    #[command(name = "ai-batch")]
    AiBatch {
        #[arg(long)]
        stage: Option<String>,
    },
    /// Show the latest AI decision for an article.
    #[command(name = "ai-decision")]
    AiDecision { article_id: i64 },
}
