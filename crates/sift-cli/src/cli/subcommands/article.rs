use clap::Subcommand;

/// Article commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ArticleCommands {
    /// List articles.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Get an article by ID.
    Get { id: i64 },
    /// Delete an article.
    Delete { id: i64 },
    /// Attach a full-text document to an article.
    Fulltext {
        id: i64,
        /// Location of the stored document. PDFs and text files are read
        /// for their text unless `--text-file` is given.
        path: String,
        /// File holding extracted plain text.
        #[arg(long)]
        text_file: Option<String>,
    },
    /// Articles whose latest decision at their stage is uncertain.
    Uncertain,
    /// Article counts by status and stage.
    Stats,
}
