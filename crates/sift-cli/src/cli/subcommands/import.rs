use clap::Subcommand;

/// Import commands. Re-importing a file updates matching articles.
#[derive(Clone, Debug, Subcommand)]
pub enum ImportCommands {
    /// Import a RIS export (records matched on DOI).
    Ris { file: String },
    /// Import a PubMed MEDLINE export (records matched on PMID).
    Medline { file: String },
    /// Import a PubMed CSV export (records matched on PMID).
    Csv {
        file: String,
        /// Fetch missing abstracts from PubMed after importing.
        #[arg(long)]
        fetch_abstracts: bool,
    },
}
