use std::path::Path;

use anyhow::Context;
use serde_json::json;
use sift_import::pubmed::PubMedClient;
use sift_import::{ImportFormat, read_file};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ImportCommands;
use crate::commands::shared::project::require_project;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sift import`.
pub async fn handle(
    action: &ImportCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let (format, file, fetch_abstracts) = match action {
        ImportCommands::Ris { file } => (ImportFormat::Ris, file, false),
        ImportCommands::Medline { file } => (ImportFormat::Medline, file, false),
        ImportCommands::Csv {
            file,
            fetch_abstracts,
        } => (ImportFormat::Csv, file, *fetch_abstracts),
    };
    let project_id = require_project(flags)?;
    let path = Path::new(file);

    let parsed = read_file(format, path)
        .with_context(|| format!("failed to read {} export {}", format.name(), path.display()))?;
    let summary = ctx
        .service
        .import_articles(project_id, &parsed.articles, format.dedup_key())
        .await?;
    let skipped = summary.skipped + parsed.skipped as u64;
    tracing::info!(
        project_id,
        file = %path.display(),
        created = summary.created,
        updated = summary.updated,
        skipped,
        "import finished"
    );

    let mut response = json!({
        "file": path.display().to_string(),
        "format": format.name(),
        "created": summary.created,
        "updated": summary.updated,
        "skipped": skipped,
    });
    if fetch_abstracts {
        response["abstracts"] = fill_abstracts(ctx, project_id).await?;
    }
    output(&response, flags.format)
}

/// Look up abstracts on PubMed for the project's articles that lack one.
async fn fill_abstracts(ctx: &AppContext, project_id: i64) -> anyhow::Result<serde_json::Value> {
    let pmids = ctx.service.pmids_missing_abstract(project_id).await?;
    if pmids.is_empty() {
        return Ok(json!({ "requested": 0, "filled": 0, "failed_batches": 0 }));
    }
    let client = PubMedClient::from_config(&ctx.config.pubmed)?;
    let fetched = client.fetch_abstracts(&pmids).await;
    let filled = ctx
        .service
        .fill_missing_abstracts(project_id, &fetched.abstracts)
        .await?;
    tracing::info!(
        project_id,
        requested = pmids.len(),
        filled,
        failed_batches = fetched.failed_batches,
        "abstract lookup finished"
    );
    Ok(json!({
        "requested": pmids.len(),
        "filled": filled,
        "failed_batches": fetched.failed_batches,
    }))
}
