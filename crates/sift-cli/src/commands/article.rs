use std::path::PathBuf;

use anyhow::Context;
use serde_json::json;
use sift_core::enums::{ArticleStatus, ScreeningStage};
use sift_db::repos::article::ArticleFilter;
use sift_import::fulltext;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ArticleCommands;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::commands::shared::project::require_project;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sift article`.
pub async fn handle(
    action: &ArticleCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let project_id = require_project(flags)?;
    match action {
        ArticleCommands::List {
            status,
            stage,
            offset,
        } => {
            let filter = ArticleFilter {
                status: status
                    .as_deref()
                    .map(|raw| parse_enum::<ArticleStatus>(raw, "status"))
                    .transpose()?,
                stage: stage
                    .as_deref()
                    .map(|raw| parse_enum::<ScreeningStage>(raw, "stage"))
                    .transpose()?,
                limit: Some(effective_limit(
                    None,
                    flags.limit,
                    ctx.config.general.default_limit,
                )),
                offset: *offset,
            };
            let articles = ctx.service.list_articles(project_id, &filter).await?;
            output(&json!({ "articles": articles }), flags.format)
        }
        ArticleCommands::Get { id } => {
            let article = ctx.service.get_article(project_id, *id).await?;
            output(&article, flags.format)
        }
        ArticleCommands::Delete { id } => {
            ctx.service.delete_article(project_id, *id).await?;
            output(&json!({ "deleted": id }), flags.format)
        }
        ArticleCommands::Fulltext {
            id,
            path,
            text_file,
        } => {
            let content = match text_file {
                Some(file) => Some(
                    tokio::fs::read_to_string(file)
                        .await
                        .with_context(|| format!("failed to read full text from {file}"))?,
                ),
                None => {
                    let document = PathBuf::from(path);
                    tokio::task::spawn_blocking(move || fulltext::read_text_lenient(&document))
                        .await?
                }
            };
            let article = ctx
                .service
                .attach_full_text(project_id, *id, path, content.as_deref())
                .await?;
            output(&article, flags.format)
        }
        ArticleCommands::Uncertain => {
            let articles = ctx.service.list_uncertain_articles(project_id).await?;
            output(&json!({ "articles": articles }), flags.format)
        }
        ArticleCommands::Stats => {
            let stats = ctx.service.article_stats(project_id).await?;
            output(&stats, flags.format)
        }
    }
}
