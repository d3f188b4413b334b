use crate::cli::GlobalFlags;
use crate::commands::shared::project::require_project;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sift stats`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let project_id = require_project(flags)?;
    let stats = ctx.service.screening_stats(project_id).await?;
    output(&stats, flags.format)
}
