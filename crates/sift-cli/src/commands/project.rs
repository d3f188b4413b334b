use serde_json::json;
use sift_core::inputs::NewProject;
use sift_db::updates::project::ProjectUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ProjectCommands;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sift project`.
pub async fn handle(
    action: &ProjectCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ProjectCommands::Create {
            name,
            description,
            question,
            owner,
        } => {
            let input = NewProject {
                name: name.clone(),
                description: description.clone(),
                review_question: question.clone(),
                owner_id: *owner,
            };
            let project = ctx.service.create_project(&input).await?;
            output(&project, flags.format)
        }
        ProjectCommands::List => {
            let limit = effective_limit(None, flags.limit, ctx.config.general.default_limit);
            let projects = ctx.service.list_projects(limit).await?;
            output(&json!({ "projects": projects }), flags.format)
        }
        ProjectCommands::Get { id } => {
            let project = ctx.service.get_project(*id).await?;
            output(&project, flags.format)
        }
        ProjectCommands::SetQuestion { id, question } => {
            let update = ProjectUpdateBuilder::new()
                .review_question(Some(question.clone()))
                .build();
            let project = ctx.service.update_project(*id, &update).await?;
            output(&project, flags.format)
        }
    }
}
