use serde_json::json;
use sift_core::enums::CriterionType;
use sift_core::inputs::NewCriterion;
use sift_db::updates::criterion::CriterionUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::CriterionCommands;
use crate::commands::shared::parse::parse_enum;
use crate::commands::shared::project::require_project;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sift criterion`.
pub async fn handle(
    action: &CriterionCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let project_id = require_project(flags)?;
    match action {
        CriterionCommands::Add {
            criterion_type,
            code,
            description,
            rationale,
            order,
            inactive,
        } => {
            let mut input = NewCriterion::new(
                parse_enum::<CriterionType>(criterion_type, "type")?,
                code.clone(),
                description.clone(),
            );
            input.rationale.clone_from(rationale);
            input.order = *order;
            input.is_active = !inactive;
            let criterion = ctx.service.create_criterion(project_id, &input).await?;
            output(&criterion, flags.format)
        }
        CriterionCommands::List { active_only } => {
            let criteria = ctx.service.list_criteria(project_id, *active_only).await?;
            output(&json!({ "criteria": criteria }), flags.format)
        }
        CriterionCommands::Get { id } => {
            let criterion = ctx.service.get_criterion(project_id, *id).await?;
            output(&criterion, flags.format)
        }
        CriterionCommands::Update {
            id,
            criterion_type,
            code,
            description,
            rationale,
            order,
        } => {
            let mut builder = CriterionUpdateBuilder::new();
            if let Some(raw) = criterion_type {
                builder = builder.criterion_type(parse_enum::<CriterionType>(raw, "type")?);
            }
            if let Some(code) = code {
                builder = builder.code(code.clone());
            }
            if let Some(description) = description {
                builder = builder.description(description.clone());
            }
            if let Some(rationale) = rationale {
                builder = builder.rationale(Some(rationale.clone()));
            }
            if let Some(order) = order {
                builder = builder.order(*order);
            }
            let criterion = ctx
                .service
                .update_criterion(project_id, *id, &builder.build())
                .await?;
            output(&criterion, flags.format)
        }
        CriterionCommands::Activate { id } => {
            let criterion = ctx.service.set_criterion_active(project_id, *id, true).await?;
            output(&criterion, flags.format)
        }
        CriterionCommands::Deactivate { id } => {
            let criterion = ctx.service.set_criterion_active(project_id, *id, false).await?;
            output(&criterion, flags.format)
        }
        CriterionCommands::Delete { id } => {
            ctx.service.delete_criterion(project_id, *id).await?;
            output(&json!({ "deleted": id }), flags.format)
        }
        CriterionCommands::Reorder { ids } => {
            let criteria = ctx.service.reorder_criteria(project_id, ids).await?;
            output(&json!({ "criteria": criteria }), flags.format)
        }
    }
}
