use serde_json::json;
use sift_core::enums::{AuditAction, EntityType};
use sift_db::repos::audit::AuditFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::commands::shared::project::require_project;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sift audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let project_id = if args.all_projects {
        None
    } else {
        Some(require_project(flags)?)
    };
    let filter = AuditFilter {
        project_id,
        entity_type: args
            .entity_type
            .as_deref()
            .map(|raw| parse_enum::<EntityType>(raw, "entity type"))
            .transpose()?,
        entity_id: args.entity_id,
        action: args
            .action
            .as_deref()
            .map(|raw| parse_enum::<AuditAction>(raw, "action"))
            .transpose()?,
        limit: Some(effective_limit(
            None,
            flags.limit,
            ctx.config.general.default_limit,
        )),
    };
    let entries = ctx.service.query_audit(&filter).await?;
    output(&json!({ "entries": entries }), flags.format)
}
