use crate::cli::GlobalFlags;

/// Project id selected with `--project`.
pub fn require_project(flags: &GlobalFlags) -> anyhow::Result<i64> {
    flags
        .project
        .ok_or_else(|| anyhow::anyhow!("no project selected; pass --project <ID>"))
}
