use std::path::PathBuf;

use anyhow::Context;
use serde_json::json;
use sift_config::{PROJECT_DIR, SiftConfig};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sift init`: write `.sift/config.toml` and create the database.
pub async fn handle(args: &InitArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let root = match args.path.as_deref() {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let sift_dir = root.join(PROJECT_DIR);
    std::fs::create_dir_all(&sift_dir)
        .with_context(|| format!("failed to create {}", sift_dir.display()))?;

    let config_path = SiftConfig::project_config_path(&root);
    let config_written = if config_path.exists() && !args.force {
        tracing::debug!(path = %config_path.display(), "keeping existing config");
        false
    } else {
        let rendered = toml::to_string_pretty(&SiftConfig::default())
            .context("failed to render default config")?;
        std::fs::write(&config_path, rendered)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        true
    };

    let config = SiftConfig::load(&root).context("failed to load sift config")?;
    let db_path = config.database.resolve(&root);
    AppContext::init(root.clone(), config).await?;
    tracing::info!(root = %root.display(), "sift project initialized");

    output(
        &json!({
            "root": root.display().to_string(),
            "config": config_path.display().to_string(),
            "config_written": config_written,
            "database": db_path.display().to_string(),
        }),
        flags.format,
    )
}
