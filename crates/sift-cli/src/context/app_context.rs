use std::path::PathBuf;

use anyhow::Context;
use sift_config::SiftConfig;
use sift_db::service::SiftService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: SiftService,
    pub config: SiftConfig,
    pub project_root: PathBuf,
}

impl AppContext {
    /// Open the project database described by `config`.
    pub async fn init(project_root: PathBuf, config: SiftConfig) -> anyhow::Result<Self> {
        let db_path = config.database.resolve(&project_root);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let service = SiftService::new_local(
            &db_path.to_string_lossy(),
            config.screening.uncertain_policy,
            config.database.busy_retries,
        )
        .await
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        tracing::debug!(
            path = %db_path.display(),
            policy = %config.screening.uncertain_policy,
            "sift context ready"
        );

        Ok(Self {
            service,
            config,
            project_root,
        })
    }
}
