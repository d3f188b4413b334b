use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sift_config::{PROJECT_DIR, SiftConfig};

mod cli;
mod commands;
mod context;
mod output;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("sift error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    ui::init(&flags);

    if let cli::Commands::Init(args) = &cli.command {
        return commands::init::handle(args, &flags).await;
    }

    let project_root = resolve_project_root(flags.project_dir.as_deref())?;
    let config = SiftConfig::load_with_dotenv(&project_root).context("failed to load sift config")?;
    let ctx = context::AppContext::init(project_root, config)
        .await
        .context("failed to initialize sift application context")?;

    commands::dispatch::dispatch(cli.command, &ctx, &flags).await
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("SIFT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn resolve_project_root(project_dir: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(path) = project_dir {
        let explicit = PathBuf::from(path);
        if explicit.file_name().is_some_and(|name| name == PROJECT_DIR) {
            return explicit
                .parent()
                .map(std::path::Path::to_path_buf)
                .context("invalid --project-dir: '.sift' directory has no parent");
        }
        if explicit.is_dir() {
            return Ok(explicit);
        }
        anyhow::bail!(
            "invalid --project-dir '{}': directory does not exist",
            explicit.display()
        );
    }

    let start = std::env::current_dir().context("failed to read current directory")?;
    context::find_project_root(&start)
        .context("not a sift project (no .sift directory found). Run 'sift init' first.")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::resolve_project_root;

    #[test]
    fn explicit_sift_dir_resolves_to_parent() {
        let temp = TempDir::new().expect("tempdir should create");
        std::fs::create_dir(temp.path().join(".sift")).expect(".sift should create");
        let sift_dir = temp.path().join(".sift");

        let root = resolve_project_root(Some(&sift_dir.display().to_string()))
            .expect("root should resolve");
        assert_eq!(root, temp.path());
    }

    #[test]
    fn missing_explicit_dir_is_an_error() {
        let temp = TempDir::new().expect("tempdir should create");
        let missing = temp.path().join("nowhere");

        let err = resolve_project_root(Some(&missing.display().to_string()))
            .expect_err("missing dir should fail");
        assert!(err.to_string().contains("does not exist"));
    }
}
