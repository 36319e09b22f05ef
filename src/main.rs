//! Main entry point for the runfetch CLI application.
//!
//! Resolves the requested workflow run, downloads the named artifacts and
//! extracts each one under the destination directory. The resolved
//! destination is printed as `download-path:` on every non-fatal
//! completion, including when no workflow or run matched.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use runfetch::{ActionsClient, Cli, RepoId, pipeline, resolve_dest};

#[tokio::main]
async fn main() -> Result<()> {
    // Progress lines and the download-path output own stdout; diagnostics
    // go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let repo: RepoId = cli.repo.parse()?;
    let names = cli.artifact_names();
    let dest = resolve_dest(&cli.path, dirs::home_dir())?;
    tracing::debug!(path = %dest.display(), "resolved destination path");

    let client = ActionsClient::new(&cli.token)?;
    pipeline::download(&client, &repo, &cli.workflow, cli.run, &names, &dest).await?;

    println!("download-path: {}", dest.display());
    tracing::info!("artifact download has finished successfully");

    Ok(())
}
