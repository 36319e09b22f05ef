use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "runfetch")]
#[command(version)]
#[command(about = "Download and extract GitHub Actions workflow run artifacts", long_about = None)]
#[command(after_help = "Examples:\n  \
  runfetch --repo octo-org/widget --workflow CI --run 42 --names build-output --path ~/downloads\n  \
  GITHUB_TOKEN=... runfetch --repo octo-org/widget --workflow Release --run 7 --names cli,docs --path out")]
pub struct Cli {
    /// API token (defaults to $GITHUB_TOKEN)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Repository in owner/name form
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: String,

    /// Comma-separated artifact names to fetch
    #[arg(long, value_name = "NAMES")]
    pub names: String,

    /// Exact workflow display name
    #[arg(long, value_name = "NAME")]
    pub workflow: String,

    /// Run number of the workflow
    #[arg(long, value_name = "NUMBER")]
    pub run: u64,

    /// Destination directory, a leading ~ expands to the home directory
    #[arg(long, value_name = "DIR")]
    pub path: String,
}

impl Cli {
    /// Requested artifact names, trimmed, with empty items dropped.
    pub fn artifact_names(&self) -> Vec<String> {
        self.names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Expand a leading `~` against `home` and resolve to an absolute path.
///
/// Only the first `~` is replaced. An empty path resolves to the current
/// working directory.
pub fn resolve_dest(path: &str, home: Option<PathBuf>) -> std::io::Result<PathBuf> {
    let expanded = match home {
        Some(home) if path.starts_with('~') => path.replacen('~', &home.to_string_lossy(), 1),
        _ => path.to_string(),
    };

    if expanded.is_empty() {
        return std::env::current_dir();
    }

    std::path::absolute(expanded)
}
