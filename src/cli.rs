//! Command line front end

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use vaultsubst::{ClientBuilder, KvReader, Patcher};

/// Crate version, plus the commit it was built from when known
pub const VERSION_STRING: &str = env!("VAULTSUBST_VERSION");

/// Inject and format Vault secrets into files
#[derive(Debug, Parser)]
#[command(name = "vaultsubst", version = VERSION_STRING)]
pub struct Cli {
    /// Token delimiter
    #[arg(short, long, visible_alias = "delim", default_value = vaultsubst::DEFAULT_DELIMITER)]
    pub delimiter: String,

    /// Rewrite files instead of printing them to stdout
    #[arg(short, long)]
    pub in_place: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Permit plain http:// Vault addresses that are not loopback
    #[arg(long)]
    pub allow_insecure_http: bool,

    /// Files or directories to patch; stdin when omitted
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Log to stderr, `warn` unless `RUST_LOG` says otherwise
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let stdin_mode = cli.files.is_empty();
    if stdin_mode && std::io::stdin().is_terminal() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let patcher = Patcher::new(cli.delimiter.as_str())?;
    let mut builder = ClientBuilder::from_env()?;
    if cli.allow_insecure_http {
        builder = builder.allow_insecure_http();
    }
    let client = builder.build().context("failed to create Vault client")?;
    debug!("Using Vault at {}", client.address());

    let mut stdout = tokio::io::stdout();

    if stdin_mode {
        if cli.in_place {
            warn!("--in-place has no effect when reading from stdin");
        }
        let mut input = String::new();
        let _ = tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("failed to read stdin")?;
        let output = patcher.patch(&input, &client).await?;
        stdout.write_all(output.as_bytes()).await?;
        stdout.flush().await?;
        return Ok(());
    }

    for path in collect_targets(&cli.files, cli.recursive)? {
        patch_file(&patcher, &client, &path, cli.in_place, &mut stdout).await?;
    }
    stdout.flush().await?;
    Ok(())
}

/// Patch one file, either in place or onto `out`
pub async fn patch_file<R, W>(
    patcher: &Patcher,
    reader: &R,
    path: &Path,
    in_place: bool,
    out: &mut W,
) -> Result<()>
where
    R: KvReader + ?Sized,
    W: AsyncWrite + Unpin,
{
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let input = String::from_utf8(raw)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;

    let output = patcher
        .patch(&input, reader)
        .await
        .with_context(|| format!("failed to patch {}", path.display()))?;

    if in_place {
        tokio::fs::write(path, output.as_bytes())
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Patched {}", path.display());
    } else {
        out.write_all(output.as_bytes()).await?;
    }
    Ok(())
}

/// Expand directory arguments into the files they contain, in sorted order
pub fn collect_targets(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut targets = Vec::new();
    for path in paths {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;
        if metadata.is_dir() {
            walk_dir(path, recursive, &mut targets)?;
        } else {
            targets.push(path.clone());
        }
    }
    Ok(targets)
}

fn walk_dir(dir: &Path, recursive: bool, targets: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to read directory {}", dir.display()))?;
    entries.sort();

    for path in entries {
        let metadata = std::fs::symlink_metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?;
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            // linked files are patched, linked directories are never entered
            match std::fs::metadata(&path) {
                Ok(target) if target.is_file() => targets.push(path),
                _ => debug!("Skipping symlink {}", path.display()),
            }
        } else if file_type.is_dir() {
            if recursive {
                walk_dir(&path, recursive, targets)?;
            }
        } else if file_type.is_file() {
            targets.push(path);
        }
    }
    Ok(())
}
