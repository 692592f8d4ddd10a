// crates/av_cli/src/args.rs
//
// Offline CLI argument surface. Rules:
// - No networked paths (reject any scheme:// like http/https/file), outputs included
// - One subcommand per invocation: tally | seal | verify | lock
// - Verbosity: -v (info), -vv (debug), -vvv (trace); --quiet forces errors only.
//   AV_LOG, when set, overrides both.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "av",
    version,
    disable_help_subcommand = true,
    about = "Offline, deterministic Schulze tally and result seal"
)]
pub struct Args {
    /// Increase log verbosity (-v, -vv, -vvv). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Rank candidates from a `{candidates, ballots}` JSON file.
    Tally {
        input: PathBuf,
        /// Include the pairwise and strongest-path matrices.
        #[arg(long)]
        audit: bool,
        /// Also write the output as canonical JSON to this file.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Compute the seal of a seal-input JSON file (prints lowercase hex).
    Seal {
        input: PathBuf,
        /// Compare against a published seal instead of printing (exit 3 on mismatch).
        #[arg(long, value_name = "HEX")]
        expect: Option<String>,
    },

    /// Re-verify a stored locked record against its seal.
    Verify { record: PathBuf },

    /// Lock a vote: tally, seal, and emit the locked record.
    Lock {
        input: PathBuf,
        /// Lock timestamp (RFC 3339) used when the input has no `lockedAt`. Default: now.
        #[arg(long, value_name = "RFC3339")]
        locked_at: Option<String>,
        /// Also write the record as canonical JSON to this file.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Errors surfaced by argument validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            CliError::NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

impl Args {
    /// Filter directive for the log subscriber when `AV_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    fn inputs(&self) -> Vec<&Path> {
        match &self.command {
            Command::Tally { input, .. } | Command::Seal { input, .. } | Command::Lock { input, .. } => {
                vec![input.as_path()]
            }
            Command::Verify { record } => vec![record.as_path()],
        }
    }

    fn outputs(&self) -> Vec<&Path> {
        match &self.command {
            Command::Tally { out, .. } | Command::Lock { out, .. } => out.as_deref().into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// Reject any explicit URI scheme (e.g., http://, https://, file://).
#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn ensure_local_exists(p: &Path) -> Result<(), CliError> {
    ensure_local_path(p)?;
    if !p.is_file() {
        return Err(CliError::NotFound(p.display().to_string()));
    }
    Ok(())
}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

fn validate(args: Args) -> Result<Args, CliError> {
    for p in args.outputs() {
        ensure_local_path(p)?;
    }
    for p in args.inputs() {
        ensure_local_exists(p)?;
    }
    Ok(args)
}
