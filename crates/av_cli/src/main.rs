// crates/av_cli/src/main.rs
//
// `av`: offline CLI over the tally engine and the result seal.
// Machine output (canonical JSON or hex) goes to stdout, logs to stderr.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const SELF_VERIFY: i32 = 3;
    pub const IO: i32 = 4;
}

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args, Command};

use av_core::ProjectId;
use av_io::canonical_json::{to_canonical_json_bytes, write_canonical_file};
use av_io::loader;
use av_io::seal::{compute_seal, verify_seal, SealError};
use av_pipeline::{PipelineError, Tabulated};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// JSON shape / boundary rule failures
    Validation(String),
    /// Recomputed seal differs from the published one
    SelfVerify(String),
    /// I/O errors (read/write/path/limits)
    Io(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) | MainError::SelfVerify(m) | MainError::Io(m) => f.write_str(m),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("av: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_logging(&args);

    let rc = match run_once(&args) {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("av: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// `AV_LOG` (EnvFilter syntax) wins; otherwise the -v / --quiet level.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_env("AV_LOG").unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_once(args: &Args) -> Result<(), MainError> {
    match &args.command {
        Command::Tally { input, audit, out } => {
            let tab = av_pipeline::tabulate_file(input).map_err(map_pipeline_err)?;
            let doc = tally_doc(&tab, *audit)?;
            emit(&doc, out.as_deref())
        }
        Command::Seal { input, expect } => {
            let seal_input = loader::load_seal_input(input).map_err(map_avio_err)?;
            match expect {
                Some(hex) => {
                    verify_seal(&seal_input, hex).map_err(map_seal_err)?;
                    info!(seal = %hex, "seal verified");
                    print_line(hex)
                }
                None => print_line(&compute_seal(&seal_input)),
            }
        }
        Command::Verify { record } => {
            let rec = av_pipeline::verify_locked_file(record).map_err(map_pipeline_err)?;
            info!(vote = %rec.vote_id, "locked record verified");
            print_line(&format!("ok {}", rec.seal))
        }
        Command::Lock { input, locked_at, out } => {
            let now;
            let default_ts = match locked_at {
                Some(ts) => ts.as_str(),
                None => {
                    now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                    now.as_str()
                }
            };
            let rec = av_pipeline::lock_from_file(input, Some(default_ts)).map_err(map_pipeline_err)?;
            let doc = serde_json::to_value(&rec).map_err(|e| MainError::Io(format!("record to JSON: {e}")))?;
            emit(&doc, out.as_deref())
        }
    }
}

// ----- Output ------------------------------------------------------------------------------------

fn tally_doc(tab: &Tabulated, audit: bool) -> Result<Value, MainError> {
    let mut doc = serde_json::to_value(&tab.tally.result)
        .map_err(|e| MainError::Io(format!("result to JSON: {e}")))?;
    if audit {
        if let Value::Object(m) = &mut doc {
            let t = &tab.tally;
            m.insert("pairwise".into(), json!(t.pairwise.rows()));
            m.insert("strongestPaths".into(), json!(t.strongest_paths.rows()));
            m.insert("wins".into(), json!(t.wins));
            m.insert("condorcetWinnerId".into(), json!(tab.condorcet_winner_id().map(ProjectId::as_str)));
        }
    }
    Ok(doc)
}

fn emit(doc: &Value, out: Option<&Path>) -> Result<(), MainError> {
    if let Some(path) = out {
        write_canonical_file(path, doc).map_err(map_avio_err)?;
        debug!(path = %path.display(), "output written");
    }
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&to_canonical_json_bytes(doc))
        .and_then(|()| stdout.write_all(b"\n"))
        .map_err(|e| MainError::Io(format!("stdout: {e}")))
}

fn print_line(s: &str) -> Result<(), MainError> {
    writeln!(std::io::stdout().lock(), "{s}").map_err(|e| MainError::Io(format!("stdout: {e}")))
}

// ----- Error mapping -----------------------------------------------------------------------------

/// Map our typed errors to the exit-code table.
fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::SelfVerify(_) => SELF_VERIFY,
        MainError::Io(_) => IO,
    }
}

fn map_avio_err(e: av_io::IoError) -> MainError {
    map_pipeline_err(PipelineError::from(e))
}

fn map_seal_err(e: SealError) -> MainError {
    match e {
        SealError::Malformed(_) => MainError::Validation(e.to_string()),
        SealError::Mismatch { .. } => MainError::SelfVerify(e.to_string()),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Validate(m) => MainError::Validation(m),
        PipelineError::Io(m) => MainError::Io(m),
        PipelineError::Seal(s) => map_seal_err(s),
        PipelineError::Build(m) => MainError::Io(m),
    }
}
