#![forbid(unsafe_code)]

//! Command line for `rewind-replay`.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use rewind_runtime::undo::{HistoryConfig, TypingConfig};

use crate::trace::{ReplayError, Summary, Trace, replay};

#[derive(Debug, Parser)]
#[command(
    name = "rewind-replay",
    about = "Replay a scripted editing session and print the resulting undo history",
    version
)]
pub struct Cli {
    /// Trace file (JSON), or `-` for stdin.
    pub trace: PathBuf,

    /// Pretty-print the JSON summary.
    #[arg(long)]
    pub pretty: bool,

    /// Override `history.limit`.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Override `typing.threshold`.
    #[arg(long)]
    pub threshold: Option<u32>,
}

pub fn run_from_env() -> Result<(), ReplayError> {
    let cli = Cli::parse();
    let summary = run(&cli)?;
    println!("{}", render(&summary, cli.pretty)?);
    Ok(())
}

/// Load, override and replay the trace named by `cli`.
pub fn run(cli: &Cli) -> Result<Summary, ReplayError> {
    let mut trace = if cli.trace.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| ReplayError::Read {
                path: cli.trace.clone(),
                source,
            })?;
        Trace::from_json_str(&buf)?
    } else {
        Trace::from_file(&cli.trace)?
    };

    if let Some(limit) = cli.limit {
        trace.config.history = HistoryConfig::new(limit);
    }
    if let Some(threshold) = cli.threshold {
        trace.config.typing = TypingConfig { threshold };
    }
    tracing::info!(
        target: "rewind.replay",
        trace = %cli.trace.display(),
        steps = trace.steps.len(),
        limit = trace.config.history.limit,
        threshold = trace.config.typing.threshold,
        "replaying trace"
    );
    replay(&trace)
}

fn render(summary: &Summary, pretty: bool) -> Result<String, ReplayError> {
    let out = if pretty {
        serde_json::to_string_pretty(summary)?
    } else {
        serde_json::to_string(summary)?
    };
    Ok(out)
}
