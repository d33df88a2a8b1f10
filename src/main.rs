//! hookgate: tool-use hook for coding agents.
//!
//! Reads one tool invocation event as JSON from stdin, appends it to the
//! audit log, and exits 0 (allow) or 2 (block, reason on stderr).
//!
//! Usage:
//!   hookgate [--config <path>] [--audit-log <path>] [--fail-closed | --fail-open] [--dump-config]

use std::path::PathBuf;

use hookgate::config::Config;
use hookgate::emit::{Emission, FailureMode};
use hookgate::error::GatewayError;
use hookgate::gateway::Gateway;
use log::{error, warn};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    audit_log: Option<String>,
    failure_mode: Option<FailureMode>,
    dump_config: bool,
    /// Unrecognized arguments, reported once the logger is up.
    ignored: Vec<String>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Self {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = args.next().map(PathBuf::from),
                "--audit-log" => parsed.audit_log = args.next(),
                "--fail-closed" => parsed.failure_mode = Some(FailureMode::Closed),
                "--fail-open" => parsed.failure_mode = Some(FailureMode::Open),
                "--dump-config" => parsed.dump_config = true,
                _ => parsed.ignored.push(arg),
            }
        }
        parsed
    }
}

/// Exit through the failure mode when no decision can be reached.
fn fail(mode: FailureMode) -> ! {
    let emission = Emission::internal_failure(mode);
    let status = emission
        .emit(&mut std::io::stderr())
        .unwrap_or(emission.status);
    std::process::exit(status);
}

fn main() {
    let args = Args::parse(std::env::args().skip(1));

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            hookgate::logging::init(&Default::default());
            error!("{}", GatewayError::from(e));
            fail(args.failure_mode.unwrap_or_default());
        }
    };
    if let Some(path) = args.audit_log {
        config.audit.path = path;
    }
    if let Some(mode) = args.failure_mode {
        config.settings.fail_closed = mode == FailureMode::Closed;
    }

    hookgate::logging::init(&config.logging);
    for arg in &args.ignored {
        warn!("ignoring unrecognized argument: {arg}");
    }

    if args.dump_config {
        match config.to_toml() {
            Ok(rendered) => {
                print!("{rendered}");
                std::process::exit(0);
            }
            Err(e) => {
                error!("cannot render config: {e}");
                std::process::exit(1);
            }
        }
    }

    let gateway = match Gateway::from_config(&config) {
        Ok(g) => g,
        Err(e) => {
            error!("{}", GatewayError::from(e));
            fail(FailureMode::from_fail_closed(config.settings.fail_closed));
        }
    };

    let status = gateway.run(std::io::stdin().lock(), &mut std::io::stderr());
    std::process::exit(status);
}
