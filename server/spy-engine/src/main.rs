//! Binary entrypoint: read one ScanRequest from stdin, write one ScanResponse to stdout.
//!
//! Logs go to stderr (filter with RUST_LOG) so stdout stays a single JSON document.

use std::io::{self, Read, Write};

use chrono::Utc;
use spy_engine::{Config, ContextBuilder, EngineError, Runner, ScanRequest, ScanResponse, ScanResult};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(EnvFilter::from_default_env())
    .init();

  let response = match run_binary() {
    Ok(result) => ScanResponse::Completed { result },
    Err(e) => {
      error!(error = %e, "scan failed");
      ScanResponse::failed(e.public_message())
    }
  };
  let failed = matches!(response, ScanResponse::Failed { .. });

  let mut out = io::stdout().lock();
  let written = serde_json::to_writer(&mut out, &response)
    .map_err(io::Error::from)
    .and_then(|_| writeln!(out))
    .and_then(|_| out.flush());
  if let Err(e) = written {
    let _ = writeln!(io::stderr(), "spy-engine: write error: {}", e);
    std::process::exit(1);
  }

  if failed {
    std::process::exit(1);
  }
}

fn run_binary() -> Result<ScanResult, EngineError> {
  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;
  let request: ScanRequest = serde_json::from_str(&raw)?;

  let config = Config::from_env()?;
  let runner = Runner::from_config(&config)?;

  let ctx = ContextBuilder::new(&request.data, &config.scan).build_for_name(
    &request.character_name,
    request.requested_by,
    Utc::now(),
  )?;

  // No worker queue here; large accounts fan the checks out instead.
  if request.parallel
    || config
      .scan
      .prefers_background(request.run_async, ctx.character_ids.len())
  {
    info!(
      characters = ctx.character_ids.len(),
      checks = runner.check_keys().len(),
      "evaluating checks in parallel"
    );
    runner.run_parallel(&ctx)
  } else {
    runner.run(&ctx)
  }
}
