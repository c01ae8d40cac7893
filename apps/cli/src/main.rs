#![deny(warnings)]

//! Headless CLI: price a listing from a request file and print a report.

mod report;
mod request;

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Args {
    request: Option<PathBuf>,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        request: None,
        json: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--request" => args.request = it.next().map(PathBuf::from),
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

/// `RUST_LOG` directives when present and valid, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    // Logging setup
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    let Some(path) = args.request else {
        bail!("usage: margin --request <file.yaml|file.json> [--json]");
    };
    info!(request = %path.display(), json = args.json, "starting CLI");

    let req = request::PricingRequest::load(&path)?;
    req.validate()?;
    let report = report::build_report(&req);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report::render_text(&report));
    }
    Ok(())
}
