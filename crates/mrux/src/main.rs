//! mrux: extract MRUListEx lists from registry key exports.
//!
//! Records go to stdout (JSON lines, or a JSON array with `--pretty`).
//! Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use mrux::config::Config;
use mrux::events::{JsonLinesSink, RegistryEvent};
use mrux::plugins::{scan, ScanSummary, TracingObserver};
use std::io::{BufWriter, Write};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs to stderr so stdout stays clean for records
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .init();

    let registry = config.plugin_registry()?;
    tracing::debug!("mrux: plugins {:?}", registry.names());

    let observer = TracingObserver;
    let mut total = ScanSummary::default();
    let stdout = std::io::stdout();

    if config.pretty {
        let mut events: Vec<RegistryEvent> = Vec::new();
        for input in &config.inputs {
            let keys = regkey::load_snapshots(input)
                .with_context(|| format!("loading {}", input.display()))?;
            total += scan(&registry, &keys, &observer, &mut events)?;
        }
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &events)?;
        writeln!(out)?;
    } else {
        let mut sink = JsonLinesSink::new(BufWriter::new(stdout.lock()));
        for input in &config.inputs {
            let keys = regkey::load_snapshots(input)
                .with_context(|| format!("loading {}", input.display()))?;
            total += scan(&registry, &keys, &observer, &mut sink)?;
        }
        sink.flush()?;
        tracing::debug!("mrux: {} JSON lines written", sink.written());
    }

    tracing::info!(
        "mrux: {} keys scanned, {} matched, {} malformed, {} records",
        total.keys_seen,
        total.keys_matched,
        total.keys_malformed,
        total.records
    );
    Ok(())
}
