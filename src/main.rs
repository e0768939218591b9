mod app;
mod util;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use portal_trace::trace::{LinkWeights, build_graph_with, load_trace_file, try_reconstruct_route};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Trace JSON, either bare or wrapped as `{ "result", "trace" }`.
    trace_file: PathBuf,

    /// Write the renderer node/link JSON to this path (`-` for stdout) instead
    /// of opening the viewer.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Link weight for hops on the reconstructed route.
    #[arg(long, default_value_t = LinkWeights::default().route)]
    route_weight: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "portal_trace=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let weights = LinkWeights {
        route: args.route_weight,
        ..LinkWeights::default()
    };

    match args.export {
        Some(target) => export(&args.trace_file, &target, weights),
        None => run_viewer(args.trace_file, weights),
    }
}

fn export(trace_file: &Path, target: &Path, weights: LinkWeights) -> Result<()> {
    let parsed = load_trace_file(trace_file)?;
    if !parsed.skipped.is_empty() {
        warn!(skipped = parsed.skipped.len(), "trace contained malformed records");
    }

    match try_reconstruct_route(&parsed.trace) {
        Ok(route) => info!(hops = route.len(), route = ?route, "route reconstructed"),
        Err(failure) => info!(%failure, "no route reconstructed"),
    }

    let graph = build_graph_with(&parsed.trace, weights);
    let payload = graph.to_render_payload();

    let writer: Box<dyn Write> = if target.as_os_str() == "-" {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(target)
            .with_context(|| format!("failed to create export file {}", target.display()))?;
        Box::new(file)
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &payload).context("failed to encode graph JSON")?;
    writeln!(writer)?;
    writer.flush().context("failed to flush graph JSON")?;

    info!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        target = %target.display(),
        "exported trace graph"
    );
    Ok(())
}

fn run_viewer(trace_file: PathBuf, weights: LinkWeights) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "portal-trace",
        options,
        Box::new(move |cc| Ok(Box::new(app::TraceViewerApp::new(cc, trace_file, weights)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
