//! Latency report generator
//!
//! Post-processes publisher and subscriber SV timestamp logs from one
//! test run, reconciles dropped samples, renders per-stream latency
//! histograms and writes `latency_tests.adoc` with a pass/fail banner.
//!
//! Usage:
//!   cargo run --bin latency_report -- --pub pub.txt --sub sub_guest0.txt
//!   cargo run --bin latency_report -- -p pub.txt -s sub_guest0.txt -o results/ --ttot 1000

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use sv_latency_reports::adoc::{self, StreamSection};
use sv_latency_reports::align::{align_streams, Alignment};
use sv_latency_reports::config::{AlignConfig, ReportColors};
use sv_latency_reports::histogram;
use sv_latency_reports::parse::{machine_name, parse_sv_log};
use sv_latency_reports::sample::SvLog;
use sv_latency_reports::stats::LatencySummary;

#[derive(Parser, Debug)]
#[command(name = "latency_report")]
#[command(about = "Generate the SV latency test report in AsciiDoc format")]
struct Args {
    /// SV publisher timestamp log
    #[arg(long = "pub", short = 'p')]
    publisher: PathBuf,

    /// SV subscriber timestamp log
    #[arg(long = "sub", short = 's')]
    subscriber: PathBuf,

    /// Optional SV hypervisor timestamp log
    #[arg(long = "hyp", short = 'y')]
    hypervisor: Option<PathBuf>,

    /// Output directory for the report and histogram images
    #[arg(long, short, default_value = "../results/")]
    output: PathBuf,

    /// Total latency threshold in microseconds
    #[arg(long, visible_alias = "limit", default_value_t = 100)]
    ttot: i64,

    /// Samples per publisher iteration (SV counter wrap)
    #[arg(long, default_value_t = 4000)]
    iteration_size: u32,

    /// Optional machine-readable stats artifact (JSON)
    #[arg(long)]
    json: Option<PathBuf>,
}

/// Per-stream outcome, computed in full before any artifact is written
/// so a fatal alignment error never leaves a partial report behind.
#[derive(Debug, Serialize)]
struct StreamResult {
    stream_id: String,
    summary: LatencySummary,
    drops: usize,
    #[serde(skip)]
    latencies: Vec<i64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("latency_report=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let cfg = AlignConfig::with_iteration_size(args.iteration_size);
    let colors = ReportColors::default();

    let pub_log = parse_sv_log(&args.publisher)
        .with_context(|| format!("reading publisher log {:?}", args.publisher))?;
    let sub_log = parse_sv_log(&args.subscriber)
        .with_context(|| format!("reading subscriber log {:?}", args.subscriber))?;

    let vm = machine_name(&args.subscriber);
    let results = analyze(&pub_log, &sub_log, &cfg)?;

    let hyp_results = match &args.hypervisor {
        Some(path) => {
            let hyp_log =
                parse_sv_log(path).with_context(|| format!("reading hypervisor log {path:?}"))?;
            Some(analyze(&pub_log, &hyp_log, &cfg)?)
        }
        None => None,
    };

    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating output directory {:?}", args.output))?;

    let mut doc = String::new();
    doc.push_str(&format!(
        "// Generated by latency_report on {}\n",
        chrono::Utc::now().to_rfc3339()
    ));

    render_sections(&mut doc, &results, "VM", "total", &vm, &args.output)?;
    if let Some(hyp_results) = &hyp_results {
        render_sections(&mut doc, hyp_results, "Hypervisor", "hyp", &vm, &args.output)?;
    }

    // The banner judges the worst latency seen across all streams.
    let max_latency = results.iter().filter_map(|r| r.summary.max).max();
    adoc::write_threshold_banner(&mut doc, max_latency, args.ttot, &colors);

    let report_path = args.output.join("latency_tests.adoc");
    fs::write(&report_path, &doc)
        .with_context(|| format!("writing report {report_path:?}"))?;
    info!(report = ?report_path, "latency report written");

    if let Some(json_path) = &args.json {
        let payload = serde_json::to_string_pretty(&results)?;
        fs::write(json_path, payload)
            .with_context(|| format!("writing stats artifact {json_path:?}"))?;
    }

    let total_drops: usize = results.iter().map(|r| r.drops).sum();
    println!(
        "Processed {} stream(s), {} dropped sample(s), max latency {}",
        results.len(),
        total_drops,
        max_latency.map_or("undefined".to_string(), |v| format!("{v} us")),
    );

    Ok(())
}

/// Align every publisher stream with its subscriber counterpart. Fails
/// before anything is rendered when a stream is missing entirely or its
/// counters are disordered.
fn analyze(
    pub_log: &SvLog,
    sub_log: &SvLog,
    cfg: &AlignConfig,
) -> Result<Vec<StreamResult>> {
    let mut results = Vec::with_capacity(pub_log.streams.len());
    for pub_stream in &pub_log.streams {
        let sub_stream = sub_log.stream(&pub_stream.id).with_context(|| {
            format!("stream {} absent from subscriber log", pub_stream.id)
        })?;

        let Alignment { latencies, drops } = align_streams(
            &pub_stream.id,
            &pub_stream.samples,
            &sub_stream.samples,
            cfg,
        )?;
        info!(
            stream = %pub_stream.id,
            samples = latencies.len(),
            drops, "stream aligned"
        );

        results.push(StreamResult {
            stream_id: pub_stream.id.clone(),
            summary: LatencySummary::from_values(&latencies),
            drops,
            latencies,
        });
    }
    Ok(results)
}

/// Render one table section and histogram per stream.
fn render_sections(
    doc: &mut String,
    results: &[StreamResult],
    title_prefix: &str,
    histogram_name: &str,
    vm: &str,
    output: &std::path::Path,
) -> Result<()> {
    for (index, result) in results.iter().enumerate() {
        let image = histogram::sv_histogram_filename(histogram_name, index, "latency", vm);
        histogram::render_binned(&result.latencies, 20, &output.join(&image))?;
        println!("Histogram saved as {image}.");

        let title = if results.len() == 1 {
            format!("{title_prefix} {vm}")
        } else {
            format!("{title_prefix} {vm} ({})", result.stream_id)
        };
        adoc::write_stream_section(
            doc,
            &StreamSection {
                title: &title,
                stream_count: results.len(),
                summary: &result.summary,
                drops: result.drops,
                image: &image,
            },
        );
    }
    Ok(())
}
