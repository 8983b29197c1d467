//! Timestamp capture analysis
//!
//! Analyzes tcpdump-style publisher and subscriber capture logs from one
//! SV stream, matches packets by id, and prints publication-to-reception
//! latency plus publisher inter-frame jitter statistics. Histogram
//! images land in the output directory for inclusion in the report.
//!
//! Usage:
//!   cargo run --bin timestamp_analysis -- --pub ts_pub_seapath.txt --sub ts_sub_vm1.txt

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use sv_latency_reports::histogram;
use sv_latency_reports::parse::{machine_name, parse_capture_log};
use sv_latency_reports::stats::{intervals_us, median, pstdev};

#[derive(Parser, Debug)]
#[command(name = "timestamp_analysis")]
#[command(about = "Analyze publisher/subscriber capture timestamps and plot latency histograms")]
struct Args {
    /// Publisher capture log, lines of `<packet id> <tv_sec> <tv_nsec>`
    #[arg(long = "pub", short = 'p')]
    publisher: PathBuf,

    /// Subscriber capture log, same format
    #[arg(long = "sub", short = 's')]
    subscriber: PathBuf,

    /// Output directory for histogram images
    #[arg(long, short, default_value = "include/")]
    output: PathBuf,

    /// Discard the first N samples (warm-up transients)
    #[arg(long, default_value_t = 0)]
    skip_first: usize,

    /// Only analyze publisher inter-frame intervals
    #[arg(long, default_value_t = false)]
    pub_only: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("timestamp_analysis=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let pub_records = parse_capture_log(&args.publisher)
        .with_context(|| format!("reading publisher capture {:?}", args.publisher))?;

    // Packet ids seen twice are ambiguous and excluded from matching.
    let mut pub_ts: HashMap<String, i64> = HashMap::new();
    let mut duplicates: Vec<String> = Vec::new();
    let mut ordered_pub_ts: Vec<i64> = Vec::with_capacity(pub_records.len());

    for record in &pub_records {
        ordered_pub_ts.push(record.primary_ts());
        if pub_ts.insert(record.packet_id.clone(), record.primary_ts()).is_some() {
            warn!(packet = %record.packet_id, "duplicate packet id in publisher capture");
            duplicates.push(record.packet_id.clone());
        }
    }

    let mut intervals = intervals_us(&ordered_pub_ts);
    intervals.drain(..args.skip_first.min(intervals.len()));

    let pub_machine = machine_name(&args.publisher);
    let interval_image = args.output.join(format!("pub_{pub_machine}_interval_between.png"));
    histogram::render_discrete(&intervals, &interval_image)
        .with_context(|| format!("rendering {interval_image:?}"))?;

    if !args.pub_only {
        let sub_records = parse_capture_log(&args.subscriber)
            .with_context(|| format!("reading subscriber capture {:?}", args.subscriber))?;

        let mut latencies_ns: Vec<i64> = Vec::new();
        let mut missed = 0usize;
        for record in &sub_records {
            if duplicates.contains(&record.packet_id) {
                continue;
            }
            match pub_ts.get(&record.packet_id) {
                Some(&sent) => latencies_ns.push(record.primary_ts() - sent),
                None => missed += 1,
            }
        }

        latencies_ns.drain(..args.skip_first.min(latencies_ns.len()));
        let latencies_us: Vec<i64> = latencies_ns
            .iter()
            .map(|&ns| (ns as f64 / 1000.0).round() as i64)
            .collect();

        let sub_machine = machine_name(&args.subscriber);
        let delay_image = args.output.join(format!("sub_{sub_machine}_delay.png"));
        histogram::render_discrete(&latencies_us, &delay_image)
            .with_context(|| format!("rendering {delay_image:?}"))?;

        print_block(
            &format!("Latency publication-reception ({} frames)", latencies_ns.len()),
            &latencies_ns,
            "ns",
            Some(missed),
        );
    }

    print_block(
        &format!("Interval between published frames ({} frame pairs)", intervals.len()),
        &intervals,
        "us",
        None,
    );

    Ok(())
}

/// Print one statistics block in the format the report pipeline scrapes.
fn print_block(title: &str, values: &[i64], unit: &str, missed: Option<usize>) {
    println!("{title}");
    if let Some(missed) = missed {
        println!("    missed sv: {missed}");
    }
    if values.is_empty() {
        println!("    (no data)");
        println!();
        return;
    }

    let sd = pstdev(values).unwrap_or(0.0);
    let med = median(values).unwrap_or(0.0);
    let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
    let min = values.iter().min().copied().unwrap_or(0);
    let max = values.iter().max().copied().unwrap_or(0);

    println!("    std dev: {} {unit}", sd.round() as i64);
    println!("    median: {med} {unit}");
    println!("    mean: {} {unit}", mean.round() as i64);
    println!("    min: {min} {unit}");
    println!("    max: {max} {unit}");
    println!();
}
