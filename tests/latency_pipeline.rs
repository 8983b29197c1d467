//! End-to-end latency pipeline tests
//!
//! Drive the whole flow through the library API: write SV log fixtures,
//! parse, align, summarize, render histogram and AsciiDoc artifacts, and
//! check the report contents a CI consumer relies on.

use std::fs;
use std::path::PathBuf;

use tempfile::tempdir;

use sv_latency_reports::adoc::{self, StreamSection};
use sv_latency_reports::align::align_streams;
use sv_latency_reports::config::{AlignConfig, ReportColors};
use sv_latency_reports::histogram;
use sv_latency_reports::parse::parse_sv_log;
use sv_latency_reports::stats::LatencySummary;
use sv_latency_reports::AnalysisError;

fn write_fixture(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn dropped_sample_is_reconciled_end_to_end() {
    let dir = tempdir().unwrap();
    let pub_path = write_fixture(dir.path(), "pub.txt", "0:S1:0:1000\n0:S1:1:1010\n0:S1:2:1020\n");
    let sub_path = write_fixture(dir.path(), "sub_guest0.txt", "0:S1:0:1005\n0:S1:2:1028\n");

    let pub_log = parse_sv_log(&pub_path).unwrap();
    let sub_log = parse_sv_log(&sub_path).unwrap();
    assert_eq!(pub_log.stream_count(), 1);

    let cfg = AlignConfig::with_iteration_size(3);
    let pub_stream = &pub_log.streams[0];
    let sub_stream = sub_log.stream(&pub_stream.id).unwrap();

    let aligned =
        align_streams(&pub_stream.id, &pub_stream.samples, &sub_stream.samples, &cfg).unwrap();
    assert_eq!(aligned.drops, 1);
    assert_eq!(aligned.latencies, vec![5, 8]);
}

#[test]
fn disordered_subscriber_aborts_without_artifacts() {
    let dir = tempdir().unwrap();
    let pub_path = write_fixture(
        dir.path(),
        "pub.txt",
        "0:S1:0:1000\n0:S1:1:1010\n0:S1:2:1020\n0:S1:3:1030\n",
    );
    let sub_path = write_fixture(
        dir.path(),
        "sub_guest0.txt",
        "0:S1:0:1005\n0:S1:2:1028\n0:S1:1:1033\n",
    );

    let pub_log = parse_sv_log(&pub_path).unwrap();
    let sub_log = parse_sv_log(&sub_path).unwrap();

    let cfg = AlignConfig::with_iteration_size(4);
    let err = align_streams(
        "S1",
        &pub_log.streams[0].samples,
        &sub_log.streams[0].samples,
        &cfg,
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::Ordering { .. }));
}

#[test]
fn report_renders_stats_histogram_and_banner() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results");

    let latencies = vec![5i64, 8, 8, 12, 95];
    let summary = LatencySummary::from_values(&latencies);
    assert_eq!(summary.max, Some(95));

    let image = histogram::sv_histogram_filename("total", 0, "latency", "guest0");
    histogram::render_binned(&latencies, 20, &output.join(&image)).unwrap();
    assert!(output.join(&image).exists());

    let colors = ReportColors::default();
    let mut doc = String::new();
    adoc::write_stream_section(
        &mut doc,
        &StreamSection {
            title: "VM guest0",
            stream_count: 1,
            summary: &summary,
            drops: 0,
            image: &image,
        },
    );
    adoc::write_threshold_banner(&mut doc, summary.max, 100, &colors);

    let report = output.join("latency_tests.adoc");
    fs::write(&report, &doc).unwrap();

    let contents = fs::read_to_string(&report).unwrap();
    assert!(contents.contains("===== VM guest0"));
    assert!(contents.contains("image::histogram_total_stream_0_latency_guest0.png[]"));
    assert!(contents.contains("|PASS"));
    assert!(contents.contains("{set:cellbgcolor:#90EE90}"));
}

#[test]
fn over_budget_run_renders_failed_banner() {
    let latencies = vec![40i64, 105];
    let summary = LatencySummary::from_values(&latencies);

    let mut doc = String::new();
    adoc::write_threshold_banner(&mut doc, summary.max, 100, &ReportColors::default());
    assert!(doc.contains("|FAILED"));
    assert!(doc.contains("{set:cellbgcolor:#F08080}"));
}

#[test]
fn malformed_log_reports_file_and_line() {
    let dir = tempdir().unwrap();
    let path = write_fixture(dir.path(), "pub.txt", "0:S1:0:1000\nnot a sample\n");

    let err = parse_sv_log(&path).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("pub.txt:2:"), "unexpected error: {message}");
}
