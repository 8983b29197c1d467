//! JUnit to AsciiDoc test report generator
//!
//! Converts cukinia JUnit XML results into AsciiDoc result tables, one
//! fragment per XML file, and optionally cross-references compliance
//! matrices (`requirement,test_id` CSV) into per-machine compliance
//! tables. A test id referenced by a matrix but absent from every suite
//! fails the run with exit code 1.
//!
//! Usage:
//!   cargo run --bin test_report -- -i include/ -x cukinia_vm1.xml -x cukinia_vm2.xml
//!   cargo run --bin test_report -- -i include/ -x cukinia.xml -c matrix.csv -m

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use sv_latency_reports::adoc;
use sv_latency_reports::compliance::{self, TestStatus};
use sv_latency_reports::config::ReportColors;
use sv_latency_reports::junit::{parse_junit_file, TestSuite};

#[derive(Parser, Debug)]
#[command(name = "test_report")]
#[command(about = "Generate AsciiDoc test result and compliance tables from JUnit XML")]
struct Args {
    /// Directory receiving the generated AsciiDoc fragments
    #[arg(long, short)]
    include_dir: PathBuf,

    /// JUnit XML file to convert (repeatable)
    #[arg(long = "xml-files", short = 'x')]
    xml_files: Vec<PathBuf>,

    /// Compliance matrix CSV to cross-reference (repeatable)
    #[arg(long = "compliance-matrix", short = 'c')]
    compliance_matrix: Vec<PathBuf>,

    /// Qualify table titles and anchors with the machine name
    /// (testcase classname)
    #[arg(long = "add-machine-name", short = 'm', default_value_t = false)]
    add_machine_name: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_report=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        // Absent compliance test ids are not an execution failure but
        // must still surface to the pipeline.
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    fs::create_dir_all(&args.include_dir)
        .with_context(|| format!("creating include directory {:?}", args.include_dir))?;

    let colors = ReportColors::default();

    // Anchors are shared across all XML files so a test id reused by
    // several suites is only anchored once.
    let mut anchors: HashSet<String> = HashSet::new();
    let mut all_suites: Vec<TestSuite> = Vec::new();

    for xml in &args.xml_files {
        let suites = parse_junit_file(xml)?;

        let mut doc = String::new();
        for suite in &suites {
            adoc::write_suite_table(&mut doc, suite, args.add_machine_name, &colors, &mut anchors);
        }

        let fragment = args.include_dir.join(format!("test-{}.adoc", base_name(xml)));
        fs::write(&fragment, &doc).with_context(|| format!("writing {fragment:?}"))?;
        info!(fragment = ?fragment, suites = suites.len(), "suite tables written");

        all_suites.extend(suites);
    }

    let mut all_present = true;
    for matrix in &args.compliance_matrix {
        if !write_compliance_tables(args, matrix, &all_suites, &colors)? {
            all_present = false;
        }
    }

    Ok(all_present)
}

/// One compliance table per machine for one matrix file. Returns `false`
/// when any referenced test id is absent.
fn write_compliance_tables(
    args: &Args,
    matrix: &Path,
    suites: &[TestSuite],
    colors: &ReportColors,
) -> Result<bool> {
    let entries = compliance::load_matrix(matrix)?;
    let matrix_name = matrix.display().to_string();

    let mut all_present = true;
    for machine in compliance::machines(suites) {
        let machine_filter = args.add_machine_name.then_some(machine.as_str());
        let statuses: Vec<TestStatus> = entries
            .iter()
            .map(|e| compliance::check_test(suites, &e.test_id, machine_filter))
            .collect();

        for (entry, status) in entries.iter().zip(&statuses) {
            if *status == TestStatus::Absent {
                warn!(
                    test_id = %entry.test_id,
                    machine = %machine,
                    "test id referenced by matrix is absent"
                );
            }
        }

        let mut doc = String::new();
        let any_absent = adoc::write_matrix_table(
            &mut doc,
            &matrix_name,
            &machine,
            &entries,
            &statuses,
            args.add_machine_name,
            colors,
        );
        if any_absent {
            all_present = false;
        }

        let fragment = args
            .include_dir
            .join(format!("test-{}-{}.adoc", machine, base_name(matrix)));
        fs::write(&fragment, &doc).with_context(|| format!("writing {fragment:?}"))?;
        info!(fragment = ?fragment, "compliance table written");
    }

    Ok(all_present)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
