//! AsciiDoc assembly for latency and compliance reports.
//!
//! The fragments emitted here are included verbatim into the test report
//! document, so the cell color escapes (`{set:cellbgcolor:...}`) and the
//! row-span syntax in the compliance matrix follow the AsciiDoc table
//! spec exactly.

use std::collections::HashSet;
use std::fmt::Write;

use crate::compliance::{MatrixEntry, TestStatus};
use crate::config::ReportColors;
use crate::junit::{TestCase, TestSuite};
use crate::stats::LatencySummary;

/// Everything needed to render one per-stream latency table.
#[derive(Debug, Clone)]
pub struct StreamSection<'a> {
    /// Section title, e.g. the VM the subscriber ran on.
    pub title: &'a str,
    pub stream_count: usize,
    pub summary: &'a LatencySummary,
    pub drops: usize,
    /// Histogram image file name referenced by the table.
    pub image: &'a str,
}

/// Render `Some(v)` as the number and `None` as `undefined`.
fn undef(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "undefined".to_string(),
    }
}

/// Per-stream latency table plus its histogram image reference.
pub fn write_stream_section(out: &mut String, section: &StreamSection<'_>) {
    let _ = write!(
        out,
        "\n===== {title}\n\
         {{set:cellbgcolor!}}\n\
         |===\n\
         |Number of IEC61850 Sampled Value |Minimum latency |Maximum latency |Average latency |Dropped samples\n\
         |{streams} |{min} us |{max} us |{avg} us |{drops}\n\
         |===\n\
         image::{image}[]\n",
        title = section.title,
        streams = section.stream_count,
        min = undef(section.summary.min),
        max = undef(section.summary.max),
        avg = undef(section.summary.mean),
        drops = section.drops,
        image = section.image,
    );
}

/// Pass/fail banner comparing the maximum observed latency against the
/// configured budget. An undefined maximum (no samples) renders as
/// FAILED: an empty run never passes.
pub fn write_threshold_banner(
    out: &mut String,
    max_latency: Option<i64>,
    limit_us: i64,
    colors: &ReportColors,
) {
    let passed = max_latency.is_some_and(|max| max < limit_us);
    let (result, color) = if passed {
        ("PASS", colors.pass.as_str())
    } else {
        ("FAILED", colors.fail.as_str())
    };

    let _ = write!(
        out,
        "\n[cols=\"1,1\",frame=all, grid=all]\n\
         |===\n\
         |Max latency < {limit_us} us\n\
         {{set:cellbgcolor!}}\n\
         |{result}\n\
         {{set:cellbgcolor:{color}}}\n\
         |===\n",
    );
}

/// One JUnit suite as a results table. When the suite carries test ids an
/// extra id column is emitted and each row gets an anchor so compliance
/// matrices can link back to it; `anchors` de-duplicates ids reused
/// across suites.
pub fn write_suite_table(
    out: &mut String,
    suite: &TestSuite,
    add_machine_name: bool,
    colors: &ReportColors,
    anchors: &mut HashSet<String>,
) {
    let has_ids = suite.has_ids();
    let machine_part = if add_machine_name {
        suite
            .cases
            .first()
            .map(|c| format!("for {}", c.classname))
            .unwrap_or_default()
    } else {
        String::new()
    };

    let (colsize, id_col) = if has_ids { ("2,6,1", "|Test ID ") } else { ("8,1", "") };
    let _ = write!(
        out,
        "\n===== Tests {name} {machine_part}\n\
         [options=\"header\",cols=\"{colsize}\",frame=all, grid=all]\n\
         |===\n\
         {id_col}|Tests |Results\n",
        name = suite.name,
    );

    for case in &suite.cases {
        write_case_line(out, case, has_ids, add_machine_name, colors, anchors);
    }

    let _ = write!(
        out,
        "\n|===\n\
         * number of tests: {tests}\n\
         * number of failures: {failures}\n\n",
        tests = suite.tests(),
        failures = suite.failures(),
    );
}

fn write_case_line(
    out: &mut String,
    case: &TestCase,
    has_ids: bool,
    add_machine_name: bool,
    colors: &ReportColors,
    anchors: &mut HashSet<String>,
) {
    let mut anchor = String::new();
    if has_ids {
        let id = case.id.as_deref().unwrap_or_default();
        let _ = write!(out, "\n|{id}\n{{set:cellbgcolor!}}\n");

        let candidate = anchor_name(id, add_machine_name.then_some(case.classname.as_str()));
        if anchors.insert(candidate.clone()) {
            anchor = format!("[[{candidate}]]");
        }
    }

    let (result, color) = if case.passed {
        ("PASS", colors.pass.as_str())
    } else {
        ("FAIL", colors.fail.as_str())
    };
    let _ = write!(
        out,
        "\n|{anchor}{name}\n\
         {{set:cellbgcolor!}}\n\
         |{result}\n\
         {{set:cellbgcolor:{color}}}\n",
        name = case.name,
    );
}

/// Compliance matrix table for one machine. Returns `true` when at least
/// one referenced test id is absent from the suites, which must fail the
/// whole run.
pub fn write_matrix_table(
    out: &mut String,
    matrix_name: &str,
    machine: &str,
    entries: &[MatrixEntry],
    statuses: &[TestStatus],
    add_machine_name: bool,
    colors: &ReportColors,
) -> bool {
    debug_assert_eq!(entries.len(), statuses.len());

    let _ = write!(
        out,
        "\n===== Matrix {matrix_name} for {machine}\n\
         [options=\"header\",cols=\"6,2,1\",frame=all, grid=all]\n\
         |===\n\
         |Requirement |Test id |Status\n",
    );

    let mut any_absent = false;
    let mut current_requirement: Option<&str> = None;
    for (entry, status) in entries.iter().zip(statuses) {
        if current_requirement != Some(entry.requirement.as_str()) {
            current_requirement = Some(entry.requirement.as_str());
            // The requirement cell spans one row per associated test id.
            let span = entries
                .iter()
                .filter(|e| e.requirement == entry.requirement)
                .count();
            let _ = write!(
                out,
                "\n.{span}+|{req}\n{{set:cellbgcolor!}}\n",
                req = entry.requirement,
            );
        }

        let link = anchor_name(&entry.test_id, add_machine_name.then_some(machine));
        let (label, color) = match status {
            TestStatus::Pass => ("PASS", colors.pass.as_str()),
            TestStatus::Fail => ("FAIL", colors.fail.as_str()),
            TestStatus::Absent => {
                any_absent = true;
                ("ABSENT", colors.absent.as_str())
            }
        };
        let _ = write!(
            out,
            "\n|<<{link},{id}>>\n\
             {{set:cellbgcolor!}}\n\
             |{label}\n\
             {{set:cellbgcolor:{color}}}\n",
            id = entry.test_id,
        );
    }

    out.push_str("\n|===\n");
    any_absent
}

/// Anchor/link name for a test id, optionally machine-qualified.
fn anchor_name(test_id: &str, machine: Option<&str>) -> String {
    match machine {
        Some(machine) => format!("{machine}_{test_id}").replace(' ', "_"),
        None => test_id.replace(' ', "_"),
    }
}
