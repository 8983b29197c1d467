//! Requirement-to-test-id compliance matrices.
//!
//! A matrix is a two-column CSV, one `requirement,test_id` pair per
//! line. Requirements may span several lines (one per associated test).
//! Evaluation cross-references the matrix against parsed JUnit suites:
//! a test id is PASS when every matching case passed, FAIL when any
//! matching case failed, ABSENT when no case carries the id at all.

use std::fs;
use std::path::Path;

use crate::error::AnalysisError;
use crate::junit::TestSuite;

/// One `requirement,test_id` row of a matrix file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatrixEntry {
    pub requirement: String,
    pub test_id: String,
}

/// Outcome of looking one test id up across all suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Pass,
    Fail,
    /// The id appears in no suite; the requirement is not covered.
    Absent,
}

/// Load and sort a matrix file. A missing file is fatal: the compliance
/// table is the whole point of the run.
pub fn load_matrix(path: &Path) -> Result<Vec<MatrixEntry>, AnalysisError> {
    let contents = fs::read_to_string(path).map_err(|source| AnalysisError::MissingFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 2 {
            return Err(AnalysisError::parse(
                path,
                idx + 1,
                format!("expected `requirement,test_id`, got {} fields", fields.len()),
            ));
        }
        entries.push(MatrixEntry {
            requirement: fields[0].trim().to_string(),
            test_id: fields[1].trim().to_string(),
        });
    }

    entries.sort();
    Ok(entries)
}

/// Distinct machine names (testcase classnames) across all suites, in
/// first-encounter order.
pub fn machines(suites: &[TestSuite]) -> Vec<String> {
    let mut machines: Vec<String> = Vec::new();
    for suite in suites {
        for case in &suite.cases {
            if !machines.contains(&case.classname) {
                machines.push(case.classname.clone());
            }
        }
    }
    machines
}

/// Look a test id up across all suites, optionally restricted to one
/// machine. A single failing occurrence makes the whole id FAIL.
pub fn check_test(suites: &[TestSuite], test_id: &str, machine: Option<&str>) -> TestStatus {
    let mut present = false;
    let mut passed = true;

    for suite in suites {
        for case in &suite.cases {
            if case.id.as_deref() != Some(test_id) {
                continue;
            }
            if machine.is_some_and(|m| case.classname != m) {
                continue;
            }
            present = true;
            if !case.passed {
                passed = false;
            }
        }
    }

    match (present, passed) {
        (false, _) => TestStatus::Absent,
        (true, true) => TestStatus::Pass,
        (true, false) => TestStatus::Fail,
    }
}
