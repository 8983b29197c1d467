//! Minimal JUnit XML model and parser.
//!
//! Only the subset emitted by the cukinia test runner matters here:
//! `testsuite` elements holding `testcase` elements, where a case fails
//! when it carries a `failure` or `error` child, and may expose a test
//! identifier through a `<property name="cukinia.id" value="..."/>`
//! child.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::AnalysisError;

/// Property name carrying the cukinia test identifier.
pub const TEST_ID_PROPERTY: &str = "cukinia.id";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    /// Machine name, carried in the JUnit classname attribute.
    pub classname: String,
    pub passed: bool,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSuite {
    pub name: String,
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn tests(&self) -> usize {
        self.cases.len()
    }

    pub fn failures(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed).count()
    }

    /// Whether the suite carries test identifiers. As in the original
    /// cukinia tooling, only the first case is consulted.
    pub fn has_ids(&self) -> bool {
        self.cases.first().is_some_and(|c| c.id.is_some())
    }
}

/// Parse a JUnit XML file into its test suites.
pub fn parse_junit_file(path: &Path) -> Result<Vec<TestSuite>, AnalysisError> {
    let contents = fs::read_to_string(path).map_err(|source| AnalysisError::MissingFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_junit_str(path, &contents)
}

fn parse_junit_str(path: &Path, raw: &str) -> Result<Vec<TestSuite>, AnalysisError> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    let xml_err = |reason: String| AnalysisError::Xml {
        path: path.to_path_buf(),
        reason,
    };

    let mut suites = Vec::new();
    let mut suite: Option<TestSuite> = None;
    let mut case: Option<TestCase> = None;
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_err(format!("{e:?}")))?
        {
            Event::Start(element) => match element.name().as_ref() {
                b"testsuite" => {
                    suite = Some(TestSuite {
                        name: attr(&element, b"name", path)?.unwrap_or_default(),
                        cases: Vec::new(),
                    });
                }
                b"testcase" => {
                    case = Some(new_case(&element, path)?);
                }
                b"failure" | b"error" => {
                    if let Some(case) = case.as_mut() {
                        case.passed = false;
                    }
                }
                b"property" => {
                    record_property(&element, path, case.as_mut())?;
                }
                _ => {}
            },
            Event::Empty(element) => match element.name().as_ref() {
                b"testcase" => {
                    let done = new_case(&element, path)?;
                    attach_case(done, suite.as_mut(), &mut suites);
                }
                b"failure" | b"error" => {
                    if let Some(case) = case.as_mut() {
                        case.passed = false;
                    }
                }
                b"property" => {
                    record_property(&element, path, case.as_mut())?;
                }
                _ => {}
            },
            Event::End(element) => match element.name().as_ref() {
                b"testcase" => {
                    if let Some(done) = case.take() {
                        attach_case(done, suite.as_mut(), &mut suites);
                    }
                }
                b"testsuite" => {
                    if let Some(done) = suite.take() {
                        suites.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(suites)
}

fn attach_case(case: TestCase, suite: Option<&mut TestSuite>, suites: &mut Vec<TestSuite>) {
    match suite {
        Some(suite) => suite.cases.push(case),
        None => suites.push(TestSuite {
            name: String::new(),
            cases: vec![case],
        }),
    }
}

fn new_case(element: &BytesStart<'_>, path: &Path) -> Result<TestCase, AnalysisError> {
    Ok(TestCase {
        name: attr(element, b"name", path)?.unwrap_or_default(),
        classname: attr(element, b"classname", path)?.unwrap_or_default(),
        passed: true,
        id: None,
    })
}

fn record_property(
    element: &BytesStart<'_>,
    path: &Path,
    case: Option<&mut TestCase>,
) -> Result<(), AnalysisError> {
    let Some(case) = case else { return Ok(()) };
    if attr(element, b"name", path)?.as_deref() == Some(TEST_ID_PROPERTY) {
        case.id = attr(element, b"value", path)?;
    }
    Ok(())
}

fn attr(
    element: &BytesStart<'_>,
    key: &[u8],
    path: &Path,
) -> Result<Option<String>, AnalysisError> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| AnalysisError::Xml {
            path: path.to_path_buf(),
            reason: format!("{e:?}"),
        })?;
        if attribute.key.as_ref() == key {
            let value = attribute.unescape_value().map_err(|e| AnalysisError::Xml {
                path: path.to_path_buf(),
                reason: format!("{e:?}"),
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="net" tests="3" failures="1">
    <testcase name="ping gateway" classname="vm1">
      <properties>
        <property name="cukinia.id" value="NET-01"/>
      </properties>
    </testcase>
    <testcase name="dns lookup" classname="vm1">
      <properties>
        <property name="cukinia.id" value="NET-02"/>
      </properties>
      <failure message="timeout"/>
    </testcase>
    <testcase name="mtu probe" classname="vm2"/>
  </testsuite>
  <testsuite name="storage" tests="1" failures="0">
    <testcase name="disk present" classname="vm1"/>
  </testsuite>
</testsuites>
"#;

    fn parse(raw: &str) -> Vec<TestSuite> {
        parse_junit_str(Path::new("sample.xml"), raw).unwrap()
    }

    #[test]
    fn parses_suites_and_cases() {
        let suites = parse(SAMPLE);
        assert_eq!(suites.len(), 2);
        assert_eq!(suites[0].name, "net");
        assert_eq!(suites[0].tests(), 3);
        assert_eq!(suites[0].failures(), 1);
        assert_eq!(suites[1].name, "storage");
        assert_eq!(suites[1].tests(), 1);
    }

    #[test]
    fn failure_child_marks_case_failed() {
        let suites = parse(SAMPLE);
        let dns = &suites[0].cases[1];
        assert_eq!(dns.name, "dns lookup");
        assert!(!dns.passed);
        assert!(suites[0].cases[0].passed);
    }

    #[test]
    fn reads_cukinia_id_property() {
        let suites = parse(SAMPLE);
        assert_eq!(suites[0].cases[0].id.as_deref(), Some("NET-01"));
        assert_eq!(suites[0].cases[2].id, None);
        assert!(suites[0].has_ids());
        assert!(!suites[1].has_ids());
    }

    #[test]
    fn classname_carries_machine() {
        let suites = parse(SAMPLE);
        assert_eq!(suites[0].cases[0].classname, "vm1");
        assert_eq!(suites[0].cases[2].classname, "vm2");
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = parse_junit_file(Path::new("/nonexistent/report.xml")).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingFile { .. }));
    }

    #[test]
    fn malformed_xml_is_fatal() {
        let err = parse_junit_str(Path::new("bad.xml"), "<testsuite><testcase").unwrap_err();
        assert!(matches!(err, AnalysisError::Xml { .. }));
    }
}
