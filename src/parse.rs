//! Log file parsers.
//!
//! Two capture formats exist on the rig:
//!
//! - SV logs: one colon-delimited line per sample,
//!   `iteration:stream_id:sequence_counter:timestamp`.
//! - tcpdump-style capture logs: space-delimited lines with a packet id
//!   followed by one or more `tv_sec tv_nsec` timestamp pairs.
//!
//! Both parsers read the whole file up front (these are finite, static
//! captures) and fail fatally on the first malformed line, naming the
//! file and 1-based line number.

use std::fs;
use std::path::Path;

use crate::error::AnalysisError;
use crate::sample::{CaptureRecord, Sample, SvLog};

/// Parse a colon-delimited SV timestamp log, grouping samples by stream id.
pub fn parse_sv_log(path: &Path) -> Result<SvLog, AnalysisError> {
    let contents = read_input(path)?;

    let mut log = SvLog::default();
    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 4 {
            return Err(AnalysisError::parse(
                path,
                line_no,
                format!("expected 4 colon-delimited fields, got {}", fields.len()),
            ));
        }

        let iteration = parse_int::<u32>(path, line_no, "iteration", fields[0])?;
        let counter = parse_int::<u32>(path, line_no, "sequence counter", fields[2])?;
        let timestamp = parse_int::<i64>(path, line_no, "timestamp", fields[3])?;

        log.push_sample(
            fields[1],
            Sample {
                iteration,
                counter,
                timestamp,
            },
        );
    }

    Ok(log)
}

/// Parse a tcpdump-style capture log.
///
/// Each line carries a packet id and an even number of integer columns;
/// every `tv_sec tv_nsec` pair collapses to a single nanosecond value.
pub fn parse_capture_log(path: &Path) -> Result<Vec<CaptureRecord>, AnalysisError> {
    let contents = read_input(path)?;

    let mut records = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || (fields.len() - 1) % 2 != 0 {
            return Err(AnalysisError::parse(
                path,
                line_no,
                format!(
                    "expected a packet id followed by tv_sec/tv_nsec pairs, got {} fields",
                    fields.len()
                ),
            ));
        }

        let mut timestamps_ns = Vec::with_capacity((fields.len() - 1) / 2);
        for pair in fields[1..].chunks(2) {
            let sec = parse_int::<i64>(path, line_no, "tv_sec", pair[0])?;
            let nsec = parse_int::<i64>(path, line_no, "tv_nsec", pair[1])?;
            timestamps_ns.push(sec * 1_000_000_000 + nsec);
        }

        records.push(CaptureRecord {
            packet_id: fields[0].to_string(),
            timestamps_ns,
        });
    }

    Ok(records)
}

/// Convert a raw tcpdump wall-clock column (`hh:mm:ss.us`) to microseconds
/// since midnight.
pub fn parse_clock_time(text: &str) -> Result<i64, AnalysisError> {
    let parts: Vec<&str> = text.split(':').collect();
    let err = || AnalysisError::parse("<clock>", 0, format!("expected hh:mm:ss.us, got {text:?}"));

    if parts.len() != 3 {
        return Err(err());
    }
    let sec_parts: Vec<&str> = parts[2].split('.').collect();
    if sec_parts.len() != 2 {
        return Err(err());
    }

    let hours: i64 = parts[0].parse().map_err(|_| err())?;
    let minutes: i64 = parts[1].parse().map_err(|_| err())?;
    let seconds: i64 = sec_parts[0].parse().map_err(|_| err())?;
    let micros: i64 = sec_parts[1].parse().map_err(|_| err())?;

    Ok(micros + seconds * 1_000_000 + minutes * 60 * 1_000_000 + hours * 3600 * 1_000_000)
}

/// Machine name embedded in a capture file name, e.g. `sub_guest0.txt`
/// yields `guest0`. Falls back to the whole stem when there is no
/// underscore-separated suffix.
pub fn machine_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.rsplit('_').next().unwrap_or(&stem).to_string()
}

fn read_input(path: &Path) -> Result<String, AnalysisError> {
    fs::read_to_string(path).map_err(|source| AnalysisError::MissingFile {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_int<T: std::str::FromStr>(
    path: &Path,
    line: usize,
    field: &str,
    raw: &str,
) -> Result<T, AnalysisError> {
    raw.trim()
        .parse()
        .map_err(|_| AnalysisError::parse(path, line, format!("invalid {field}: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_log(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parses_sv_log_grouped_by_stream() {
        let f = write_log("0:svID1:0:1000\n0:svID2:0:1001\n0:svID1:1:1010\n");
        let log = parse_sv_log(f.path()).unwrap();

        assert_eq!(log.stream_count(), 2);
        let s1 = log.stream("svID1").unwrap();
        assert_eq!(s1.samples.len(), 2);
        assert_eq!(s1.samples[1].counter, 1);
        assert_eq!(s1.samples[1].timestamp, 1010);
    }

    #[test]
    fn rejects_wrong_field_count() {
        let f = write_log("0:svID1:0:1000\n0:svID1:1\n");
        let err = parse_sv_log(f.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(":2:"), "line number missing from {msg}");
        assert!(msg.contains("4 colon-delimited fields"));
    }

    #[test]
    fn rejects_non_integer_counter() {
        let f = write_log("0:svID1:abc:1000\n");
        let err = parse_sv_log(f.path()).unwrap_err();
        assert!(err.to_string().contains("sequence counter"));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = parse_sv_log(Path::new("/nonexistent/pub.txt")).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingFile { .. }));
    }

    #[test]
    fn parses_capture_pairs_to_nanoseconds() {
        let f = write_log("pkt1 1 500\npkt2 2 0 3 250\n");
        let records = parse_capture_log(f.path()).unwrap();

        assert_eq!(records[0].packet_id, "pkt1");
        assert_eq!(records[0].timestamps_ns, vec![1_000_000_500]);
        assert_eq!(records[1].timestamps_ns, vec![2_000_000_000, 3_000_000_250]);
    }

    #[test]
    fn rejects_odd_timestamp_columns() {
        let f = write_log("pkt1 1 500 2\n");
        assert!(parse_capture_log(f.path()).is_err());
    }

    #[test]
    fn clock_time_to_micros() {
        assert_eq!(parse_clock_time("00:00:01.5").unwrap(), 1_000_005);
        assert_eq!(
            parse_clock_time("01:02:03.000004").unwrap(),
            3600_000_000 + 2 * 60 * 1_000_000 + 3 * 1_000_000 + 4
        );
        assert!(parse_clock_time("12:34").is_err());
    }

    #[test]
    fn machine_name_from_file_stem() {
        assert_eq!(machine_name(Path::new("/tmp/sub_guest0.txt")), "guest0");
        assert_eq!(machine_name(Path::new("results_vm1.log")), "vm1");
        assert_eq!(machine_name(Path::new("plain.txt")), "plain");
    }
}
