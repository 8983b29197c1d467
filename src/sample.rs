//! Data model for captured Sampled-Value timestamp logs.
//!
//! A publisher or subscriber log is a flat sequence of lines; parsing
//! regroups it into one [`SvStream`] per stream id, preserving both the
//! first-encounter order of streams and the file order of samples inside
//! each stream. Nothing is re-sorted: arrival order is part of the data.

use serde::Serialize;

/// One captured sample, i.e. one line of a publisher or subscriber log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    /// Coarse batch index assigned by the traffic generator.
    pub iteration: u32,
    /// Per-stream SV counter, expected to step by one and wrap at the
    /// configured iteration size.
    pub counter: u32,
    /// Capture timestamp; unit is whatever the rig wrote (microseconds
    /// for the SV logs handled here).
    pub timestamp: i64,
}

/// All samples sharing one stream id, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvStream {
    pub id: String,
    pub samples: Vec<Sample>,
}

/// A fully parsed SV log: streams in first-encounter order.
#[derive(Debug, Clone, Default)]
pub struct SvLog {
    pub streams: Vec<SvStream>,
}

impl SvLog {
    /// Look up a stream by id.
    pub fn stream(&self, id: &str) -> Option<&SvStream> {
        self.streams.iter().find(|s| s.id == id)
    }

    /// Number of distinct streams seen in the log.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub(crate) fn push_sample(&mut self, id: &str, sample: Sample) {
        match self.streams.iter_mut().find(|s| s.id == id) {
            Some(stream) => stream.samples.push(sample),
            None => self.streams.push(SvStream {
                id: id.to_string(),
                samples: vec![sample],
            }),
        }
    }
}

/// One line of a tcpdump-style capture log: a packet id plus one or more
/// timestamps already collapsed to nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub packet_id: String,
    pub timestamps_ns: Vec<i64>,
}

impl CaptureRecord {
    /// First (hardware) timestamp of the record.
    pub fn primary_ts(&self) -> i64 {
        self.timestamps_ns[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(iteration: u32, counter: u32, timestamp: i64) -> Sample {
        Sample {
            iteration,
            counter,
            timestamp,
        }
    }

    #[test]
    fn streams_keep_first_encounter_order() {
        let mut log = SvLog::default();
        log.push_sample("svID2", sample(0, 0, 10));
        log.push_sample("svID1", sample(0, 0, 11));
        log.push_sample("svID2", sample(0, 1, 12));

        assert_eq!(log.stream_count(), 2);
        assert_eq!(log.streams[0].id, "svID2");
        assert_eq!(log.streams[1].id, "svID1");
        assert_eq!(log.stream("svID2").unwrap().samples.len(), 2);
    }

    #[test]
    fn samples_keep_file_order() {
        let mut log = SvLog::default();
        log.push_sample("s", sample(0, 2, 30));
        log.push_sample("s", sample(0, 1, 20));

        let counters: Vec<u32> = log.stream("s").unwrap().samples.iter().map(|s| s.counter).collect();
        assert_eq!(counters, vec![2, 1]);
    }
}
