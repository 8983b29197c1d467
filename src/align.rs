//! Publisher/subscriber stream alignment and drop reconciliation.
//!
//! Publisher and subscriber capture the same SV traffic independently;
//! the only shared identity is the per-stream sequence counter, which
//! restarts at 0 for every iteration and ends at `iteration_size - 1`.
//! When the subscriber missed samples, the two logs disagree in length
//! and a positional diff would smear every latency after the first gap.
//!
//! Reconciliation walks the subscriber log iteration by iteration,
//! derives the missing counters from the deltas (plus the iteration's
//! head/tail boundaries), and deletes the matching surplus entries from
//! the publisher side, which is assumed complete. After repair the two
//! sides correspond positionally again and latency is a plain
//! elementwise difference.
//!
//! A counter that fails to increase inside one iteration means the
//! network delivered out of order; every latency computed from such a
//! log would be wrong, so that is fatal.

use tracing::warn;

use crate::config::AlignConfig;
use crate::error::AnalysisError;
use crate::sample::Sample;

/// Result of aligning one (publisher, subscriber) stream pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Subscriber timestamp minus publisher timestamp, per matched sample.
    pub latencies: Vec<i64>,
    /// Publisher entries removed to compensate for subscriber drops.
    pub drops: usize,
}

/// Align a publisher stream with its subscriber counterpart and compute
/// the latency sequence.
///
/// Equal sample counts take the fast path: direct positional
/// correspondence, zero drops. Anything else goes through counter-based
/// drop reconciliation first.
pub fn align_streams(
    stream_id: &str,
    publisher: &[Sample],
    subscriber: &[Sample],
    cfg: &AlignConfig,
) -> Result<Alignment, AnalysisError> {
    if publisher.len() == subscriber.len() {
        return Ok(Alignment {
            latencies: positional_latency(publisher, subscriber),
            drops: 0,
        });
    }

    let mut publisher = publisher.to_vec();
    let drops = reconcile_drops(stream_id, &mut publisher, subscriber, cfg)?;
    report_residual_mismatch(stream_id, &publisher, subscriber);

    Ok(Alignment {
        latencies: positional_latency(&publisher, subscriber),
        drops,
    })
}

fn positional_latency(publisher: &[Sample], subscriber: &[Sample]) -> Vec<i64> {
    publisher
        .iter()
        .zip(subscriber)
        .map(|(p, s)| s.timestamp - p.timestamp)
        .collect()
}

/// Detect subscriber drops via counter continuity and delete the matching
/// publisher entries so both sides realign positionally.
///
/// Deletions use subscriber-based indices and run in ascending order:
/// once the surplus for an earlier gap is gone, publisher and subscriber
/// agree positionally up to the next gap, so the next subscriber index
/// points at the right publisher entry again.
fn reconcile_drops(
    stream_id: &str,
    publisher: &mut Vec<Sample>,
    subscriber: &[Sample],
    cfg: &AlignConfig,
) -> Result<usize, AnalysisError> {
    let mut iterations: Vec<u32> = publisher.iter().map(|s| s.iteration).collect();
    iterations.sort_unstable();
    iterations.dedup();

    let mut total_drops = 0usize;
    for &iteration in &iterations {
        let Some(start) = subscriber.iter().position(|s| s.iteration == iteration) else {
            // The subscriber captured nothing at all for this iteration;
            // discard the whole publisher batch.
            let before = publisher.len();
            publisher.retain(|s| s.iteration != iteration);
            let removed = before - publisher.len();
            warn!(
                stream = stream_id,
                iteration, removed, "subscriber captured no samples for iteration"
            );
            total_drops += removed;
            continue;
        };
        let end = subscriber
            .iter()
            .rposition(|s| s.iteration == iteration)
            .unwrap_or(start)
            + 1;
        let batch = &subscriber[start..end];

        // Gap positions are subscriber indices relative to the batch:
        // deleting at `start + index` removes the publisher entry that has
        // no subscriber counterpart.
        let mut gaps: Vec<(usize, usize)> = Vec::new();

        if batch[0].counter > 0 {
            gaps.push((0, batch[0].counter as usize));
        }
        for (i, pair) in batch.windows(2).enumerate() {
            let delta = i64::from(pair[1].counter) - i64::from(pair[0].counter);
            if delta < 1 {
                return Err(AnalysisError::Ordering {
                    stream: stream_id.to_string(),
                    iteration,
                    previous: pair[0].counter,
                    next: pair[1].counter,
                });
            }
            if delta > 1 {
                gaps.push((i + 1, (delta - 1) as usize));
            }
        }
        let last = batch[batch.len() - 1].counter;
        if last + 1 < cfg.iteration_size {
            // Tail gap: the missing entries sit one past the last matched
            // position, never outside the batch.
            gaps.push((batch.len(), (cfg.iteration_size - 1 - last) as usize));
        }

        for (index, missing) in gaps {
            let at = start + index;
            let mut removed = 0;
            for _ in 0..missing {
                if at < publisher.len() {
                    publisher.remove(at);
                    removed += 1;
                }
            }
            if removed < missing {
                warn!(
                    stream = stream_id,
                    iteration,
                    missing,
                    removed,
                    "publisher log ends before all dropped samples could be reconciled"
                );
            }
            total_drops += removed;
        }
    }

    Ok(total_drops)
}

/// Post-repair sanity diagnostic: any counter mismatch or length surplus
/// left at this point means the logs disagree beyond simple drops. Not
/// fatal, but worth flagging before the report is trusted.
fn report_residual_mismatch(stream_id: &str, publisher: &[Sample], subscriber: &[Sample]) {
    let min_len = publisher.len().min(subscriber.len());

    let mismatched = (0..min_len)
        .filter(|&i| publisher[i].counter != subscriber[i].counter)
        .count();
    if mismatched > 0 {
        warn!(
            stream = stream_id,
            mismatched, "SV counter misalignment between publisher and subscriber after repair"
        );
    }

    if publisher.len() != subscriber.len() {
        let (side, surplus) = if publisher.len() > subscriber.len() {
            ("publisher", publisher.len() - min_len)
        } else {
            ("subscriber", subscriber.len() - min_len)
        };
        warn!(
            stream = stream_id,
            side, surplus, "surplus samples remain after repair"
        );
    }
}
