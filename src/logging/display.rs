//! Command-line logger
use super::{LogError, LogValue, StatsLogger};
use crate::utils::stats::OnlineMeanVariance;
use std::collections::{btree_map::Entry, BTreeMap};
use std::fmt;
use std::iter;
use std::ops::Drop;
use std::time::{Duration, Instant};
use yansi::Paint;

/// Logger that displays summaries to standard output.
///
/// Values are aggregated by name and a summary is printed every `flush_every` groups
/// (see [`StatsLogger::group_end`]) and when the logger is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLogger {
    summaries: BTreeMap<String, Summary>,
    flush_every: usize,
    groups_since_flush: usize,
    chunk_start: Instant,
}

impl DisplayLogger {
    /// Create a logger that flushes every `flush_every` groups (at least 1).
    pub fn new(flush_every: usize) -> Self {
        Self {
            summaries: BTreeMap::new(),
            flush_every: flush_every.max(1),
            groups_since_flush: 0,
            chunk_start: Instant::now(),
        }
    }
}

impl Default for DisplayLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl StatsLogger for DisplayLogger {
    fn log(&mut self, name: &str, value: LogValue) -> Result<(), LogError> {
        match self.summaries.entry(name.into()) {
            Entry::Vacant(e) => {
                e.insert(Summary::new(value));
                Ok(())
            }
            Entry::Occupied(e) => e
                .into_mut()
                .push(value)
                .map_err(|expected| LogError::new(name, value, expected)),
        }
    }

    fn group_end(&mut self) {
        self.groups_since_flush += 1;
        if self.groups_since_flush >= self.flush_every {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.summaries.values().any(|s| s.dirty) {
            let elapsed = self.chunk_start.elapsed();
            println!();
            let header = format!(
                "==== {} groups in {:.2?} ====",
                self.groups_since_flush, elapsed
            );
            println!("{}", Paint::fixed(245, header));
            for (name, summary) in self.summaries.iter().filter(|(_, s)| s.dirty) {
                println!("{:<28} {}", Paint::fixed(35, name), summary);
            }
        }
        for summary in self.summaries.values_mut() {
            summary.reset();
        }
        self.groups_since_flush = 0;
        self.chunk_start = Instant::now();
    }
}

/// Flush when dropped
impl Drop for DisplayLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Summary {
    kind: SummaryKind,
    /// Whether the summary has been updated since the last flush
    dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum SummaryKind {
    Scalar(OnlineMeanVariance<f64>),
    Counter { total: u64, increment: u64 },
    Duration(OnlineMeanVariance<f64>),
}

impl Summary {
    fn new(value: LogValue) -> Self {
        let kind = match value {
            LogValue::Scalar(x) => SummaryKind::Scalar(iter::once(x).collect()),
            LogValue::CounterIncrement(n) => SummaryKind::Counter {
                total: n,
                increment: n,
            },
            LogValue::Duration(d) => SummaryKind::Duration(iter::once(d.as_secs_f64()).collect()),
        };
        Self { kind, dirty: true }
    }

    fn push(&mut self, value: LogValue) -> Result<(), &'static str> {
        match (&mut self.kind, value) {
            (SummaryKind::Scalar(stats), LogValue::Scalar(x)) => stats.push(x),
            (SummaryKind::Counter { total, increment }, LogValue::CounterIncrement(n)) => {
                *total += n;
                *increment += n;
            }
            (SummaryKind::Duration(stats), LogValue::Duration(d)) => stats.push(d.as_secs_f64()),
            (kind, _) => return Err(kind.expected()),
        }
        self.dirty = true;
        Ok(())
    }

    fn reset(&mut self) {
        match &mut self.kind {
            SummaryKind::Scalar(stats) | SummaryKind::Duration(stats) => {
                *stats = OnlineMeanVariance::default()
            }
            SummaryKind::Counter { increment, .. } => *increment = 0,
        }
        self.dirty = false;
    }
}

impl SummaryKind {
    fn expected(&self) -> &'static str {
        match self {
            Self::Scalar(_) => LogValue::Scalar(0.0).kind(),
            Self::Counter { .. } => LogValue::CounterIncrement(0).kind(),
            Self::Duration(_) => LogValue::Duration(Duration::ZERO).kind(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            SummaryKind::Scalar(stats) => {
                if let (Some(mean), Some(stddev)) = (stats.mean(), stats.stddev()) {
                    write!(f, "{:.3}", mean)?;
                    if stats.count() > 1 {
                        write!(f, "  σ {}", Paint::fixed(253, format!("{:.3}", stddev)))?;
                    }
                }
                Ok(())
            }
            SummaryKind::Counter { total, increment } => {
                write!(f, "{}  (+{})", total, Paint::fixed(253, increment))
            }
            SummaryKind::Duration(stats) => match stats.mean() {
                Some(mean) => write!(f, "{:.2?}", Duration::from_secs_f64(mean)),
                None => Ok(()),
            },
        }
    }
}
