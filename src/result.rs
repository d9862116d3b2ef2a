//! Query result accumulator (spec C8, §4.7): the one component with true
//! concurrent mutation — multiple storage I/O completions may call
//! `add_sequence` on the same [`QueryResult`] at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use crate::codec::qualifier::Resolution;
use crate::codec::{self};
use crate::error::{CoreError, CoreResult};
use crate::storage::{RowSeq, Span};

/// One series' accumulated rows, appended to under a short lock (spec §5
/// "Result accumulator is the only component with true concurrent
/// mutation").
pub struct TimeSeries {
    pub row_key: Vec<u8>,
    rows: Mutex<Vec<RowSeq>>,
    reversed: bool,
    keep_earliest: bool,
}

impl TimeSeries {
    fn new(row_key: Vec<u8>, reversed: bool, keep_earliest: bool) -> Self {
        TimeSeries {
            row_key,
            rows: Mutex::new(Vec::new()),
            reversed,
            keep_earliest,
        }
    }

    /// Append `seq`, respecting `reversed` (arrival order) and
    /// `keep_earliest` (tie-break on a duplicate `base_timestamp`) — spec
    /// §4.7 step 2.
    fn append(&self, seq: RowSeq) -> CoreResult<()> {
        if seq.is_empty() {
            return Ok(());
        }
        let mut rows = self.rows.lock();
        if let Some(last) = rows.last() {
            let in_order = if self.reversed {
                seq.base_timestamp <= last.base_timestamp
            } else {
                seq.base_timestamp >= last.base_timestamp
            };
            if !in_order {
                return Err(CoreError::invariant(format!(
                    "out-of-order sequence append: base_timestamp {} vs last {} (reversed={})",
                    seq.base_timestamp, last.base_timestamp, self.reversed
                )));
            }
            if seq.base_timestamp == last.base_timestamp {
                if self.keep_earliest {
                    return Ok(());
                }
                rows.pop();
            }
        }
        rows.push(seq);
        Ok(())
    }

    /// Build a forward-ordered [`Span`] snapshot over the rows accumulated
    /// so far.
    pub fn to_span(&self) -> Span {
        let rows = self.rows.lock();
        let mut span = Span::new();
        let ordered: Vec<RowSeq> = if self.reversed {
            rows.iter().rev().cloned().collect()
        } else {
            rows.clone()
        };
        for row in ordered {
            span.add_sequence(row)
                .expect("TimeSeries::append already enforces row ordering");
        }
        span
    }
}

/// Accumulates rows across concurrently-completing storage fetches into
/// per-series [`TimeSeries`] (spec C8, §4.7).
pub struct QueryResult {
    series: RwLock<HashMap<u64, Arc<TimeSeries>>>,
    byte_count: AtomicU64,
    dp_count: AtomicUsize,
    is_full: AtomicBool,
    byte_cap: u64,
    dp_cap: usize,
    reversed: bool,
    keep_earliest: bool,
    resolution: Mutex<Option<Resolution>>,
    error: Mutex<Option<CoreError>>,
    memoized: OnceCell<Vec<Arc<TimeSeries>>>,
}

impl QueryResult {
    pub fn new(byte_cap: u64, dp_cap: usize, reversed: bool, keep_earliest: bool) -> Self {
        QueryResult {
            series: RwLock::new(HashMap::new()),
            byte_count: AtomicU64::new(0),
            dp_count: AtomicUsize::new(0),
            is_full: AtomicBool::new(false),
            byte_cap,
            dp_cap,
            reversed,
            keep_earliest,
            resolution: Mutex::new(None),
            error: Mutex::new(None),
            memoized: OnceCell::new(),
        }
    }

    /// spec §4.7 `add_sequence(tsuid_hash, row_key, seq, seq_resolution)`.
    pub fn add_sequence(
        &self,
        tsuid_hash: u64,
        row_key: Vec<u8>,
        seq: RowSeq,
        seq_resolution: Resolution,
    ) -> CoreResult<()> {
        let series = self.get_or_insert(tsuid_hash, row_key);

        let byte_delta = seq.size_bytes() as u64;
        let dp_delta = codec::decode_all(&seq.data)
            .map_err(CoreError::from)?
            .len();

        series.append(seq)?;

        let new_bytes = self.byte_count.fetch_add(byte_delta, Ordering::SeqCst) + byte_delta;
        let new_dps = self.dp_count.fetch_add(dp_delta, Ordering::SeqCst) + dp_delta;
        let byte_tripped = new_bytes > self.byte_cap;
        if byte_tripped || new_dps > self.dp_cap {
            if !self.is_full.swap(true, Ordering::SeqCst) {
                tracing::warn!(message = %self.cap_exceeded_message(byte_tripped), "query result is full");
            }
        }

        self.promote_resolution(seq_resolution);
        Ok(())
    }

    /// Human-readable overflow message (spec §5 "exceeding it yields an
    /// error string (formatted in MB when the byte cap tripped)").
    fn cap_exceeded_message(&self, byte_tripped: bool) -> String {
        if byte_tripped {
            let mb = self.byte_count.load(Ordering::SeqCst) as f64 / (1024.0 * 1024.0);
            let cap_mb = self.byte_cap as f64 / (1024.0 * 1024.0);
            format!("query result exceeded byte limit: {mb:.2}MB > {cap_mb:.2}MB")
        } else {
            format!(
                "query result exceeded data point limit: {} > {}",
                self.dp_count.load(Ordering::SeqCst),
                self.dp_cap
            )
        }
    }

    fn get_or_insert(&self, tsuid_hash: u64, row_key: Vec<u8>) -> Arc<TimeSeries> {
        if let Some(existing) = self.series.read().get(&tsuid_hash) {
            return Arc::clone(existing);
        }
        let mut write = self.series.write();
        // Put-if-absent: re-check after acquiring the write lock in case
        // another writer raced us here (spec §4.7 step 1).
        Arc::clone(
            write
                .entry(tsuid_hash)
                .or_insert_with(|| Arc::new(TimeSeries::new(row_key, self.reversed, self.keep_earliest))),
        )
    }

    /// Monotone-tightening update: only ever moves toward the finer
    /// resolution, never regresses (spec §4.7, `[ADD 4.7a]`).
    fn promote_resolution(&self, seq_resolution: Resolution) {
        let mut current = self.resolution.lock();
        *current = Some(match *current {
            Some(existing) if existing.is_finer_than(seq_resolution) || existing == seq_resolution => existing,
            _ => seq_resolution,
        });
    }

    pub fn resolution(&self) -> Option<Resolution> {
        *self.resolution.lock()
    }

    pub fn is_full(&self) -> bool {
        self.is_full.load(Ordering::SeqCst)
    }

    pub fn byte_count(&self) -> u64 {
        self.byte_count.load(Ordering::SeqCst)
    }

    pub fn dp_count(&self) -> usize {
        self.dp_count.load(Ordering::SeqCst)
    }

    /// First-writer-wins error latch (spec §5, §7 "the result accumulator
    /// records the first error and the first cause; later errors are
    /// dropped").
    pub fn latch_error(&self, err: CoreError) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            tracing::error!(error = %err, "latched first error onto query result");
            *slot = Some(err);
        }
    }

    pub fn error(&self) -> Option<CoreError> {
        self.error.lock().clone()
    }

    /// Returns a stable snapshot; after the first call the list is
    /// memoized (spec §4.7 "Finalization").
    pub fn time_series(&self) -> &[Arc<TimeSeries>] {
        self.memoized.get_or_init(|| self.series.read().values().cloned().collect())
    }
}
