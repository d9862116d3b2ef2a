//! Span: an ordered, read-only collection of decoded rows for one time
//! series, with forward/reverse iteration (spec §3, §4.2, C2).

use crate::codec;
use crate::error::{CoreError, CoreResult};
use crate::iterator::PullIterator;
use crate::storage::row::RowSeq;
use crate::timestamp::TimeStamp;
use crate::types::Numeric;

/// An ordered list of rows for one time series. Rows are accepted only in
/// non-decreasing `base_timestamp` order (spec §4.2 insertion contract);
/// empty rows are silently skipped on append (spec §3 invariant).
#[derive(Debug, Clone, Default)]
pub struct Span {
    rows: Vec<RowSeq>,
}

impl Span {
    pub fn new() -> Self {
        Span::default()
    }

    /// Accepts `row` only if its `base_timestamp` is >= the last accepted
    /// row's; out-of-order insertion is an [`CoreError::InvariantError`]
    /// (spec §4.2).
    pub fn add_sequence(&mut self, row: RowSeq) -> CoreResult<()> {
        if row.is_empty() {
            return Ok(());
        }
        if let Some(last) = self.rows.last() {
            if row.base_timestamp < last.base_timestamp {
                tracing::warn!(
                    base_timestamp = row.base_timestamp,
                    last = last.base_timestamp,
                    "rejected out-of-order row insertion"
                );
                return Err(CoreError::invariant(format!(
                    "out-of-order row insertion: base_timestamp {} < last {}",
                    row.base_timestamp, last.base_timestamp
                )));
            }
        }
        tracing::trace!(base_timestamp = row.base_timestamp, bytes = row.data.len(), "appended row");
        self.rows.push(row);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter_forward(&self) -> SpanCursor<'_> {
        SpanCursor::new(self, Direction::Forward)
    }

    pub fn iter_reverse(&self) -> SpanCursor<'_> {
        SpanCursor::new(self, Direction::Reverse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// Cursor state machine: `Start -> InRow(r,b) -> Advance -> EndOfRow ->
/// InRow(r+1,0) | End` (spec §4.2). Reverse iteration walks rows
/// descending; per-row qualifier order stays ascending within the row —
/// the spec explicitly carves row-reversal/dedup out as a downstream pass
/// (spec §4.2, `[ADD 4.2a]` in SPEC_FULL.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Start,
    InRow { row: usize, byte: usize },
    End,
}

/// A read-only, pull-driven view over a [`Span`]'s decoded points.
///
/// The yielded `(TimeStamp, Numeric)` pair recycles a single `TimeStamp`
/// buffer (spec §3 "callers must not retain iterator-yielded references
/// across a `next()` call").
pub struct SpanCursor<'a> {
    span: &'a Span,
    direction: Direction,
    state: CursorState,
    current: (TimeStamp, Numeric),
}

impl<'a> SpanCursor<'a> {
    fn new(span: &'a Span, direction: Direction) -> Self {
        SpanCursor {
            span,
            direction,
            state: CursorState::Start,
            current: (TimeStamp::new(0, 0), Numeric::Long(0)),
        }
    }

    fn first_row_index(&self) -> Option<usize> {
        if self.span.rows.is_empty() {
            return None;
        }
        Some(match self.direction {
            Direction::Forward => 0,
            Direction::Reverse => self.span.rows.len() - 1,
        })
    }

    fn step_row_index(&self, row: usize) -> Option<usize> {
        match self.direction {
            Direction::Forward => {
                let next = row + 1;
                (next < self.span.rows.len()).then_some(next)
            }
            Direction::Reverse => row.checked_sub(1),
        }
    }
}

impl<'a> PullIterator for SpanCursor<'a> {
    type Item = (TimeStamp, Numeric);

    fn has_next(&mut self) -> bool {
        match self.state {
            CursorState::End => false,
            CursorState::Start => self.first_row_index().is_some(),
            CursorState::InRow { row, byte } => {
                let data_len = self.span.rows[row].data.len();
                if byte < data_len {
                    true
                } else {
                    // EndOfRow: peek whether another non-exhausted row follows.
                    self.step_row_index(row).is_some()
                }
            }
        }
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        loop {
            match self.state {
                CursorState::End => return Ok(None),
                CursorState::Start => {
                    self.state = match self.first_row_index() {
                        Some(row) => CursorState::InRow { row, byte: 0 },
                        None => CursorState::End,
                    };
                }
                CursorState::InRow { row, byte } => {
                    let data_len = self.span.rows[row].data.len();
                    if byte >= data_len {
                        // EndOfRow -> InRow(next, 0) | End.
                        self.state = match self.step_row_index(row) {
                            Some(next_row) => CursorState::InRow {
                                row: next_row,
                                byte: 0,
                            },
                            None => CursorState::End,
                        };
                        continue;
                    }
                    let row_data = &self.span.rows[row].data;
                    let point = codec::decode_point(row_data, byte)?;
                    let base = self.span.rows[row].base_timestamp;
                    let total_ns = base as i128 * 1_000_000_000 + point.offset_ns as i128;
                    self.current.0.set(
                        total_ns.div_euclid(1_000_000_000) as i64,
                        total_ns.rem_euclid(1_000_000_000) as u32,
                    );
                    self.current.1 = point.value;
                    self.state = CursorState::InRow {
                        row,
                        byte: byte + point.width,
                    };
                    return Ok(Some(&self.current));
                }
            }
        }
    }

    fn close(&mut self) {
        tracing::debug!("span cursor closed");
        self.state = CursorState::End;
    }
}
