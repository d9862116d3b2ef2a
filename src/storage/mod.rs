//! Row sequence and span storage (spec C2).

pub mod row;
pub mod span;

pub use row::RowSeq;
pub use span::{Span, SpanCursor};
