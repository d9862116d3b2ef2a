//! `ts-query-core`: the in-memory query execution core of a time-series
//! database — row codec, per-type iterator pipeline, and
//! interpolation/fill layer.
//!
//! This crate is consumed by a host process that owns the storage
//! transport, HTTP surface, and planner; it only exposes the types and
//! functions those hosts call. See each module for the component of the
//! pipeline it implements:
//!
//! - [`codec`]: bit-packed row layout (qualifier + value codec, rollups).
//! - [`storage`]: row sequences and the read-only, iterable [`storage::Span`].
//! - [`aggregate`]: the reducer library (sum/avg/min/max/percentile/...).
//! - [`filter`]: the tag/metric filter tree.
//! - [`interpolate`]: per-type fill-aware alignment to a requested timestamp.
//! - [`iterator`]: the pull-driven per-type processor iterator pipeline.
//! - [`result`]: the concurrent query-result accumulator.
//! - [`plan`]: the planner-consumed node graph contract.
//! - [`write_status`]: the write-attempt status taxonomy.
//! - [`config`]: `serde`-deserializable node/processor configuration shapes.
//! - [`hash`]: deterministic hashing for plan fingerprints and cache keys.
//! - [`error`]: the crate-wide error taxonomy.

pub mod aggregate;
pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod hash;
pub mod interpolate;
pub mod iterator;
pub mod plan;
pub mod result;
pub mod storage;
pub mod timestamp;
pub mod types;
pub mod write_status;

pub use error::{CoreError, CoreResult};
pub use timestamp::TimeStamp;
pub use types::{DataType, Numeric, NumericArray, NumericSummary, TagMap};
