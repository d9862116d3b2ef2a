//! Timestamp type shared across the codec, span, and interpolator layers
//! (spec §3 "Time stamp").

use std::cmp::Ordering;

/// Epoch seconds + nanoseconds + an optional IANA zone name.
///
/// Ordering is on `(seconds, nanos)` only; `zone` does not participate in
/// comparison — it is carried through for the (out-of-scope) presentation
/// layer and for calendar-aware time-shift arithmetic (spec §4.6).
///
/// Iterators recycle a single `TimeStamp` instance as their cursor (spec
/// §3, §5 aliasing contract): callers must read fields before calling
/// `next()` again, or use [`TimeStamp::copy_out`] to snapshot.
#[derive(Debug, Clone)]
pub struct TimeStamp {
    pub epoch_sec: i64,
    pub nanos: u32,
    pub zone: Option<String>,
    /// True when this timestamp was decoded from a second-resolution row;
    /// callers that care about raw precision (rather than requested
    /// output precision) can check this instead of `nanos == 0`.
    pub ms_flag: bool,
}

impl TimeStamp {
    pub const fn new(epoch_sec: i64, nanos: u32) -> Self {
        TimeStamp {
            epoch_sec,
            nanos,
            zone: None,
            ms_flag: false,
        }
    }

    pub fn with_zone(epoch_sec: i64, nanos: u32, zone: impl Into<String>) -> Self {
        TimeStamp {
            epoch_sec,
            nanos,
            zone: Some(zone.into()),
            ms_flag: false,
        }
    }

    /// Total offset in nanoseconds since the unix epoch.
    pub fn epoch_nanos(&self) -> i128 {
        (self.epoch_sec as i128) * 1_000_000_000 + self.nanos as i128
    }

    pub fn epoch_millis(&self) -> i64 {
        self.epoch_sec * 1_000 + (self.nanos / 1_000_000) as i64
    }

    /// Snapshot this timestamp so it survives past the next iterator
    /// `next()` call (spec §5 aliasing contract, §9 design notes).
    pub fn copy_out(&self) -> TimeStamp {
        self.clone()
    }

    /// Overwrite in place; used by cursor-recycling iterators.
    pub fn set(&mut self, epoch_sec: i64, nanos: u32) {
        self.epoch_sec = epoch_sec;
        self.nanos = nanos;
    }
}

impl PartialEq for TimeStamp {
    fn eq(&self, other: &Self) -> bool {
        self.epoch_sec == other.epoch_sec && self.nanos == other.nanos
    }
}
impl Eq for TimeStamp {}

impl PartialOrd for TimeStamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeStamp {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.epoch_sec, self.nanos).cmp(&(other.epoch_sec, other.nanos))
    }
}
