//! Time-shift processor (spec §4.6 "Time-shift"): shifts a source's
//! emitted timestamps by a fixed duration, generic over the per-type
//! value carried alongside the timestamp.

use crate::config::TimeShiftConfig;
use crate::error::CoreResult;
use crate::iterator::PullIterator;
use crate::timestamp::TimeStamp;

/// Wraps any per-type source, adding (or, if `previous`, subtracting) a
/// fixed number of seconds to every emitted timestamp. Calendar-aware
/// month/year shifting is out of scope here — the core only carries the
/// `zone` field through for a presentation layer to interpret
/// (`[ADD]` Zone handling, spec §3 expansion); `amount_seconds` is always a
/// fixed-width shift.
pub struct TimeShiftIterator<S, T> {
    source: S,
    config: TimeShiftConfig,
    current: Option<(TimeStamp, T)>,
}

impl<S, T> TimeShiftIterator<S, T>
where
    S: PullIterator<Item = (TimeStamp, T)>,
    T: Clone,
{
    pub fn new(source: S, config: TimeShiftConfig) -> Self {
        TimeShiftIterator {
            source,
            config,
            current: None,
        }
    }

    fn shifted(&self, ts: &TimeStamp) -> TimeStamp {
        let delta = if self.config.previous {
            -self.config.amount_seconds
        } else {
            self.config.amount_seconds
        };
        let mut shifted = ts.copy_out();
        shifted.set(ts.epoch_sec + delta, ts.nanos);
        shifted
    }
}

impl<S, T> PullIterator for TimeShiftIterator<S, T>
where
    S: PullIterator<Item = (TimeStamp, T)>,
    T: Clone,
{
    type Item = (TimeStamp, T);

    fn has_next(&mut self) -> bool {
        self.source.has_next()
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        match self.source.next()? {
            Some((ts, value)) => {
                let shifted = self.shifted(ts);
                self.current = Some((shifted, value.clone()));
                Ok(self.current.as_ref())
            }
            None => {
                self.current = None;
                Ok(None)
            }
        }
    }

    fn close(&mut self) {
        self.source.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Numeric;

    struct OnePoint(Option<(TimeStamp, Numeric)>, (TimeStamp, Numeric));

    impl OnePoint {
        fn new(sec: i64, v: i64) -> Self {
            let pair = (TimeStamp::new(sec, 0), Numeric::Long(v));
            OnePoint(Some(pair.clone()), pair)
        }
    }

    impl PullIterator for OnePoint {
        type Item = (TimeStamp, Numeric);

        fn has_next(&mut self) -> bool {
            self.0.is_some()
        }

        fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
            if self.0.take().is_some() {
                Ok(Some(&self.1))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn forward_shift_adds_seconds() {
        let source = OnePoint::new(100, 1);
        let mut shift = TimeShiftIterator::new(
            source,
            TimeShiftConfig {
                amount_seconds: 3600,
                previous: false,
            },
        );
        let (ts, _) = shift.next().unwrap().unwrap().clone();
        assert_eq!(ts.epoch_sec, 3700);
    }

    #[test]
    fn previous_shift_subtracts_seconds() {
        let source = OnePoint::new(100, 1);
        let mut shift = TimeShiftIterator::new(
            source,
            TimeShiftConfig {
                amount_seconds: 60,
                previous: true,
            },
        );
        let (ts, _) = shift.next().unwrap().unwrap().clone();
        assert_eq!(ts.epoch_sec, 40);
    }
}
