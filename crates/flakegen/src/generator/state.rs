use core::cmp::Ordering;

use crate::{Error, NodeId, Poll, Result, SnowflakeId};

/// One step of the clock-and-sequence state machine.
///
/// `last` is the most recently issued ID, or `None` before the first one.
/// On [`Poll::Ready`] the returned ID is also the new state; on
/// [`Poll::Pending`] and on error the state must be left as is.
#[inline]
pub(crate) fn advance(last: Option<SnowflakeId>, node_id: NodeId, now: u64) -> Result<Poll> {
    let Some(last) = last else {
        return Ok(Poll::Ready {
            id: SnowflakeId::first_at(now, node_id),
        });
    };

    let last_ts = last.timestamp();
    match now.cmp(&last_ts) {
        Ordering::Equal => {
            if last.has_sequence_room() {
                Ok(Poll::Ready {
                    id: last.increment_sequence(),
                })
            } else {
                Ok(Poll::Pending { yield_for: 1 })
            }
        }
        Ordering::Greater => Ok(Poll::Ready {
            id: last.rollover_to_timestamp(now),
        }),
        Ordering::Less => Err(cold_clock_behind(now, last_ts)),
    }
}

#[cold]
#[inline(never)]
fn cold_clock_behind(now: u64, last: u64) -> Error {
    #[cfg(feature = "tracing")]
    tracing::warn!(now, last, "clock moved backwards, refusing to generate id");
    Error::ClockRegression { now, last }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_SEQUENCE;

    fn node(n: u64) -> NodeId {
        NodeId::try_from(n).unwrap()
    }

    #[test]
    fn first_id_starts_at_sequence_zero() {
        let poll = advance(None, node(3), 0).unwrap();
        assert_eq!(
            poll,
            Poll::Ready {
                id: SnowflakeId::from_components(0, 3, 0)
            }
        );
    }

    #[test]
    fn same_millisecond_increments() {
        let last = SnowflakeId::from_components(10, 3, 5);
        let poll = advance(Some(last), node(3), 10).unwrap();
        assert_eq!(
            poll,
            Poll::Ready {
                id: SnowflakeId::from_components(10, 3, 6)
            }
        );
    }

    #[test]
    fn exhausted_millisecond_is_pending() {
        let last = SnowflakeId::from_components(10, 3, MAX_SEQUENCE);
        let poll = advance(Some(last), node(3), 10).unwrap();
        assert_eq!(poll, Poll::Pending { yield_for: 1 });
    }

    #[test]
    fn newer_millisecond_resets_sequence() {
        let last = SnowflakeId::from_components(10, 3, MAX_SEQUENCE);
        let poll = advance(Some(last), node(3), 12).unwrap();
        assert_eq!(
            poll,
            Poll::Ready {
                id: SnowflakeId::from_components(12, 3, 0)
            }
        );
    }

    #[test]
    fn older_millisecond_is_an_error() {
        let last = SnowflakeId::from_components(10, 3, 0);
        let err = advance(Some(last), node(3), 9).unwrap_err();
        assert_eq!(err, Error::ClockRegression { now: 9, last: 10 });
    }
}
