use crate::{InputError, Timestamp};

/// Tracks bar boundaries from consecutive `open_time` values.
#[derive(Clone, Copy, Default, Debug)]
pub(crate) struct BarClock {
    last_open_time: Option<Timestamp>,
}

impl BarClock {
    /// Returns `true` when `open_time` starts a new bar and `false` when it
    /// repaints the current one. Rejects a decreasing `open_time` without
    /// touching state.
    #[inline]
    pub(crate) fn advance(&mut self, open_time: Timestamp) -> Result<bool, InputError> {
        match self.last_open_time {
            Some(last) if open_time < last => Err(InputError::OutOfOrder {
                last,
                got: open_time,
            }),
            Some(last) if open_time == last => Ok(false),
            _ => {
                self.last_open_time = Some(open_time);
                Ok(true)
            }
        }
    }
}
