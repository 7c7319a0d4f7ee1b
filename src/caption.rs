use std::fmt;

/// An offset into the video, as written in the transcript.
///
/// Minutes and seconds are within `0..60` when parsed, but `seconds` may
/// exceed 59 for the final caption's end time (see [`TimePoint::plus_seconds`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimePoint {
    pub(crate) hours: u32,
    pub(crate) minutes: u32,
    pub(crate) seconds: u32,
}

impl TimePoint {
    pub const fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Adds to the seconds field only, without carrying into minutes.
    /// `00:00:58` plus 5 gives `00:00:63`.
    pub const fn plus_seconds(self, secs: u32) -> Self {
        Self {
            seconds: self.seconds + secs,
            ..self
        }
    }

    pub const fn plus_seconds_carried(self, secs: u32) -> Self {
        let total = self.seconds + secs;
        let minutes = self.minutes + total / 60;
        Self {
            hours: self.hours + minutes / 60,
            minutes: minutes % 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub(crate) start: TimePoint,
    pub(crate) end: TimePoint,
    pub(crate) text: String,
}
