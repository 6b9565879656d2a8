use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Upper bound on a window: roughly a thousand years. Anything adding this to
/// a present-day instant stays well inside `DateTime<Utc>`'s range.
pub const MAX_WINDOW_HOURS: f64 = 1000.0 * 366.0 * 24.0;

/// Hours a freshly minted token stays nominally valid.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct WindowHours(f64);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("window hours must be a finite number between 0 and {max}, got {0}", max = MAX_WINDOW_HOURS)]
pub struct InvalidWindow(pub f64);

impl WindowHours {
    pub fn new(hours: f64) -> Result<Self, InvalidWindow> {
        if !hours.is_finite() || !(0.0..=MAX_WINDOW_HOURS).contains(&hours) {
            return Err(InvalidWindow(hours));
        }
        let millis = (hours * MILLIS_PER_HOUR).round() as i64;
        if Duration::try_milliseconds(millis).is_none() {
            return Err(InvalidWindow(hours));
        }
        Ok(WindowHours(hours))
    }

    pub fn hours(&self) -> f64 {
        self.0
    }

    /// Whole-millisecond duration; sub-millisecond fractions are rounded.
    pub fn as_duration(&self) -> Duration {
        Duration::try_milliseconds((self.0 * MILLIS_PER_HOUR).round() as i64)
            .unwrap_or(Duration::MAX)
    }

    /// `now` plus the window, pinned to the latest representable instant
    /// instead of overflowing.
    pub fn expires_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.as_duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl TryFrom<f64> for WindowHours {
    type Error = InvalidWindow;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        WindowHours::new(value)
    }
}

impl From<WindowHours> for f64 {
    fn from(w: WindowHours) -> Self {
        w.0
    }
}

impl fmt::Display for WindowHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}
