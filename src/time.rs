use derive_more::{Add, AddAssign, Display, Into, Sum};
use ordered_float::OrderedFloat;
use std::str::FromStr;
use std::ops;
use thiserror::Error;

/// Process uptime (in seconds), as reported by the log decorations.
///
/// Uptime is non-decreasing across a log, every "most recent event" lookup
/// in the model relies on that.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Display, Into)]
#[display(fmt = "{_0}s")]
pub struct Uptime(pub(crate) OrderedFloat<f64>);

impl Uptime {
    pub fn zero() -> Self {
        Self(OrderedFloat(0.0))
    }

    pub fn from_secs(secs: f64) -> Self {
        Self(OrderedFloat(secs))
    }

    pub fn as_secs(&self) -> f64 {
        self.0.into_inner()
    }
}

impl From<f64> for Uptime {
    fn from(secs: f64) -> Self {
        Self::from_secs(secs)
    }
}

/// Time elapsed between two uptimes
impl ops::Sub for Uptime {
    type Output = Seconds;

    fn sub(self, earlier: Uptime) -> Seconds {
        Seconds(self.0 - earlier.0)
    }
}

impl ops::Sub<Seconds> for Uptime {
    type Output = Uptime;

    fn sub(self, d: Seconds) -> Uptime {
        Uptime(self.0 - d.0)
    }
}

impl ops::Add<Seconds> for Uptime {
    type Output = Uptime;

    fn add(self, d: Seconds) -> Uptime {
        Uptime(self.0 + d.0)
    }
}

/// A duration in seconds.
/// Durations in the log carry a unit suffix (`1.234ms`) and are
/// normalized to seconds when parsed.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Default,
    Display,
    Into,
    Add,
    Sum,
    AddAssign,
)]
#[display(fmt = "{_0}s")]
pub struct Seconds(pub(crate) OrderedFloat<f64>);

impl Seconds {
    pub fn zero() -> Self {
        Self(OrderedFloat(0.0))
    }

    pub fn from_secs(secs: f64) -> Self {
        Self(OrderedFloat(secs))
    }

    pub fn from_millis(millis: f64) -> Self {
        Self(OrderedFloat(millis / 1_000.0))
    }

    pub fn as_secs(&self) -> f64 {
        self.0.into_inner()
    }

    pub fn as_millis(&self) -> f64 {
        self.0.into_inner() * 1_000.0
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Invalid duration '{0}', expected a number with a ns, us, ms or s suffix")]
pub struct ParseDurationError(pub String);

impl FromStr for Seconds {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseDurationError(s.to_owned());

        // Longer suffixes first, everything ends in 's'
        let (value, divisor) = if let Some(v) = s.strip_suffix("ns") {
            (v, 1_000_000_000.0)
        } else if let Some(v) = s.strip_suffix("us") {
            (v, 1_000_000.0)
        } else if let Some(v) = s.strip_suffix("ms") {
            (v, 1_000.0)
        } else if let Some(v) = s.strip_suffix('s') {
            (v, 1.0)
        } else {
            return Err(err());
        };

        let value: f64 = value.trim().parse().map_err(|_| err())?;
        if !value.is_finite() || value < 0.0 {
            return Err(err());
        }
        Ok(Seconds(OrderedFloat(value / divisor)))
    }
}
