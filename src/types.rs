//! Types common to every collector's log format

use derive_more::{Add, AddAssign, Deref, Display, From, Into};
use std::str::FromStr;
use thiserror::Error;

/// Cycle sequence number the collector reports as `GC(<id>)`
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Deref, From, Into,
)]
#[display(fmt = "GC({_0})")]
pub struct GcId(pub(crate) u32);

impl GcId {
    pub fn get_raw(&self) -> u32 {
        self.0
    }
}

/// A memory size in bytes
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
    Deref,
    From,
    Into,
    Add,
    AddAssign,
)]
#[display(fmt = "{_0}B")]
pub struct ByteSize(pub(crate) u64);

impl ByteSize {
    pub const KIB: u64 = 1024;
    pub const MIB: u64 = 1024 * Self::KIB;
    pub const GIB: u64 = 1024 * Self::MIB;
    pub const TIB: u64 = 1024 * Self::GIB;

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Invalid memory size '{0}', expected a number with a B, K, M, G or T suffix")]
pub struct ParseSizeError(pub String);

/// Parses sizes the way the collector prints them: `104M`, `0M`, `512K`.
/// A trailing percentage (`104M(10%)`) is not part of the size.
impl FromStr for ByteSize {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseSizeError(s.to_owned());

        let unit = s.chars().last().ok_or_else(err)?;
        let multiplier = match unit.to_ascii_uppercase() {
            'B' => 1,
            'K' => Self::KIB,
            'M' => Self::MIB,
            'G' => Self::GIB,
            'T' => Self::TIB,
            _ => return Err(err()),
        };
        let value = &s[..s.len() - unit.len_utf8()];

        if let Ok(v) = value.parse::<u64>() {
            return v.checked_mul(multiplier).map(ByteSize).ok_or_else(err);
        }
        let v: f64 = value.parse().map_err(|_| err())?;
        if !v.is_finite() || v < 0.0 {
            return Err(err());
        }
        Ok(ByteSize((v * multiplier as f64).round() as u64))
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Into, Display, Deref)]
#[display(fmt = "{_0}")]
#[deref(forward)]
pub struct ThreadName(pub(crate) String);

impl ThreadName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }
}

impl AsRef<str> for ThreadName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
