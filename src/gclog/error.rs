use crate::gclog::Collector;
use crate::time::ParseDurationError;
use crate::types::ParseSizeError;
use std::num::ParseFloatError;
use thiserror::Error;

/// Errors that abort a parse.
///
/// A line the rule tables do not recognize, or one that refers to a cycle the
/// log never opened, is not an error. These variants mean a line matched a
/// rule but did not have the layout the rule was written for, or the rule and
/// event type tables disagree with each other.
#[derive(Debug, Error)]
pub enum Error {
    #[error("The {0} collector has no event type labeled '{1}'")]
    UnknownEventLabel(Collector, String),

    #[error("Event type labeled '{0}' is not a phase")]
    NotAPhase(String),

    #[error("Missing token {index} in '{line}'")]
    MissingToken { index: usize, line: String },

    #[error("Missing a bracketed thread name in '{0}'")]
    MissingThreadName(String),

    #[error("Invalid number '{0}'")]
    InvalidNumber(String, #[source] ParseFloatError),

    #[error(transparent)]
    InvalidSize(#[from] ParseSizeError),

    #[error(transparent)]
    InvalidDuration(#[from] ParseDurationError),
}
