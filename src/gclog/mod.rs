//! Reconstruction of collector cycles from ZGC unified logging output.
//!
//! Lines are fed one at a time to a [`GcLogParser`], which matches them
//! against the rule table of the configured [`Collector`] and accumulates
//! cycles, phases, heap and metaspace usage, thread anomalies and periodic
//! statistics into a [`GcModel`].

pub use collector::{Collector, EventTypeRegistry, ParseCollectorError};
pub use error::Error;
pub use model::GcModel;
pub use parser::{CollectorRules, GcLogParser, GcRuleSet, LineContext};
pub use statistics::{StatisticsItem, StatisticsSample, SAMPLE_HEADER_METRIC};

pub mod collector;
pub mod error;
pub mod event;
pub mod model;
pub mod parser;
pub mod rule;
pub mod statistics;
