//! A library for reconstructing garbage collection activity from the unified
//! logs of the Z Garbage Collector, both the single-generation and the
//! generational flavour.
//!
//! ```no_run
//! use zgc_log_parser::gclog::{Collector, GcLogParser};
//! use zgc_log_parser::time::Uptime;
//! use zgc_log_parser::types::GcId;
//!
//! let mut parser = GcLogParser::new(Collector::GenZgc);
//! let gc_id = Some(GcId::from(3));
//! parser.parse_line(Uptime::from_secs(0.5), gc_id, "Minor Collection (Allocation Rate)")?;
//! let model = parser.finish();
//! assert_eq!(model.minor_collections().count(), 1);
//! # Ok::<(), zgc_log_parser::gclog::Error>(())
//! ```

pub mod gclog;
pub mod time;
pub mod types;
