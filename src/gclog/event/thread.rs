use crate::gclog::event::EventType;
use crate::time::{Seconds, Uptime};
use crate::types::ThreadName;
use derive_more::Display;

/// An allocation stall or out-of-memory notice reported for an application thread.
/// These are independent of the cycle timeline.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display(fmt = "[{start_time}]:{event_type}:'{thread_name}'")]
pub struct ThreadEvent {
    pub event_type: EventType,
    pub thread_name: ThreadName,
    pub start_time: Uptime,
    /// Only stalls have a duration
    pub duration: Option<Seconds>,
}

impl ThreadEvent {
    pub fn allocation_stall(thread_name: ThreadName, end_time: Uptime, duration: Seconds) -> Self {
        Self {
            event_type: EventType::AllocationStall,
            thread_name,
            start_time: end_time - duration,
            duration: duration.into(),
        }
    }

    pub fn out_of_memory(thread_name: ThreadName, time: Uptime) -> Self {
        Self {
            event_type: EventType::OutOfMemory,
            thread_name,
            start_time: time,
            duration: None,
        }
    }
}

pub type AllocationStallEvent = ThreadEvent;
pub type OutOfMemoryEvent = ThreadEvent;
