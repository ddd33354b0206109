use crate::time::{Seconds, Uptime};
use crate::types::{ByteSize, GcId};
use derive_more::{Display, From, Into};
use enum_iterator::Sequence;
use std::collections::BTreeMap;

pub use memory::*;
pub use thread::*;

pub mod memory;
pub mod thread;

/// Position of an event in the model's chronological event list
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, From, Into)]
#[display(fmt = "#{_0}")]
pub struct EventIndex(pub(crate) usize);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Sequence)]
pub enum Generation {
    #[display(fmt = "young")]
    Young,
    #[display(fmt = "old")]
    Old,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Sequence)]
pub enum EventKind {
    /// Top-level collection cycle, the parent of phases
    #[display(fmt = "cycle")]
    Cycle,
    /// Stop-the-world phase
    #[display(fmt = "pause")]
    Pause,
    #[display(fmt = "concurrent")]
    Concurrent,
    /// Allocation stalls and out-of-memory notices, never nested under a cycle
    #[display(fmt = "thread")]
    Thread,
}

/// Every event kind any supported collector can report.
///
/// The display form is the label exactly as it appears in the log.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Sequence)]
pub enum EventType {
    // Single-generation ZGC
    #[display(fmt = "Garbage Collection")]
    GarbageCollection,
    #[display(fmt = "Pause Mark Start")]
    PauseMarkStart,
    #[display(fmt = "Concurrent Mark")]
    ConcurrentMark,
    #[display(fmt = "Concurrent Mark Free")]
    ConcurrentMarkFree,
    #[display(fmt = "Pause Mark End")]
    PauseMarkEnd,
    #[display(fmt = "Concurrent Process Non-Strong References")]
    ConcurrentNonStrongRefs,
    #[display(fmt = "Concurrent Reset Relocation Set")]
    ConcurrentResetRelocSet,
    #[display(fmt = "Concurrent Select Relocation Set")]
    ConcurrentSelectRelocSet,
    #[display(fmt = "Pause Relocate Start")]
    PauseRelocateStart,
    #[display(fmt = "Concurrent Relocate")]
    ConcurrentRelocate,

    // Generational ZGC, young generation
    #[display(fmt = "Minor Collection")]
    MinorCollection,
    #[display(fmt = "Young Pause Mark Start")]
    YoungPauseMarkStart,
    #[display(fmt = "Young Concurrent Mark")]
    YoungConcurrentMark,
    #[display(fmt = "Young Concurrent Mark Free")]
    YoungConcurrentMarkFree,
    #[display(fmt = "Young Pause Mark End")]
    YoungPauseMarkEnd,
    #[display(fmt = "Young Concurrent Process Non-Strong References")]
    YoungConcurrentNonStrongRefs,
    #[display(fmt = "Young Concurrent Reset Relocation Set")]
    YoungConcurrentResetRelocSet,
    #[display(fmt = "Young Concurrent Select Relocation Set")]
    YoungConcurrentSelectRelocSet,
    #[display(fmt = "Young Pause Relocate Start")]
    YoungPauseRelocateStart,
    #[display(fmt = "Young Concurrent Relocate")]
    YoungConcurrentRelocate,

    // Generational ZGC, old generation
    #[display(fmt = "Major Collection")]
    MajorCollection,
    #[display(fmt = "Major Pause Mark Start")]
    MajorPauseMarkStart,
    #[display(fmt = "Major Concurrent Mark")]
    MajorConcurrentMark,
    #[display(fmt = "Major Concurrent Mark Free")]
    MajorConcurrentMarkFree,
    #[display(fmt = "Major Pause Mark End")]
    MajorPauseMarkEnd,
    #[display(fmt = "Major Concurrent Process Non-Strong References")]
    MajorConcurrentNonStrongRefs,
    #[display(fmt = "Major Concurrent Reset Relocation Set")]
    MajorConcurrentResetRelocSet,
    #[display(fmt = "Major Concurrent Select Relocation Set")]
    MajorConcurrentSelectRelocSet,
    #[display(fmt = "Major Pause Relocate Start")]
    MajorPauseRelocateStart,
    #[display(fmt = "Major Concurrent Relocate")]
    MajorConcurrentRelocate,

    // Shared by all ZGC flavours
    #[display(fmt = "Allocation Stall")]
    AllocationStall,
    #[display(fmt = "Out Of Memory")]
    OutOfMemory,
}

impl EventType {
    /// The label of this event type as printed by the collector
    pub fn label(&self) -> String {
        self.to_string()
    }

    pub fn generation(&self) -> Option<Generation> {
        use EventType::*;
        match self {
            MinorCollection
            | YoungPauseMarkStart
            | YoungConcurrentMark
            | YoungConcurrentMarkFree
            | YoungPauseMarkEnd
            | YoungConcurrentNonStrongRefs
            | YoungConcurrentResetRelocSet
            | YoungConcurrentSelectRelocSet
            | YoungPauseRelocateStart
            | YoungConcurrentRelocate => Some(Generation::Young),

            MajorCollection
            | MajorPauseMarkStart
            | MajorConcurrentMark
            | MajorConcurrentMarkFree
            | MajorPauseMarkEnd
            | MajorConcurrentNonStrongRefs
            | MajorConcurrentResetRelocSet
            | MajorConcurrentSelectRelocSet
            | MajorPauseRelocateStart
            | MajorConcurrentRelocate => Some(Generation::Old),

            _ => None,
        }
    }

    pub fn kind(&self) -> EventKind {
        use EventType::*;
        match self {
            GarbageCollection | MinorCollection | MajorCollection => EventKind::Cycle,

            PauseMarkStart
            | PauseMarkEnd
            | PauseRelocateStart
            | YoungPauseMarkStart
            | YoungPauseMarkEnd
            | YoungPauseRelocateStart
            | MajorPauseMarkStart
            | MajorPauseMarkEnd
            | MajorPauseRelocateStart => EventKind::Pause,

            AllocationStall | OutOfMemory => EventKind::Thread,

            _ => EventKind::Concurrent,
        }
    }

    /// The cycle type a phase is reported under, `None` for anything that is
    /// not a phase.
    pub fn parent(&self) -> Option<EventType> {
        match self.kind() {
            EventKind::Pause | EventKind::Concurrent => Some(match self.generation() {
                Some(Generation::Young) => EventType::MinorCollection,
                Some(Generation::Old) => EventType::MajorCollection,
                None => EventType::GarbageCollection,
            }),
            EventKind::Cycle | EventKind::Thread => None,
        }
    }

    pub fn is_cycle(&self) -> bool {
        self.kind() == EventKind::Cycle
    }

    pub fn is_phase(&self) -> bool {
        self.parent().is_some()
    }

    pub fn is_pause(&self) -> bool {
        self.kind() == EventKind::Pause
    }

    /// Pauses counted in headline stop-the-world accounting.
    /// ZGC cycles are concurrent, so every pause phase is a main pause.
    pub fn is_main_pause(&self) -> bool {
        self.is_pause()
    }

    /// Event types shown in summaries
    pub fn is_important(&self) -> bool {
        use EventType::*;
        match self {
            GarbageCollection | MinorCollection | MajorCollection => true,
            ConcurrentMark
            | ConcurrentNonStrongRefs
            | ConcurrentRelocate
            | YoungConcurrentMark
            | YoungConcurrentNonStrongRefs
            | YoungConcurrentRelocate
            | MajorConcurrentMark
            | MajorConcurrentNonStrongRefs
            | MajorConcurrentRelocate => true,
            _ => self.is_pause(),
        }
    }
}

/// A collection cycle or one of its phases
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display(fmt = "[{start_time}]:{event_type}")]
pub struct GcEvent {
    pub event_type: EventType,
    pub gc_id: Option<GcId>,
    /// Why the cycle was started, only set on cycles
    pub cause: Option<String>,
    start_time: Uptime,
    duration: Option<Seconds>,
    pub(crate) phases: Vec<EventIndex>,
    memory: BTreeMap<MemoryArea, MemoryItem>,
    pub reclamation: Option<ByteSize>,
    pub allocation: Option<ByteSize>,
}

impl GcEvent {
    pub fn new(event_type: EventType, start_time: Uptime) -> Self {
        Self {
            event_type,
            gc_id: None,
            cause: None,
            start_time,
            duration: None,
            phases: Vec::new(),
            memory: BTreeMap::new(),
            reclamation: None,
            allocation: None,
        }
    }

    pub fn start_time(&self) -> Uptime {
        self.start_time
    }

    /// `None` while the event is still open
    pub fn duration(&self) -> Option<Seconds> {
        self.duration
    }

    pub fn end_time(&self) -> Option<Uptime> {
        self.duration.map(|d| self.start_time + d)
    }

    pub fn is_closed(&self) -> bool {
        self.duration.is_some()
    }

    /// Sets the duration of an open event.
    /// Returns false, leaving the event untouched, if it was already closed.
    pub fn set_duration(&mut self, duration: Seconds) -> bool {
        if self.duration.is_some() {
            return false;
        }
        self.duration = Some(duration);
        true
    }

    /// Closes the event at the given uptime
    pub fn close(&mut self, end_time: Uptime) -> bool {
        self.set_duration(end_time - self.start_time)
    }

    /// Indices of the child phases, in the order they were reported
    pub fn phases(&self) -> &[EventIndex] {
        &self.phases
    }

    pub fn memory_item(&self, area: MemoryArea) -> Option<&MemoryItem> {
        self.memory.get(&area)
    }

    pub fn memory_item_mut(&mut self, area: MemoryArea) -> Option<&mut MemoryItem> {
        self.memory.get_mut(&area)
    }

    pub fn memory_items(&self) -> &BTreeMap<MemoryArea, MemoryItem> {
        &self.memory
    }

    /// Replaces the item for the item's area
    pub fn set_memory_item(&mut self, item: MemoryItem) {
        self.memory.insert(item.area, item);
    }
}
