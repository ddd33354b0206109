use crate::gclog::event::{EventIndex, EventType, GcEvent, ThreadEvent};
use crate::gclog::statistics::StatisticsSample;
use crate::gclog::{Collector, EventTypeRegistry};
use crate::time::{Seconds, Uptime};
use std::collections::BTreeMap;
use std::ops;

/// Everything reconstructed from one log.
///
/// Events are stored once, in the order they were created. Cycles are also
/// indexed per cycle type and phases are referenced from their cycle by
/// [`EventIndex`]. Nothing is ever removed, cycles that never saw their end
/// line stay in the model without a duration.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct GcModel {
    collector: Collector,
    events: Vec<GcEvent>,
    cycles: BTreeMap<EventType, Vec<EventIndex>>,
    ooms: Vec<ThreadEvent>,
    allocation_stalls: Vec<ThreadEvent>,
    statistics: Vec<StatisticsSample>,
    start_time: Option<Uptime>,
    end_time: Option<Uptime>,
}

impl GcModel {
    pub fn new(collector: Collector) -> Self {
        Self {
            collector,
            events: Vec::new(),
            cycles: BTreeMap::new(),
            ooms: Vec::new(),
            allocation_stalls: Vec::new(),
            statistics: Vec::new(),
            start_time: None,
            end_time: None,
        }
    }

    pub fn collector(&self) -> Collector {
        self.collector
    }

    pub fn registry(&self) -> &'static EventTypeRegistry {
        self.collector.registry()
    }

    pub fn is_metaspace_capacity_reliable(&self) -> bool {
        self.collector.is_metaspace_capacity_reliable()
    }

    /// Appends an event. Cycles are also recorded under their cycle type.
    pub fn put_event(&mut self, event: GcEvent) -> EventIndex {
        let index = EventIndex(self.events.len());
        if event.event_type.is_cycle() {
            self.cycles.entry(event.event_type).or_default().push(index);
        }
        self.events.push(event);
        index
    }

    /// Appends a phase and links it under its parent cycle
    pub fn add_phase(&mut self, parent: EventIndex, phase: GcEvent) -> EventIndex {
        let index = EventIndex(self.events.len());
        self.events.push(phase);
        if let Some(p) = self.events.get_mut(parent.0) {
            p.phases.push(index);
        }
        index
    }

    /// The most recently added event of the given type, open or not
    pub fn last_event_index_of_type(&self, event_type: EventType) -> Option<EventIndex> {
        if event_type.is_cycle() {
            self.cycles
                .get(&event_type)
                .and_then(|indices| indices.last())
                .copied()
        } else {
            self.events
                .iter()
                .rposition(|e| e.event_type == event_type)
                .map(EventIndex)
        }
    }

    pub fn last_event_of_type(&self, event_type: EventType) -> Option<&GcEvent> {
        self.last_event_index_of_type(event_type)
            .and_then(|i| self.event(i))
    }

    pub fn last_event_of_type_mut(&mut self, event_type: EventType) -> Option<&mut GcEvent> {
        self.last_event_index_of_type(event_type)
            .and_then(|i| self.events.get_mut(i.0))
    }

    /// The cycle heap and metaspace lines belong to: the last cycle of the
    /// first cycle type (young before old) that has one
    pub fn last_cycle_index(&self) -> Option<EventIndex> {
        self.registry()
            .parents()
            .iter()
            .find_map(|t| self.last_event_index_of_type(*t))
    }

    pub fn add_oom(&mut self, event: ThreadEvent) {
        self.ooms.push(event);
    }

    pub fn add_allocation_stall(&mut self, event: ThreadEvent) {
        self.allocation_stalls.push(event);
    }

    /// Starts a new statistics sample
    pub fn open_statistics(&mut self, start_time: Uptime) -> &mut StatisticsSample {
        self.statistics.push(StatisticsSample::new(start_time));
        let last = self.statistics.len() - 1;
        &mut self.statistics[last]
    }

    pub fn last_statistics_mut(&mut self) -> Option<&mut StatisticsSample> {
        self.statistics.last_mut()
    }

    pub(crate) fn record_uptime(&mut self, uptime: Uptime) {
        self.start_time.get_or_insert(uptime);
        self.end_time = Some(uptime);
    }

    pub fn event(&self, index: EventIndex) -> Option<&GcEvent> {
        self.events.get(index.0)
    }

    /// All events, cycles and phases, in creation order
    pub fn events(&self) -> &[GcEvent] {
        &self.events
    }

    pub fn phases(&self, cycle: EventIndex) -> impl Iterator<Item = &GcEvent> + '_ {
        self.event(cycle)
            .into_iter()
            .flat_map(|c| c.phases().iter())
            .filter_map(|i| self.event(*i))
    }

    pub fn cycles(&self, cycle_type: EventType) -> impl Iterator<Item = &GcEvent> + '_ {
        self.cycles
            .get(&cycle_type)
            .into_iter()
            .flatten()
            .filter_map(|i| self.event(*i))
    }

    pub fn cycle_indices(&self, cycle_type: EventType) -> &[EventIndex] {
        self.cycles
            .get(&cycle_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn minor_collections(&self) -> impl Iterator<Item = &GcEvent> + '_ {
        self.cycles(EventType::MinorCollection)
    }

    pub fn major_collections(&self) -> impl Iterator<Item = &GcEvent> + '_ {
        self.cycles(EventType::MajorCollection)
    }

    pub fn garbage_collections(&self) -> impl Iterator<Item = &GcEvent> + '_ {
        self.cycles(EventType::GarbageCollection)
    }

    pub fn events_of_type(&self, event_type: EventType) -> impl Iterator<Item = &GcEvent> + '_ {
        self.events.iter().filter(move |e| e.event_type == event_type)
    }

    pub fn pause_events(&self) -> impl Iterator<Item = &GcEvent> + '_ {
        let pauses = self.registry().pauses();
        self.events
            .iter()
            .filter(move |e| pauses.contains(&e.event_type))
    }

    pub fn important_events(&self) -> impl Iterator<Item = &GcEvent> + '_ {
        let important = self.registry().important();
        self.events
            .iter()
            .filter(move |e| important.contains(&e.event_type))
    }

    /// Total stop-the-world time over all closed main pauses
    pub fn total_pause_duration(&self) -> Seconds {
        let main_pauses = self.registry().main_pauses();
        self.events
            .iter()
            .filter(|e| main_pauses.contains(&e.event_type))
            .filter_map(GcEvent::duration)
            .sum()
    }

    pub fn ooms(&self) -> &[ThreadEvent] {
        &self.ooms
    }

    pub fn allocation_stalls(&self) -> &[ThreadEvent] {
        &self.allocation_stalls
    }

    pub fn statistics(&self) -> &[StatisticsSample] {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut [StatisticsSample] {
        &mut self.statistics
    }

    /// Uptime of the first line the parser accepted
    pub fn start_time(&self) -> Option<Uptime> {
        self.start_time
    }

    /// Uptime of the last line the parser accepted
    pub fn end_time(&self) -> Option<Uptime> {
        self.end_time
    }
}

impl ops::Index<EventIndex> for GcModel {
    type Output = GcEvent;

    fn index(&self, index: EventIndex) -> &GcEvent {
        &self.events[index.0]
    }
}

impl ops::IndexMut<EventIndex> for GcModel {
    fn index_mut(&mut self, index: EventIndex) -> &mut GcEvent {
        &mut self.events[index.0]
    }
}
