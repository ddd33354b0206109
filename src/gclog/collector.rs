use crate::gclog::event::EventType;
use crate::gclog::Error;
use derive_more::Display;
use enum_iterator::Sequence;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

/// The collector flavour a log was produced by
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Sequence)]
pub enum Collector {
    /// Single-generation ZGC
    #[display(fmt = "ZGC")]
    Zgc,
    /// Generational ZGC (JEP 474), young and old generation cycles
    #[display(fmt = "Generational ZGC")]
    GenZgc,
}

impl Collector {
    /// The event types of this collector, computed once per process
    pub fn registry(self) -> &'static EventTypeRegistry {
        static ZGC: OnceLock<EventTypeRegistry> = OnceLock::new();
        static GENZ: OnceLock<EventTypeRegistry> = OnceLock::new();
        let cell = match self {
            Collector::Zgc => &ZGC,
            Collector::GenZgc => &GENZ,
        };
        cell.get_or_init(|| EventTypeRegistry::new(self))
    }

    /// Whether this collector reports the given event type
    pub fn declares(self, event_type: EventType) -> bool {
        match event_type {
            EventType::AllocationStall | EventType::OutOfMemory => true,
            _ => match self {
                Collector::Zgc => event_type.generation().is_none(),
                Collector::GenZgc => event_type.generation().is_some(),
            },
        }
    }

    pub fn is_metaspace_capacity_reliable(self) -> bool {
        match self {
            Collector::Zgc | Collector::GenZgc => true,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, thiserror::Error)]
#[error("Invalid collector, expected 'zgc' or 'genzgc'")]
pub struct ParseCollectorError;

impl FromStr for Collector {
    type Err = ParseCollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().trim() {
            "zgc" => Collector::Zgc,
            "genzgc" | "generational-zgc" | "zgc-generational" => Collector::GenZgc,
            _ => return Err(ParseCollectorError),
        })
    }
}

/// Subsets of the shared event type table that one collector supports.
/// Order follows the declaration order of `EventType`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct EventTypeRegistry {
    collector: Collector,
    all: Vec<EventType>,
    pauses: Vec<EventType>,
    main_pauses: Vec<EventType>,
    important: Vec<EventType>,
    parents: Vec<EventType>,
    labels: BTreeMap<String, EventType>,
}

impl EventTypeRegistry {
    fn new(collector: Collector) -> Self {
        let all: Vec<EventType> = enum_iterator::all::<EventType>()
            .filter(|t| collector.declares(*t))
            .collect();
        let subset = |f: fn(&EventType) -> bool| all.iter().copied().filter(f).collect();
        Self {
            collector,
            pauses: subset(EventType::is_pause),
            main_pauses: subset(EventType::is_main_pause),
            important: subset(EventType::is_important),
            parents: subset(EventType::is_cycle),
            labels: all.iter().map(|t| (t.label(), *t)).collect(),
            all,
        }
    }

    pub fn collector(&self) -> Collector {
        self.collector
    }

    pub fn all(&self) -> &[EventType] {
        &self.all
    }

    pub fn pauses(&self) -> &[EventType] {
        &self.pauses
    }

    pub fn main_pauses(&self) -> &[EventType] {
        &self.main_pauses
    }

    pub fn important(&self) -> &[EventType] {
        &self.important
    }

    /// Top-level cycle types, young generation first
    pub fn parents(&self) -> &[EventType] {
        &self.parents
    }

    pub fn contains(&self, event_type: EventType) -> bool {
        self.all.contains(&event_type)
    }

    /// Looks up an event type by its log label (e.g. "Young Pause Mark Start").
    ///
    /// Every label in the rule tables has a mapping, so a miss here is a
    /// defect in the tables rather than a property of the log.
    pub fn event_type(&self, label: &str) -> Result<EventType, Error> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::UnknownEventLabel(self.collector, label.to_owned()))
    }

    /// Same as [`Self::event_type`], restricted to phases
    pub fn phase_type(&self, label: &str) -> Result<EventType, Error> {
        let event_type = self.event_type(label)?;
        if event_type.is_phase() {
            Ok(event_type)
        } else {
            Err(Error::NotAPhase(label.to_owned()))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gclog::event::Generation;

    #[test]
    fn genzgc_registry() {
        let reg = Collector::GenZgc.registry();
        assert_eq!(reg.collector(), Collector::GenZgc);
        assert_eq!(reg.all().len(), 2 + 9 + 9 + 2);
        assert_eq!(
            reg.parents(),
            &[EventType::MinorCollection, EventType::MajorCollection]
        );
        assert_eq!(reg.pauses().len(), 6);
        assert_eq!(reg.main_pauses(), reg.pauses());
        assert_eq!(reg.important().len(), 14);
        assert!(reg.contains(EventType::AllocationStall));
        assert!(!reg.contains(EventType::GarbageCollection));
        assert!(reg
            .all()
            .iter()
            .filter(|t| t.is_phase())
            .all(|t| t.generation().is_some()));
    }

    #[test]
    fn zgc_registry() {
        let reg = Collector::Zgc.registry();
        assert_eq!(reg.all().len(), 1 + 9 + 2);
        assert_eq!(reg.parents(), &[EventType::GarbageCollection]);
        assert_eq!(
            reg.pauses(),
            &[
                EventType::PauseMarkStart,
                EventType::PauseMarkEnd,
                EventType::PauseRelocateStart
            ]
        );
        assert_eq!(reg.important().len(), 7);
        assert!(!reg.contains(EventType::MinorCollection));
    }

    #[test]
    fn registry_is_cached() {
        let a = Collector::GenZgc.registry() as *const EventTypeRegistry;
        let b = Collector::GenZgc.registry() as *const EventTypeRegistry;
        assert_eq!(a, b);
    }

    #[test]
    fn label_lookup() {
        let reg = Collector::GenZgc.registry();
        assert_eq!(
            reg.phase_type("Young Pause Mark Start").unwrap(),
            EventType::YoungPauseMarkStart
        );
        assert_eq!(
            reg.phase_type("Major Concurrent Process Non-Strong References")
                .unwrap()
                .generation(),
            Some(Generation::Old)
        );
        assert_eq!(
            reg.event_type("Minor Collection").unwrap(),
            EventType::MinorCollection
        );
        assert!(matches!(
            reg.phase_type("Pause Mark Start"),
            Err(Error::UnknownEventLabel(Collector::GenZgc, _))
        ));
        assert!(matches!(
            reg.phase_type("Major Collection"),
            Err(Error::NotAPhase(_))
        ));
    }

    #[test]
    fn collector_from_str() {
        assert_eq!("zgc".parse::<Collector>(), Ok(Collector::Zgc));
        assert_eq!(" GenZGC".parse::<Collector>(), Ok(Collector::GenZgc));
        assert_eq!("g1".parse::<Collector>(), Err(ParseCollectorError));
    }
}
