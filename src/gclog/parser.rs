use crate::gclog::event::{GcEvent, MemoryArea, MemoryItem, ThreadEvent};
use crate::gclog::rule::RuleSet;
use crate::gclog::statistics::{StatisticsItem, SAMPLE_HEADER_METRIC};
use crate::gclog::{Collector, Error, GcModel};
use crate::time::{Seconds, Uptime};
use crate::types::{ByteSize, GcId, ThreadName};
use std::sync::OnceLock;
use tracing::{debug, trace, warn};

/// What the outer line reader extracted from a line besides its detail text
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct LineContext {
    pub uptime: Uptime,
    pub gc_id: Option<GcId>,
}

pub type GcRuleSet = RuleSet<GcModel, LineContext, Error>;

/// The ordered rule lists of one collector
#[derive(Debug)]
pub struct CollectorRules {
    /// Lines carrying a `GC(<id>)` cycle id
    pub with_gc_id: GcRuleSet,
    /// Lines carrying only an uptime
    pub without_gc_id: GcRuleSet,
}

impl CollectorRules {
    /// The rule lists of a collector, built once per process
    pub fn get(collector: Collector) -> &'static CollectorRules {
        static ZGC: OnceLock<CollectorRules> = OnceLock::new();
        static GENZ: OnceLock<CollectorRules> = OnceLock::new();
        match collector {
            Collector::Zgc => ZGC.get_or_init(zgc_rules),
            Collector::GenZgc => GENZ.get_or_init(genzgc_rules),
        }
    }
}

/// Rules shared by every ZGC flavour for lines without a cycle id
fn shared_without_gc_id_rules() -> GcRuleSet {
    GcRuleSet::new()
        .with_prefix("Allocation Stall", parse_allocation_stall)
        .with_prefix("Out Of Memory", parse_out_of_memory)
        .with_predicate(parse_statistics_line)
}

/// Heap and metaspace rules, always registered after the cycle and phase rules
fn with_memory_rules(rules: GcRuleSet) -> GcRuleSet {
    rules
        .with_prefix("Metaspace", parse_metaspace)
        .with_prefix(" Capacity", parse_heap)
        .with_prefix("     Used", parse_heap)
        .with_prefix("Allocated", parse_heap)
        .with_prefix("Reclaimed", parse_heap)
}

// Where one phase label is a prefix of another, the longer one comes first
fn genzgc_rules() -> CollectorRules {
    let with_gc_id = GcRuleSet::new()
        .with_prefix("Young Pause Mark Start", parse_phase)
        .with_prefix("Young Concurrent Mark Free", parse_phase)
        .with_prefix("Young Concurrent Mark", parse_phase)
        .with_prefix("Young Pause Mark End", parse_phase)
        .with_prefix("Young Concurrent Process Non-Strong References", parse_phase)
        .with_prefix("Young Concurrent Reset Relocation Set", parse_phase)
        .with_prefix("Young Concurrent Select Relocation Set", parse_phase)
        .with_prefix("Young Pause Relocate Start", parse_phase)
        .with_prefix("Young Concurrent Relocate", parse_phase)
        .with_prefix("Major Pause Mark Start", parse_phase)
        .with_prefix("Major Concurrent Mark Free", parse_phase)
        .with_prefix("Major Concurrent Mark", parse_phase)
        .with_prefix("Major Pause Mark End", parse_phase)
        .with_prefix("Major Concurrent Process Non-Strong References", parse_phase)
        .with_prefix("Major Concurrent Reset Relocation Set", parse_phase)
        .with_prefix("Major Concurrent Select Relocation Set", parse_phase)
        .with_prefix("Major Pause Relocate Start", parse_phase)
        .with_prefix("Major Concurrent Relocate", parse_phase);
    let with_gc_id = with_memory_rules(with_gc_id)
        .with_prefix("Minor Collection", parse_collection)
        .with_prefix("Major Collection", parse_collection);

    CollectorRules {
        with_gc_id,
        without_gc_id: shared_without_gc_id_rules(),
    }
}

fn zgc_rules() -> CollectorRules {
    let with_gc_id = GcRuleSet::new()
        .with_prefix("Pause Mark Start", parse_phase)
        .with_prefix("Concurrent Mark Free", parse_phase)
        .with_prefix("Concurrent Mark", parse_phase)
        .with_prefix("Pause Mark End", parse_phase)
        .with_prefix("Concurrent Process Non-Strong References", parse_phase)
        .with_prefix("Concurrent Reset Relocation Set", parse_phase)
        .with_prefix("Concurrent Select Relocation Set", parse_phase)
        .with_prefix("Pause Relocate Start", parse_phase)
        .with_prefix("Concurrent Relocate", parse_phase);
    let with_gc_id = with_memory_rules(with_gc_id)
        .with_prefix("Garbage Collection", parse_collection);

    CollectorRules {
        with_gc_id,
        without_gc_id: shared_without_gc_id_rules(),
    }
}

/// Reconstructs a [`GcModel`] from the lines of one log, fed in file order
#[derive(Debug)]
pub struct GcLogParser {
    model: GcModel,
    rules: &'static CollectorRules,
}

impl GcLogParser {
    pub fn new(collector: Collector) -> Self {
        Self {
            model: GcModel::new(collector),
            rules: CollectorRules::get(collector),
        }
    }

    pub fn collector(&self) -> Collector {
        self.model.collector()
    }

    /// Feeds one line. `detail` is the line without its decorations and
    /// without the `GC(<id>)` tag, `gc_id` is that tag's id if present.
    ///
    /// Lines no rule recognizes are ignored. An error means a recognized
    /// line did not have the layout its rule expects; the model is left as it
    /// was before the line.
    pub fn parse_line(
        &mut self,
        uptime: Uptime,
        gc_id: Option<GcId>,
        detail: &str,
    ) -> Result<(), Error> {
        let ctx = LineContext { uptime, gc_id };
        let rules = match gc_id {
            Some(_) => &self.rules.with_gc_id,
            None => &self.rules.without_gc_id,
        };
        if !rules.dispatch(&mut self.model, &ctx, detail)? {
            trace!(%uptime, detail, "Unrecognized line");
        }
        self.model.record_uptime(uptime);
        Ok(())
    }

    pub fn model(&self) -> &GcModel {
        &self.model
    }

    pub fn finish(self) -> GcModel {
        self.model
    }
}

/// `Minor Collection (Warmup)` opens a cycle,
/// `Minor Collection (Warmup) 104M(10%)->88M(9%)` closes it
fn parse_collection(
    model: &mut GcModel,
    ctx: &LineContext,
    prefix: &'static str,
    value: &str,
) -> Result<(), Error> {
    let cycle_type = model.registry().event_type(prefix)?;
    match value.find(')') {
        Some(idx) if idx == value.len() - 1 => {
            let cause = &value[..idx];
            let cause = cause.strip_prefix('(').unwrap_or(cause);
            let mut event = GcEvent::new(cycle_type, ctx.uptime);
            event.gc_id = ctx.gc_id;
            event.cause = Some(cause.to_owned());
            let index = model.put_event(event);
            debug!(%cycle_type, %index, uptime = %ctx.uptime, cause, "Cycle started");
        }
        _ if value.ends_with("%)") => match model.last_event_of_type_mut(cycle_type) {
            Some(event) => {
                if event.close(ctx.uptime) {
                    debug!(%cycle_type, uptime = %ctx.uptime, "Cycle ended");
                } else {
                    warn!(%cycle_type, uptime = %ctx.uptime, "Cycle end without an open cycle");
                }
            }
            None => debug!(%cycle_type, "Cycle end before any cycle start, log may be incomplete"),
        },
        _ => (),
    }
    Ok(())
}

/// `Young Pause Mark Start 1.234ms`, reported when the phase ends
fn parse_phase(
    model: &mut GcModel,
    ctx: &LineContext,
    label: &'static str,
    value: &str,
) -> Result<(), Error> {
    let phase_type = model.registry().phase_type(label)?;
    let parent_type = phase_type
        .parent()
        .ok_or_else(|| Error::NotAPhase(label.to_owned()))?;
    let Some(parent) = model.last_event_index_of_type(parent_type) else {
        debug!(%phase_type, "Phase without a cycle, log may be incomplete");
        return Ok(());
    };

    let duration: Seconds = value.parse()?;
    let mut phase = GcEvent::new(phase_type, ctx.uptime - duration);
    phase.set_duration(duration);
    phase.gc_id = model[parent].gc_id;
    model.add_phase(parent, phase);
    Ok(())
}

/// `Metaspace: 7M used, 7M committed, 1088M reserved` or
/// `Metaspace: 7M used, 7M capacity, 7M committed, 8M reserved`
fn parse_metaspace(
    model: &mut GcModel,
    _ctx: &LineContext,
    _prefix: &'static str,
    value: &str,
) -> Result<(), Error> {
    let Some(cycle) = model.last_cycle_index() else {
        debug!("Metaspace without a cycle, log may be incomplete");
        return Ok(());
    };
    let tokens = Tokens::new(value);
    let capacity_index = if tokens.len() == 6 { 2 } else { 4 };
    let used = tokens.size(0)?;
    let capacity = tokens.size(capacity_index)?;
    model[cycle].set_memory_item(MemoryItem::post(MemoryArea::Metaspace, used, capacity));
    Ok(())
}

/// Heap table rows. Columns are Mark Start, Mark End, Relocate Start,
/// Relocate End, High and Low, each a size and a percentage:
/// ` Capacity:     2048M (100%)       2048M (100%)  ...`
fn parse_heap(
    model: &mut GcModel,
    _ctx: &LineContext,
    prefix: &'static str,
    value: &str,
) -> Result<(), Error> {
    let Some(cycle) = model.last_cycle_index() else {
        debug!(row = prefix.trim(), "Heap row without a cycle, log may be incomplete");
        return Ok(());
    };
    let tokens = Tokens::new(value);
    let event = &mut model[cycle];
    match prefix.trim() {
        "Capacity" => {
            let mut item = MemoryItem::new(MemoryArea::Heap);
            item.pre_capacity = tokens.size(0)?.into();
            item.post_capacity = tokens.size(6)?.into();
            event.set_memory_item(item);
        }
        "Used" => {
            let pre_used = tokens.size(0)?;
            let post_used = tokens.size(6)?;
            match event.memory_item_mut(MemoryArea::Heap) {
                Some(item) => {
                    item.pre_used = pre_used.into();
                    item.post_used = post_used.into();
                }
                None => debug!("Heap used row without a capacity row, log may be incomplete"),
            }
        }
        "Reclaimed" => event.reclamation = tokens.size(4)?.into(),
        "Allocated" => event.allocation = tokens.size(5)?.into(),
        _ => (),
    }
    Ok(())
}

/// `Allocation Stall (main) 2.500ms`, reported when the stall ends
fn parse_allocation_stall(
    model: &mut GcModel,
    ctx: &LineContext,
    _prefix: &'static str,
    value: &str,
) -> Result<(), Error> {
    let (thread_name, rest) = bracketed(value)?;
    let duration: Seconds = rest.parse()?;
    model.add_allocation_stall(ThreadEvent::allocation_stall(
        thread_name,
        ctx.uptime,
        duration,
    ));
    Ok(())
}

/// `Out Of Memory (GC Thread#3)`
fn parse_out_of_memory(
    model: &mut GcModel,
    ctx: &LineContext,
    _prefix: &'static str,
    value: &str,
) -> Result<(), Error> {
    let (thread_name, _) = bracketed(value)?;
    model.add_oom(ThreadEvent::out_of_memory(thread_name, ctx.uptime));
    Ok(())
}

/// Periodic statistics rows, recognized by their layout:
/// `Collector: Garbage Collection Cycle   12.345 / 12.345   12.345 / 12.345   12.345 / 12.345   12.345 / 12.345   ms`
/// i.e. a metric name, four `avg / max` pairs (last 10s, 10m, 10h, total)
/// and a unit.
fn parse_statistics_line(
    model: &mut GcModel,
    ctx: &LineContext,
    line: &str,
) -> Result<bool, Error> {
    let tokens = Tokens::new(line);
    let len = tokens.len();
    let is_statistics = len >= 15
        && [3usize, 6, 9, 12]
            .into_iter()
            .all(|from_end| tokens.get(len - from_end) == Some("/"));
    if !is_statistics {
        return Ok(false);
    }

    let mut fields = [0.0; StatisticsItem::NUM_FIELDS];
    for (field, from_end) in fields.iter_mut().zip([13, 11, 10, 8, 7, 5, 4, 2]) {
        *field = tokens.number(len - from_end)?;
    }

    // The name is the text before the first value. The unit is part of the
    // name, some metrics are reported in several units.
    let before_values = line[..line.find('/').unwrap_or(line.len())].trim_end();
    let first_value = tokens.0[len - 13];
    let name = before_values
        .strip_suffix(first_value)
        .unwrap_or(before_values)
        .trim();
    let metric = format!("{name} {}", tokens.0[len - 1]);
    if metric == SAMPLE_HEADER_METRIC {
        model.open_statistics(ctx.uptime);
    }

    match model.last_statistics_mut() {
        Some(sample) => sample.insert(metric, StatisticsItem::from_fields(fields)),
        None => debug!(%metric, "Statistics before the first sample header, log may be incomplete"),
    }
    Ok(true)
}

/// Whitespace separated tokens of a line, read by fixed position
struct Tokens<'a>(Vec<&'a str>);

impl<'a> Tokens<'a> {
    fn new(s: &'a str) -> Self {
        Self(s.split_whitespace().collect())
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn get(&self, index: usize) -> Option<&'a str> {
        self.0.get(index).copied()
    }

    fn token(&self, index: usize) -> Result<&'a str, Error> {
        self.get(index).ok_or_else(|| Error::MissingToken {
            index,
            line: self.0.join(" "),
        })
    }

    fn size(&self, index: usize) -> Result<ByteSize, Error> {
        Ok(self.token(index)?.parse()?)
    }

    fn number(&self, index: usize) -> Result<f64, Error> {
        let token = self.token(index)?;
        token
            .parse()
            .map_err(|e| Error::InvalidNumber(token.to_owned(), e))
    }
}

/// Splits `(thread name) rest` into the name and the trimmed rest
fn bracketed(value: &str) -> Result<(ThreadName, &str), Error> {
    let missing = || Error::MissingThreadName(value.to_owned());
    let inner = value.trim_start().strip_prefix('(').ok_or_else(missing)?;
    let end = inner.rfind(')').ok_or_else(missing)?;
    Ok((ThreadName::new(&inner[..end]), inner[end + 1..].trim()))
}
