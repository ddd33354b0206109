//! First-match-wins line dispatch.
//!
//! A rule either matches a fixed prefix of the line, or is a predicate that
//! inspects the whole line itself. Rules are tried in the order they were
//! added and the first one that matches handles the line.

use std::fmt;

/// Handles the remainder of a line that started with `prefix`
pub type PrefixHandler<T, C, E> = fn(&mut T, &C, &'static str, &str) -> Result<(), E>;

/// Decides whether it matches the whole line, handling it if so
pub type PredicateHandler<T, C, E> = fn(&mut T, &C, &str) -> Result<bool, E>;

pub enum Rule<T, C, E> {
    Prefix {
        prefix: &'static str,
        handler: PrefixHandler<T, C, E>,
    },
    Predicate(PredicateHandler<T, C, E>),
}

impl<T, C, E> Rule<T, C, E> {
    pub const fn prefix(prefix: &'static str, handler: PrefixHandler<T, C, E>) -> Self {
        Rule::Prefix { prefix, handler }
    }

    pub const fn predicate(handler: PredicateHandler<T, C, E>) -> Self {
        Rule::Predicate(handler)
    }

    /// Returns whether the rule matched. A handler error is returned as-is.
    pub fn apply(&self, target: &mut T, ctx: &C, line: &str) -> Result<bool, E> {
        match self {
            Rule::Prefix { prefix, handler } => match line.strip_prefix(*prefix) {
                Some(rest) => {
                    handler(target, ctx, *prefix, prefix_value(rest))?;
                    Ok(true)
                }
                None => Ok(false),
            },
            Rule::Predicate(handler) => handler(target, ctx, line),
        }
    }
}

/// The value following a prefix, without the `:` separator some lines use
fn prefix_value(rest: &str) -> &str {
    let rest = rest.trim_start();
    rest.strip_prefix(':').unwrap_or(rest).trim()
}

impl<T, C, E> fmt::Debug for Rule<T, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Prefix { prefix, .. } => f.debug_tuple("Prefix").field(prefix).finish(),
            Rule::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

/// An ordered list of rules
pub struct RuleSet<T, C, E> {
    rules: Vec<Rule<T, C, E>>,
}

impl<T, C, E> Default for RuleSet<T, C, E> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T, C, E> RuleSet<T, C, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: &'static str, handler: PrefixHandler<T, C, E>) -> Self {
        self.rules.push(Rule::prefix(prefix, handler));
        self
    }

    pub fn with_predicate(mut self, handler: PredicateHandler<T, C, E>) -> Self {
        self.rules.push(Rule::predicate(handler));
        self
    }

    pub fn push(&mut self, rule: Rule<T, C, E>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule<T, C, E>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs the first rule that matches the line.
    /// Returns false if none did, which is not an error.
    pub fn dispatch(&self, target: &mut T, ctx: &C, line: &str) -> Result<bool, E> {
        for rule in self.rules.iter() {
            if rule.apply(target, ctx, line)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<T, C, E> fmt::Debug for RuleSet<T, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Seen(Vec<String>);

    type TestRules = RuleSet<Seen, u8, String>;

    fn record(seen: &mut Seen, _: &u8, prefix: &'static str, value: &str) -> Result<(), String> {
        seen.0.push(format!("{prefix}={value}"));
        Ok(())
    }

    fn record_other(seen: &mut Seen, _: &u8, _: &'static str, value: &str) -> Result<(), String> {
        seen.0.push(format!("other={value}"));
        Ok(())
    }

    fn numbers(seen: &mut Seen, ctx: &u8, line: &str) -> Result<bool, String> {
        if line.chars().all(|c| c.is_ascii_digit()) {
            seen.0.push(format!("number({ctx})={line}"));
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn fail(_: &mut Seen, _: &u8, _: &'static str, value: &str) -> Result<(), String> {
        Err(value.to_owned())
    }

    #[test]
    fn first_match_wins() {
        let rules = TestRules::new()
            .with_prefix("Concurrent Mark Free", record)
            .with_prefix("Concurrent Mark", record)
            .with_prefix("Concurrent", record_other)
            .with_predicate(numbers);
        assert_eq!(rules.len(), 4);

        let mut seen = Seen::default();
        assert_eq!(rules.dispatch(&mut seen, &0, "Concurrent Mark Free 1ms"), Ok(true));
        assert_eq!(rules.dispatch(&mut seen, &0, "Concurrent Mark 2ms"), Ok(true));
        assert_eq!(rules.dispatch(&mut seen, &0, "Concurrent Relocate 3ms"), Ok(true));
        assert_eq!(rules.dispatch(&mut seen, &9, "1234"), Ok(true));
        assert_eq!(
            seen.0,
            vec![
                "Concurrent Mark Free=1ms",
                "Concurrent Mark=2ms",
                "other=Relocate 3ms",
                "number(9)=1234",
            ]
        );
    }

    #[test]
    fn unmatched_lines_are_not_errors() {
        let rules = TestRules::new().with_prefix("Metaspace", record);
        let mut seen = Seen::default();
        assert_eq!(rules.dispatch(&mut seen, &0, "Using The Z Garbage Collector"), Ok(false));
        assert_eq!(rules.dispatch(&mut seen, &0, ""), Ok(false));
        assert!(seen.0.is_empty());
        assert!(TestRules::new().dispatch(&mut seen, &0, "x").is_ok());
    }

    #[test]
    fn separator_is_stripped() {
        let rules = TestRules::new()
            .with_prefix(" Capacity", record)
            .with_prefix("Metaspace", record);
        let mut seen = Seen::default();
        rules
            .dispatch(&mut seen, &0, " Capacity:     2048M (100%)   2048M (100%) ")
            .unwrap();
        rules
            .dispatch(&mut seen, &0, "Metaspace: 7M used, 7M committed")
            .unwrap();
        assert_eq!(
            seen.0,
            vec![
                " Capacity=2048M (100%)   2048M (100%)",
                "Metaspace=7M used, 7M committed",
            ]
        );
    }

    #[test]
    fn handler_errors_stop_dispatch() {
        let rules = TestRules::new()
            .with_prefix("Broken", fail)
            .with_prefix("Broken", record);
        let mut seen = Seen::default();
        assert_eq!(
            rules.dispatch(&mut seen, &0, "Broken table"),
            Err("table".to_owned())
        );
        assert!(seen.0.is_empty());
    }
}
