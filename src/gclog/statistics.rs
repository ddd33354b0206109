use crate::time::Uptime;
use derive_more::Display;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Metric that opens a new statistics sample. The collector prints it first
/// in every periodic report.
pub const SAMPLE_HEADER_METRIC: &str = "Collector: Garbage Collection Cycle ms";

/// One periodic statistics report
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display(fmt = "[{start_time}]:{} metrics", "self.items.len()")]
pub struct StatisticsSample {
    pub start_time: Uptime,
    /// Keyed by metric name with its unit appended, e.g.
    /// "Memory: Allocation Rate MB/s"
    items: BTreeMap<String, StatisticsItem>,
}

impl StatisticsSample {
    pub fn new(start_time: Uptime) -> Self {
        Self {
            start_time,
            items: BTreeMap::new(),
        }
    }

    pub fn get(&self, metric: &str) -> Option<&StatisticsItem> {
        self.items.get(metric)
    }

    pub fn items(&self) -> &BTreeMap<String, StatisticsItem> {
        &self.items
    }

    /// Stores an item, replacing any earlier item with the same metric name
    pub fn insert<S: Into<String>>(&mut self, metric: S, item: StatisticsItem) {
        self.items.insert(metric.into(), item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Average and maximum of a metric over the four reporting windows
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct StatisticsItem {
    pub avg_10s: OrderedFloat<f64>,
    pub max_10s: OrderedFloat<f64>,
    pub avg_10m: OrderedFloat<f64>,
    pub max_10m: OrderedFloat<f64>,
    pub avg_10h: OrderedFloat<f64>,
    pub max_10h: OrderedFloat<f64>,
    pub avg_total: OrderedFloat<f64>,
    pub max_total: OrderedFloat<f64>,
}

impl StatisticsItem {
    pub const NUM_FIELDS: usize = 8;

    /// Fields in report column order
    pub fn from_fields(f: [f64; Self::NUM_FIELDS]) -> Self {
        Self {
            avg_10s: f[0].into(),
            max_10s: f[1].into(),
            avg_10m: f[2].into(),
            max_10m: f[3].into(),
            avg_10h: f[4].into(),
            max_10h: f[5].into(),
            avg_total: f[6].into(),
            max_total: f[7].into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn later_items_replace_earlier() {
        let mut sample = StatisticsSample::new(Uptime::from_secs(1.0));
        assert!(sample.is_empty());

        sample.insert(
            "Memory: Allocation Rate MB/s",
            StatisticsItem::from_fields([1.0; 8]),
        );
        sample.insert(
            "Memory: Allocation Rate MB/s",
            StatisticsItem::from_fields([2.0; 8]),
        );
        assert_eq!(sample.len(), 1);
        assert_eq!(
            sample.get("Memory: Allocation Rate MB/s").unwrap().max_total,
            OrderedFloat(2.0)
        );
        assert_eq!(sample.to_string(), "[1s]:1 metrics");
    }
}
