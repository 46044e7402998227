use std::collections::BTreeMap;

use crate::overlay::OverlayMetric;
use crate::region::Region;

pub const MAX_COMPARE_REGIONS: usize = 3;

/// Every overlay metric's score for a region, captured at one moment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSnapshot {
    pub scores: BTreeMap<OverlayMetric, f64>,
}

impl MetricSnapshot {
    pub fn get(&self, metric: OverlayMetric) -> Option<f64> {
        self.scores.get(&metric).copied()
    }
}

impl FromIterator<(OverlayMetric, f64)> for MetricSnapshot {
    fn from_iter<I: IntoIterator<Item = (OverlayMetric, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompareEntry {
    pub region: Region,
    pub metric_snapshot: MetricSnapshot,
}

/// Up to three regions held side by side, unique by region id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompareSession {
    entries: Vec<CompareEntry>,
}

impl CompareSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_COMPARE_REGIONS
    }

    pub fn contains(&self, region_id: &str) -> bool {
        self.entries.iter().any(|e| e.region.id == region_id)
    }

    pub fn entries(&self) -> &[CompareEntry] {
        &self.entries
    }

    /// Returns `true` if the region was added. Duplicates and overflow are no-ops.
    pub fn add_region(&mut self, region: Region, metric_snapshot: MetricSnapshot) -> bool {
        if self.is_full() || self.contains(&region.id) {
            return false;
        }
        self.entries.push(CompareEntry {
            region,
            metric_snapshot,
        });
        true
    }

    pub fn remove_region(&mut self, region_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.region.id != region_id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{CompareSession, MAX_COMPARE_REGIONS, MetricSnapshot};
    use crate::overlay::OverlayMetric;
    use crate::region::Region;
    use foundation::StateCode;

    fn state(key: &str) -> Region {
        Region::state(StateCode::resolve(key).expect("state"))
    }

    #[test]
    fn never_exceeds_three_regions() {
        let mut s = CompareSession::new();
        for key in ["AZ", "CA", "NV", "UT", "TX"] {
            s.add_region(state(key), MetricSnapshot::default());
            assert!(s.len() <= MAX_COMPARE_REGIONS);
        }
        assert!(s.is_full());
        let ids: Vec<&str> = s.entries().iter().map(|e| e.region.id.as_str()).collect();
        assert_eq!(ids, vec!["04", "06", "32"]);
    }

    #[test]
    fn duplicate_ids_are_ignored() {
        let mut s = CompareSession::new();
        let first: MetricSnapshot = [(OverlayMetric::Volume, 40.0)].into_iter().collect();
        assert!(s.add_region(state("AZ"), first));
        assert!(!s.add_region(state("Arizona"), MetricSnapshot::default()));
        assert_eq!(s.len(), 1);
        assert_eq!(s.entries()[0].metric_snapshot.get(OverlayMetric::Volume), Some(40.0));
    }

    #[test]
    fn remove_and_clear() {
        let mut s = CompareSession::new();
        s.add_region(state("AZ"), MetricSnapshot::default());
        s.add_region(state("CA"), MetricSnapshot::default());
        assert!(!s.remove_region("48"));
        assert!(s.remove_region("04"));
        assert_eq!(s.len(), 1);
        s.clear();
        assert!(s.is_empty());
    }
}
