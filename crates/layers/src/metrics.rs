use std::collections::{BTreeMap, BTreeSet};

use scene::{MetricSnapshot, OverlayMetric};
use serde::{Deserialize, Serialize};

/// Derives an overlay metric from a region's base score, clamped to `[0, 100]`.
pub fn get_score_for_metric(base: f64, metric: OverlayMetric) -> f64 {
    let v = match metric {
        OverlayMetric::Volume => base,
        OverlayMetric::Sentiment => base + 5.0,
        OverlayMetric::Momentum => base - 10.0,
        OverlayMetric::Legislative => base + 15.0,
    };
    v.clamp(0.0, 100.0)
}

/// Upstream score feed.
pub trait ScoreProvider {
    /// Base score of a region, if the feed has one.
    fn base_score(&self, region_id: &str) -> Option<f64>;

    fn score(&self, region_id: &str, metric: OverlayMetric) -> Option<f64> {
        self.base_score(region_id)
            .map(|base| get_score_for_metric(base, metric))
    }

    fn snapshot(&self, region_id: &str) -> MetricSnapshot {
        OverlayMetric::ALL
            .into_iter()
            .filter_map(|m| self.score(region_id, m).map(|s| (m, s)))
            .collect()
    }
}

impl ScoreProvider for BTreeMap<String, f64> {
    fn base_score(&self, region_id: &str) -> Option<f64> {
        self.get(region_id).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub region_id: String,
    pub metric: OverlayMetric,
    pub value: f64,
    #[serde(default)]
    pub snapshot_index: u32,
}

/// Score feed built from `ScoreRecord`s.
///
/// The base score of a region is its volume record in the active snapshot;
/// without an explicit choice the latest snapshot is active.
#[derive(Debug, Clone, Default)]
pub struct ScoreTable {
    values: BTreeMap<(u32, String, OverlayMetric), f64>,
    snapshots: BTreeSet<u32>,
    active: Option<u32>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table; non-finite values are skipped and the rest clamped to `[0, 100]`.
    pub fn from_records(records: impl IntoIterator<Item = ScoreRecord>) -> Self {
        let mut table = Self::new();
        for r in records {
            table.insert(r);
        }
        table
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let records: Vec<ScoreRecord> = serde_json::from_slice(bytes)?;
        Ok(Self::from_records(records))
    }

    pub fn insert(&mut self, record: ScoreRecord) -> bool {
        if !record.value.is_finite() {
            return false;
        }
        self.snapshots.insert(record.snapshot_index);
        self.values.insert(
            (record.snapshot_index, record.region_id, record.metric),
            record.value.clamp(0.0, 100.0),
        );
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn snapshots(&self) -> impl Iterator<Item = u32> + '_ {
        self.snapshots.iter().copied()
    }

    pub fn latest_snapshot(&self) -> Option<u32> {
        self.snapshots.last().copied()
    }

    pub fn active_snapshot(&self) -> Option<u32> {
        self.active.or_else(|| self.latest_snapshot())
    }

    /// Pins the active snapshot. Returns `false` if the table has no such snapshot.
    pub fn select_snapshot(&mut self, index: u32) -> bool {
        if !self.snapshots.contains(&index) {
            return false;
        }
        self.active = Some(index);
        true
    }

    /// Raw record value, without metric derivation.
    pub fn value(&self, snapshot: u32, region_id: &str, metric: OverlayMetric) -> Option<f64> {
        self.values
            .get(&(snapshot, region_id.to_string(), metric))
            .copied()
    }
}

impl ScoreProvider for ScoreTable {
    fn base_score(&self, region_id: &str) -> Option<f64> {
        self.value(self.active_snapshot()?, region_id, OverlayMetric::Volume)
    }
}
