use std::collections::BTreeMap;
use std::sync::Arc;

use formats::{BoundaryCollection, ProfileDocument};

use crate::request::DatasetScope;
use crate::residency::LoadState;

/// Parsed contents of a loaded dataset, shared read-only with consumers.
#[derive(Debug, Clone)]
pub enum DatasetPayload {
    Boundaries(Arc<BoundaryCollection>),
    Profiles(Arc<ProfileDocument>),
}

/// One dataset and its lifecycle.
///
/// `payload` is only ever set together with `LoadState::Loaded`.
#[derive(Debug, Clone)]
pub struct BoundaryDataset {
    pub scope: DatasetScope,
    pub source_url: Option<String>,
    pub load_state: LoadState,
    /// BLAKE3 digest of the fetched bytes.
    pub version: Option<String>,
    payload: Option<DatasetPayload>,
    generation: u64,
}

impl BoundaryDataset {
    pub fn payload(&self) -> Option<&DatasetPayload> {
        self.payload.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Deterministic registry of datasets keyed by scope.
///
/// Entries are created lazily by `begin` and only reset by `reset`.
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    entries: BTreeMap<DatasetScope, BoundaryDataset>,
    next_generation: u64,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, scope: &DatasetScope) -> Option<&BoundaryDataset> {
        self.entries.get(scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundaryDataset> {
        self.entries.values()
    }

    /// Load state of a scope; scopes never requested report `Unloaded`.
    pub fn state(&self, scope: &DatasetScope) -> LoadState {
        self.entries
            .get(scope)
            .map(|e| e.load_state)
            .unwrap_or_default()
    }

    pub fn boundaries(&self, scope: &DatasetScope) -> Option<Arc<BoundaryCollection>> {
        match self.entries.get(scope)?.payload.as_ref()? {
            DatasetPayload::Boundaries(b) => Some(Arc::clone(b)),
            DatasetPayload::Profiles(_) => None,
        }
    }

    pub fn profiles(&self, scope: &DatasetScope) -> Option<Arc<ProfileDocument>> {
        match self.entries.get(scope)?.payload.as_ref()? {
            DatasetPayload::Profiles(p) => Some(Arc::clone(p)),
            DatasetPayload::Boundaries(_) => None,
        }
    }

    /// Moves an unloaded scope to `Loading` and returns its generation.
    ///
    /// Returns `None` when the scope is already loading or settled.
    pub fn begin(&mut self, scope: &DatasetScope, source_url: Option<String>) -> Option<u64> {
        let generation = self.next_generation;
        let entry = self
            .entries
            .entry(scope.clone())
            .or_insert_with(|| BoundaryDataset {
                scope: scope.clone(),
                source_url: None,
                load_state: LoadState::Unloaded,
                version: None,
                payload: None,
                generation,
            });
        if entry.load_state != LoadState::Unloaded {
            return None;
        }
        self.next_generation += 1;
        entry.generation = generation;
        entry.source_url = source_url;
        entry.load_state = LoadState::Loading;
        Some(generation)
    }

    /// Settles a loading scope as `Loaded`.
    ///
    /// Returns `false` (and changes nothing) if the scope was reset since `begin`.
    pub fn finish_loaded(
        &mut self,
        scope: &DatasetScope,
        generation: u64,
        payload: DatasetPayload,
        version: String,
    ) -> bool {
        let Some(entry) = self.current_loading(scope, generation) else {
            return false;
        };
        entry.payload = Some(payload);
        entry.version = Some(version);
        entry.load_state = LoadState::Loaded;
        true
    }

    /// Settles a loading scope as `Unavailable`.
    pub fn finish_unavailable(&mut self, scope: &DatasetScope, generation: u64) -> bool {
        let Some(entry) = self.current_loading(scope, generation) else {
            return false;
        };
        entry.payload = None;
        entry.version = None;
        entry.load_state = LoadState::Unavailable;
        true
    }

    /// Marks a scope unavailable without a fetch (e.g. not declared in the catalog).
    pub fn mark_unavailable(&mut self, scope: &DatasetScope) {
        if let Some(generation) = self.begin(scope, None) {
            self.finish_unavailable(scope, generation);
        }
    }

    /// Explicit reload: drops any payload and returns the scope to `Unloaded`.
    pub fn reset(&mut self, scope: &DatasetScope) -> bool {
        self.entries.remove(scope).is_some()
    }

    fn current_loading(
        &mut self,
        scope: &DatasetScope,
        generation: u64,
    ) -> Option<&mut BoundaryDataset> {
        self.entries
            .get_mut(scope)
            .filter(|e| e.load_state == LoadState::Loading && e.generation == generation)
    }
}
