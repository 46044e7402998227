/// Lifecycle of one boundary/profile dataset.
///
/// Unloaded → Loading → Loaded | Unavailable. Only an explicit reload moves a
/// settled dataset back to Unloaded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Unavailable,
}

impl LoadState {
    pub fn is_settled(self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Unavailable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoadState::Unloaded => "unloaded",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Unavailable => "unavailable",
        }
    }
}

/// Failure tier of a dataset.
///
/// Required datasets (national states and counties) record failures as
/// diagnostics; optional ones (district layers, profiles) degrade silently.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tier {
    Required,
    Optional,
}

/// Tagged result of a load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// The document does not exist (404/410) or is not declared for this scope.
    Unavailable { reason: String },
    /// Network, status, content-type, or parse failure.
    Error { reason: String },
    /// Another request for the same scope is still in flight.
    Pending,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::LoadState;

    #[test]
    fn only_loaded_and_unavailable_are_settled() {
        assert!(!LoadState::Unloaded.is_settled());
        assert!(!LoadState::Loading.is_settled());
        assert!(LoadState::Loaded.is_settled());
        assert!(LoadState::Unavailable.is_settled());
        assert_eq!(LoadState::default(), LoadState::Unloaded);
    }
}
