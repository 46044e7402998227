use std::sync::Arc;

use formats::{BoundaryCollection, ProfileDocument};
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::{DatasetPayload, DatasetRegistry};
use crate::capabilities::{DatasetCatalog, DatasetEndpoint};
use crate::request::DatasetScope;
use crate::residency::{LoadOutcome, LoadState, Tier};
use crate::source::{DocumentSource, FetchedDocument, SourceError};

/// A started load: the scope is `Loading` until the ticket is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub scope: DatasetScope,
    pub tier: Tier,
    pub endpoint: DatasetEndpoint,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Begin {
    Started(FetchTicket),
    /// Nothing to fetch; the outcome is already known.
    Settled(LoadOutcome),
}

/// A required-dataset failure kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadDiagnostic {
    pub scope: DatasetScope,
    pub url: Option<String>,
    pub reason: String,
}

enum Failure {
    Unavailable(String),
    Error(String),
}

/// Fetches, validates, and registers datasets per scope.
///
/// Loads never raise: every failure settles the scope as `Unavailable` and is
/// reported through the returned `LoadOutcome`. Required-tier failures are
/// additionally kept in `diagnostics()`.
pub struct DatasetLoader {
    source: Arc<dyn DocumentSource>,
    catalog: DatasetCatalog,
    registry: DatasetRegistry,
    diagnostics: Vec<LoadDiagnostic>,
}

impl DatasetLoader {
    pub fn new(source: Arc<dyn DocumentSource>, catalog: DatasetCatalog) -> Self {
        Self {
            source,
            catalog,
            registry: DatasetRegistry::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    pub fn source(&self) -> Arc<dyn DocumentSource> {
        Arc::clone(&self.source)
    }

    pub fn load_state(&self, scope: &DatasetScope) -> LoadState {
        self.registry.state(scope)
    }

    pub fn boundaries(&self, scope: &DatasetScope) -> Option<Arc<BoundaryCollection>> {
        self.registry.boundaries(scope)
    }

    pub fn profiles(&self, scope: &DatasetScope) -> Option<Arc<ProfileDocument>> {
        self.registry.profiles(scope)
    }

    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        &self.diagnostics
    }

    /// Explicit reload: the next request for `scope` fetches again.
    pub fn reload(&mut self, scope: &DatasetScope) -> bool {
        info!(scope = %scope, "dataset reset for reload");
        self.registry.reset(scope)
    }

    /// Starts a load for `scope`, or reports why none is needed.
    pub fn begin(&mut self, scope: &DatasetScope, tier: Tier) -> Begin {
        match self.registry.state(scope) {
            LoadState::Unloaded => {}
            LoadState::Loading => return Begin::Settled(LoadOutcome::Pending),
            LoadState::Loaded => return Begin::Settled(LoadOutcome::Loaded),
            LoadState::Unavailable => {
                return Begin::Settled(LoadOutcome::Unavailable {
                    reason: format!("{scope} was previously unavailable"),
                });
            }
        }

        let Some(endpoint) = self.catalog.endpoint(scope) else {
            let reason = format!("{scope} is not declared in the dataset catalog");
            self.registry.mark_unavailable(scope);
            self.record_failure(scope, None, tier, &reason);
            return Begin::Settled(LoadOutcome::Unavailable { reason });
        };

        match self.registry.begin(scope, Some(endpoint.url.clone())) {
            Some(generation) => {
                debug!(scope = %scope, url = %endpoint.url, "dataset loading");
                Begin::Started(FetchTicket {
                    scope: scope.clone(),
                    tier,
                    endpoint,
                    generation,
                })
            }
            None => Begin::Settled(LoadOutcome::Pending),
        }
    }

    /// Performs the transport step of a ticket. Touches no loader state.
    pub async fn fetch(
        source: &dyn DocumentSource,
        ticket: &FetchTicket,
    ) -> Result<FetchedDocument, SourceError> {
        source.fetch(&ticket.endpoint.url).await
    }

    /// Validates and decodes a fetched document, then settles the ticket's scope.
    ///
    /// If the scope was reset by `reload` after `begin`, the result is dropped
    /// and `Pending` is returned: a newer request owns the scope.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        fetched: Result<FetchedDocument, SourceError>,
    ) -> LoadOutcome {
        let decoded = fetched
            .map_err(|e| Failure::Error(e.to_string()))
            .and_then(|doc| decode(&ticket, &doc));

        match decoded {
            Ok((payload, version)) => {
                if !self
                    .registry
                    .finish_loaded(&ticket.scope, ticket.generation, payload, version)
                {
                    debug!(scope = %ticket.scope, "discarding superseded dataset response");
                    return LoadOutcome::Pending;
                }
                debug!(scope = %ticket.scope, "dataset loaded");
                LoadOutcome::Loaded
            }
            Err(failure) => {
                if !self
                    .registry
                    .finish_unavailable(&ticket.scope, ticket.generation)
                {
                    return LoadOutcome::Pending;
                }
                let url = Some(ticket.endpoint.url.clone());
                match failure {
                    Failure::Unavailable(reason) => {
                        self.record_failure(&ticket.scope, url, ticket.tier, &reason);
                        LoadOutcome::Unavailable { reason }
                    }
                    Failure::Error(reason) => {
                        self.record_failure(&ticket.scope, url, ticket.tier, &reason);
                        LoadOutcome::Error { reason }
                    }
                }
            }
        }
    }

    pub async fn load(&mut self, scope: &DatasetScope, tier: Tier) -> LoadOutcome {
        let ticket = match self.begin(scope, tier) {
            Begin::Started(ticket) => ticket,
            Begin::Settled(outcome) => return outcome,
        };
        let source = Arc::clone(&self.source);
        let fetched = Self::fetch(source.as_ref(), &ticket).await;
        self.complete(ticket, fetched)
    }

    /// Loads an enhancement dataset; failures degrade silently.
    pub async fn load_optional_dataset(&mut self, scope: &DatasetScope) -> LoadOutcome {
        self.load(scope, Tier::Optional).await
    }

    /// Loads a base-map dataset; failures are also kept as diagnostics.
    pub async fn load_required_dataset(&mut self, scope: &DatasetScope) -> LoadOutcome {
        self.load(scope, Tier::Required).await
    }

    /// Loads several scopes with their fetches in flight concurrently.
    ///
    /// Each scope succeeds or fails on its own; outcomes follow input order.
    pub async fn load_many(&mut self, scopes: &[DatasetScope]) -> Vec<(DatasetScope, LoadOutcome)> {
        let mut outcomes: Vec<Option<LoadOutcome>> = vec![None; scopes.len()];
        let mut tickets: Vec<(usize, FetchTicket)> = Vec::new();
        for (i, scope) in scopes.iter().enumerate() {
            match self.begin(scope, scope.tier()) {
                Begin::Started(ticket) => tickets.push((i, ticket)),
                Begin::Settled(outcome) => outcomes[i] = Some(outcome),
            }
        }

        let source = Arc::clone(&self.source);
        let fetched = join_all(
            tickets
                .iter()
                .map(|(_, ticket)| Self::fetch(source.as_ref(), ticket)),
        )
        .await;

        for ((i, ticket), result) in tickets.into_iter().zip(fetched) {
            outcomes[i] = Some(self.complete(ticket, result));
        }

        scopes
            .iter()
            .cloned()
            .zip(outcomes)
            .map(|(scope, outcome)| (scope, outcome.unwrap_or(LoadOutcome::Pending)))
            .collect()
    }

    fn record_failure(
        &mut self,
        scope: &DatasetScope,
        url: Option<String>,
        tier: Tier,
        reason: &str,
    ) {
        match tier {
            Tier::Optional => {
                debug!(scope = %scope, reason, "optional dataset unavailable");
            }
            Tier::Required => {
                warn!(
                    scope = %scope,
                    url = url.as_deref().unwrap_or("-"),
                    reason,
                    "required dataset failed to load"
                );
                self.diagnostics.push(LoadDiagnostic {
                    scope: scope.clone(),
                    url,
                    reason: reason.to_string(),
                });
            }
        }
    }
}

fn decode(
    ticket: &FetchTicket,
    doc: &FetchedDocument,
) -> Result<(DatasetPayload, String), Failure> {
    match doc.status {
        200..=299 => {}
        404 | 410 => return Err(Failure::Unavailable(format!("HTTP {}", doc.status))),
        other => return Err(Failure::Error(format!("HTTP status {other}"))),
    }

    if let Some(ct) = doc.content_type.as_deref() {
        if ct.to_ascii_lowercase().contains("html") {
            return Err(Failure::Error(format!("unexpected content type: {ct}")));
        }
    }

    match doc.body.iter().find(|b| !b.is_ascii_whitespace()) {
        None => return Err(Failure::Error("empty response body".to_string())),
        Some(b'<') => {
            return Err(Failure::Error(
                "response body is markup, not structured data".to_string(),
            ));
        }
        Some(_) => {}
    }

    let payload = match &ticket.scope {
        DatasetScope::Profiles { .. } => ProfileDocument::from_json_slice(&doc.body)
            .map(|p| DatasetPayload::Profiles(Arc::new(p)))
            .map_err(|e| Failure::Error(format!("profile parse error: {e}")))?,
        _ => BoundaryCollection::from_json_slice(&doc.body, ticket.endpoint.object.as_deref())
            .map(|b| DatasetPayload::Boundaries(Arc::new(b)))
            .map_err(|e| Failure::Error(e.to_string()))?,
    };

    Ok((payload, blake3::hash(&doc.body).to_hex().to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Begin, DatasetLoader};
    use crate::capabilities::{DatasetCatalog, DatasetEndpoint, DistrictSources};
    use crate::request::DatasetScope;
    use crate::residency::{LoadOutcome, LoadState, Tier};
    use crate::source::{FetchedDocument, MemorySource};
    use foundation::Chamber;

    const STATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature", "id": "04", "properties": { "name": "Arizona" },
            "geometry": { "type": "Polygon", "coordinates":
                [[[-114.8, 31.3], [-109.0, 31.3], [-109.0, 37.0],
                 [-114.8, 37.0], [-114.8, 31.3]]] }
        }]
    }"#;

    fn catalog() -> DatasetCatalog {
        let mut c = DatasetCatalog {
            states: DatasetEndpoint::new("states.json"),
            counties: DatasetEndpoint::new("counties.json"),
            districts: Default::default(),
        };
        c.districts.insert(
            "AZ".to_string(),
            DistrictSources {
                house: Some(DatasetEndpoint::new("az/house.json")),
                senate: Some(DatasetEndpoint::new("az/senate.json")),
                profiles: Some("az/profiles.json".to_string()),
            },
        );
        c
    }

    fn loader(source: MemorySource) -> DatasetLoader {
        DatasetLoader::new(Arc::new(source), catalog())
    }

    #[tokio::test]
    async fn loads_and_shares_boundaries() {
        let mut l = loader(
            MemorySource::new().with_document("states.json", FetchedDocument::json(STATES)),
        );
        let outcome = l.load_required_dataset(&DatasetScope::States).await;
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(l.load_state(&DatasetScope::States), LoadState::Loaded);

        let states = l.boundaries(&DatasetScope::States).expect("payload");
        assert_eq!(states.len(), 1);
        let version = l
            .registry()
            .get(&DatasetScope::States)
            .and_then(|d| d.version.clone())
            .expect("version");
        assert_eq!(version.len(), 64);

        // Settled scopes are not fetched again.
        assert_eq!(
            l.load_required_dataset(&DatasetScope::States).await,
            LoadOutcome::Loaded
        );
    }

    #[tokio::test]
    async fn not_found_is_unavailable_without_raising() {
        let mut l = loader(MemorySource::new());
        let scope = DatasetScope::districts("04", Chamber::House);
        let outcome = l.load_optional_dataset(&scope).await;
        assert!(matches!(outcome, LoadOutcome::Unavailable { .. }));
        assert_eq!(l.load_state(&scope), LoadState::Unavailable);
        assert!(l.diagnostics().is_empty(), "optional failures are silent");
    }

    #[tokio::test]
    async fn required_failures_are_recorded() {
        let mut l = loader(MemorySource::new());
        let outcome = l.load_required_dataset(&DatasetScope::Counties).await;
        assert!(matches!(outcome, LoadOutcome::Unavailable { .. }));
        assert_eq!(l.diagnostics().len(), 1);
        assert_eq!(l.diagnostics()[0].scope, DatasetScope::Counties);
        assert_eq!(l.diagnostics()[0].url.as_deref(), Some("counties.json"));
    }

    #[tokio::test]
    async fn html_served_with_200_is_rejected() {
        let mut l = loader(
            MemorySource::new()
                .with_document(
                    "states.json",
                    FetchedDocument::ok("text/html; charset=utf-8", "<!doctype html>"),
                )
                .with_document(
                    "counties.json",
                    FetchedDocument::ok("application/octet-stream", "  <html></html>"),
                ),
        );
        let a = l.load_required_dataset(&DatasetScope::States).await;
        let b = l.load_required_dataset(&DatasetScope::Counties).await;
        assert!(matches!(a, LoadOutcome::Error { .. }));
        assert!(matches!(b, LoadOutcome::Error { .. }));
        assert_eq!(l.load_state(&DatasetScope::States), LoadState::Unavailable);
        assert!(l.boundaries(&DatasetScope::States).is_none());
    }

    #[tokio::test]
    async fn transport_and_parse_errors_settle_unavailable() {
        let mut l = loader(
            MemorySource::new()
                .with_failure("az/house.json", "connection reset")
                .with_document("az/senate.json", FetchedDocument::json(r#"{"type": "Feature"}"#))
                .with_document(
                    "az/profiles.json",
                    FetchedDocument {
                        status: 500,
                        content_type: Some("application/json".to_string()),
                        body: b"{}".to_vec(),
                    },
                ),
        );
        for scope in [
            DatasetScope::districts("04", Chamber::House),
            DatasetScope::districts("04", Chamber::Senate),
            DatasetScope::profiles("04"),
        ] {
            let outcome = l.load_optional_dataset(&scope).await;
            assert!(matches!(outcome, LoadOutcome::Error { .. }), "{scope}: {outcome:?}");
            assert_eq!(l.load_state(&scope), LoadState::Unavailable);
        }
    }

    #[tokio::test]
    async fn undeclared_scopes_resolve_without_fetch() {
        let mut l = loader(MemorySource::new());
        let scope = DatasetScope::districts("06", Chamber::Senate);
        match l.begin(&scope, Tier::Optional) {
            Begin::Settled(LoadOutcome::Unavailable { reason }) => {
                assert!(reason.contains("not declared"));
            }
            other => panic!("expected settled unavailable, got {other:?}"),
        }
        assert_eq!(l.load_state(&scope), LoadState::Unavailable);
    }

    #[tokio::test]
    async fn loading_state_is_visible_between_begin_and_complete() {
        let mut l = loader(
            MemorySource::new().with_document("states.json", FetchedDocument::json(STATES)),
        );
        let Begin::Started(ticket) = l.begin(&DatasetScope::States, Tier::Required) else {
            panic!("expected a fetch");
        };
        assert_eq!(l.load_state(&DatasetScope::States), LoadState::Loading);
        assert_eq!(
            l.begin(&DatasetScope::States, Tier::Required),
            Begin::Settled(LoadOutcome::Pending)
        );

        let source = l.source();
        let fetched = DatasetLoader::fetch(source.as_ref(), &ticket).await;
        assert_eq!(l.complete(ticket, fetched), LoadOutcome::Loaded);
    }

    #[tokio::test]
    async fn reload_discards_in_flight_response() {
        let mut l = loader(
            MemorySource::new().with_document("states.json", FetchedDocument::json(STATES)),
        );
        let Begin::Started(stale) = l.begin(&DatasetScope::States, Tier::Required) else {
            panic!("expected a fetch");
        };
        assert!(l.reload(&DatasetScope::States));
        assert_eq!(l.load_state(&DatasetScope::States), LoadState::Unloaded);

        let source = l.source();
        let fetched = DatasetLoader::fetch(source.as_ref(), &stale).await;
        assert_eq!(l.complete(stale, fetched), LoadOutcome::Pending);
        assert_eq!(l.load_state(&DatasetScope::States), LoadState::Unloaded);
    }

    #[tokio::test]
    async fn load_many_isolates_failures() {
        let mut l = loader(
            MemorySource::new()
                .with_document("states.json", FetchedDocument::json(STATES))
                .with_document(
                    "az/profiles.json",
                    FetchedDocument::json(r#"{ "districts": [] }"#),
                ),
        );
        let scopes = vec![
            DatasetScope::States,
            DatasetScope::Counties,
            DatasetScope::districts("04", Chamber::House),
            DatasetScope::districts("04", Chamber::Senate),
            DatasetScope::profiles("04"),
        ];
        let outcomes = l.load_many(&scopes).await;
        let got: Vec<bool> = outcomes.iter().map(|(_, o)| o.is_loaded()).collect();
        assert_eq!(got, vec![true, false, false, false, true]);
        assert_eq!(outcomes[1].0, DatasetScope::Counties);
        assert!(l.profiles(&DatasetScope::profiles("04")).is_some());
        // Only the required counties failure is a diagnostic.
        assert_eq!(l.diagnostics().len(), 1);
    }
}
