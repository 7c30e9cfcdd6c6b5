//! The "around you" orchestration: geo lookup, token acquisition and the
//! new-releases query, run strictly in sequence.
//!
//! [`AroundYou`] runs one invocation and never fails; every remote error is
//! logged and folded into a [`FlowOutcome`]. [`FlowController`] owns the
//! triggering side: it numbers invocations, cancels superseded ones and
//! publishes [`Snapshot`]s for whoever renders the result.

use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::clients::{
    GeoLocator, ReleaseCatalog, TokenSource,
    entities::{AccessToken, TrackSummary},
    errors::{Failure, UpstreamKind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Loading,
    Empty,
    Ready(Vec<TrackSummary>),
}

/// How one invocation settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Ready(Vec<TrackSummary>),
    /// Every call succeeded but the catalog had nothing to show.
    Empty,
    Upstream(UpstreamKind),
    Auth,
}

impl From<&FlowOutcome> for FlowState {
    fn from(outcome: &FlowOutcome) -> FlowState {
        match outcome {
            FlowOutcome::Ready(tracks) => FlowState::Ready(tracks.clone()),
            _ => FlowState::Empty,
        }
    }
}

impl From<Failure> for FlowOutcome {
    fn from(failure: Failure) -> FlowOutcome {
        match failure {
            Failure::Auth => FlowOutcome::Auth,
            Failure::Upstream(kind) => FlowOutcome::Upstream(kind),
        }
    }
}

/// What starts an invocation. The flow itself never produces a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A consumer became active; the country comes from the geo lookup.
    Mount,
    /// The consumer pinned a country, so no geo lookup is made.
    Country(String),
}

impl Trigger {
    /// A blank or missing country means "look it up".
    pub fn from_country(country: Option<&str>) -> Trigger {
        match country.map(str::trim) {
            Some(code) if !code.is_empty() => Trigger::Country(code.to_uppercase()),
            _ => Trigger::Mount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
    pub country: String,
    pub outcome: FlowOutcome,
}

impl FlowReport {
    pub fn state(&self) -> FlowState {
        FlowState::from(&self.outcome)
    }
}

pub struct AroundYou<G, T, C> {
    geo: G,
    tokens: T,
    catalog: C,
}

impl<G, T, C> AroundYou<G, T, C>
where
    G: GeoLocator,
    T: TokenSource,
    C: ReleaseCatalog,
{
    pub fn new(geo: G, tokens: T, catalog: C) -> Self {
        AroundYou {
            geo,
            tokens,
            catalog,
        }
    }

    pub async fn run(&self, trigger: &Trigger) -> FlowReport {
        let country = match trigger {
            Trigger::Mount => self.resolve_country().await,
            Trigger::Country(code) => code.clone(),
        };

        let token = match self.acquire_token().await {
            Ok(token) => token,
            Err(failure) => {
                return FlowReport {
                    country,
                    outcome: failure.into(),
                };
            }
        };

        let outcome = self.fetch_releases(&token, &country).await;
        FlowReport { country, outcome }
    }

    async fn resolve_country(&self) -> String {
        match self.geo.locate().await {
            Ok(geo) => geo.country_code,
            Err(e) => {
                warn!("Geo lookup failed, continuing without a country filter: {e}");
                String::new()
            }
        }
    }

    async fn acquire_token(&self) -> Result<AccessToken, Failure> {
        match self.tokens.access_token().await {
            Ok(token) if token.value.is_empty() => {
                error!("Token source handed out an empty access token");
                Err(Failure::Auth)
            }
            Ok(token) => Ok(token),
            Err(e) => {
                error!("Error fetching access token: {e}");
                Err(e.failure())
            }
        }
    }

    async fn fetch_releases(&self, token: &AccessToken, country: &str) -> FlowOutcome {
        let filter = Some(country).filter(|code| !code.is_empty());
        match self.catalog.new_releases(token, filter).await {
            Ok(albums) if albums.is_empty() => {
                info!("No new releases for country {country:?}");
                FlowOutcome::Empty
            }
            Ok(albums) => {
                info!("Fetched {} new releases for country {country:?}", albums.len());
                FlowOutcome::Ready(albums.into_iter().map(TrackSummary::from).collect())
            }
            Err(e) => {
                error!("Error fetching new releases: {e}");
                let failure = e.failure();
                if failure == Failure::Auth {
                    self.tokens.invalidate().await;
                }
                failure.into()
            }
        }
    }
}

/// Latest state published by a [`FlowController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub generation: u64,
    pub country: String,
    pub state: FlowState,
    /// `None` while loading.
    pub outcome: Option<FlowOutcome>,
}

impl Snapshot {
    fn loading(generation: u64) -> Self {
        Snapshot {
            generation,
            country: String::new(),
            state: FlowState::Loading,
            outcome: None,
        }
    }
}

#[derive(Default)]
struct InFlight {
    generation: u64,
    task: Option<AbortHandle>,
}

struct Shared<G, T, C> {
    flow: AroundYou<G, T, C>,
    in_flight: Mutex<InFlight>,
    state: watch::Sender<Snapshot>,
}

impl<G, T, C> Shared<G, T, C> {
    fn lock(&self) -> std::sync::MutexGuard<'_, InFlight> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a settled snapshot unless a newer invocation has started.
    fn settle(&self, generation: u64, report: &FlowReport) -> bool {
        let mut in_flight = self.lock();
        if in_flight.generation != generation {
            debug!("Discarding stale result of invocation {generation}");
            return false;
        }
        in_flight.task.take();
        self.state.send_replace(Snapshot {
            generation,
            country: report.country.clone(),
            state: report.state(),
            outcome: Some(report.outcome.clone()),
        });
        true
    }
}

pub struct FlowController<G, T, C> {
    shared: Arc<Shared<G, T, C>>,
}

impl<G, T, C> FlowController<G, T, C>
where
    G: GeoLocator + 'static,
    T: TokenSource + 'static,
    C: ReleaseCatalog + 'static,
{
    pub fn new(flow: AroundYou<G, T, C>) -> Self {
        FlowController {
            shared: Arc::new(Shared {
                flow,
                in_flight: Mutex::new(InFlight::default()),
                state: watch::Sender::new(Snapshot::loading(0)),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.state.borrow().clone()
    }

    /// Run the flow for `trigger`, superseding any invocation still in flight.
    ///
    /// The flow runs on its own task, so dropping the returned future does
    /// not stop it from settling. Returns `None` when this invocation was
    /// superseded before it settled; its result is then never published.
    pub async fn invoke(&self, trigger: Trigger) -> Option<FlowReport> {
        let (generation, task) = {
            // numbering, cancelling and the loading state change together
            let mut in_flight = self.shared.lock();
            in_flight.generation += 1;
            let generation = in_flight.generation;
            if let Some(previous) = in_flight.task.take() {
                previous.abort();
            }
            debug!("Starting invocation {generation} ({trigger:?})");
            self.shared.state.send_replace(Snapshot::loading(generation));

            let shared = Arc::clone(&self.shared);
            let task = tokio::spawn(async move {
                let report = shared.flow.run(&trigger).await;
                shared.settle(generation, &report).then_some(report)
            });
            in_flight.task = Some(task.abort_handle());
            (generation, task)
        };

        match task.await {
            Ok(report) => report,
            Err(e) if e.is_cancelled() => {
                debug!("Invocation {generation} was cancelled");
                None
            }
            Err(e) => {
                error!("Invocation {generation} panicked: {e}");
                let report = FlowReport {
                    country: String::new(),
                    outcome: FlowOutcome::Upstream(UpstreamKind::Unavailable),
                };
                self.shared.settle(generation, &report);
                None
            }
        }
    }
}
