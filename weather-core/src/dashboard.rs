//! Dashboard controller: the single owner of the view state.
//!
//! Front ends drive it through its methods and read state through
//! [`Dashboard::subscribe`] or [`Dashboard::snapshot`]. Every forecast load and
//! every suggestion lookup carries a generation number; a response that comes
//! back after a newer one was started is dropped instead of overwriting the
//! newer state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

use crate::decoder;
use crate::error::{ForecastError, ProviderError};
use crate::model::{Forecast, ForecastRequest, PlaceCandidate};
use crate::provider::Providers;
use crate::search::{self, CommitOutcome, Debouncer};

pub const FETCH_FAILED: &str = "Failed to fetch weather data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardStatus {
    Idle,
    Loading,
    Ready,
    Error,
    NotFound,
}

/// Everything a view needs to render the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardViewState {
    pub forecast: Option<Forecast>,
    pub loading: bool,
    pub error: Option<String>,
    pub not_found: bool,
    pub suggestions_loading: bool,
    pub suggestions: Vec<PlaceCandidate>,
    pub search_text: String,
    pub submitted_query: String,
}

impl DashboardViewState {
    /// A not-found search outranks the forecast cycle; the forecast data
    /// is still there underneath it.
    pub fn status(&self) -> DashboardStatus {
        if self.not_found {
            DashboardStatus::NotFound
        } else if self.loading {
            DashboardStatus::Loading
        } else if self.error.is_some() {
            DashboardStatus::Error
        } else if self.forecast.is_some() {
            DashboardStatus::Ready
        } else {
            DashboardStatus::Idle
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    providers: Providers,
    state: watch::Sender<DashboardViewState>,
    request: Mutex<ForecastRequest>,
    forecast_generation: AtomicU64,
    suggestion_generation: AtomicU64,
    commit_generation: AtomicU64,
    suggestions: Mutex<Debouncer>,
}

impl Dashboard {
    pub fn new(providers: Providers, request: ForecastRequest, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                providers,
                state: watch::Sender::new(DashboardViewState::default()),
                request: Mutex::new(request),
                forecast_generation: AtomicU64::new(0),
                suggestion_generation: AtomicU64::new(0),
                commit_generation: AtomicU64::new(0),
                suggestions: Mutex::new(Debouncer::new(debounce)),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardViewState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> DashboardViewState {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> DashboardStatus {
        self.inner.state.borrow().status()
    }

    /// Parameters of the most recent forecast cycle.
    pub fn request(&self) -> ForecastRequest {
        self.inner.request.lock().clone()
    }

    /// Initial load for the configured location.
    pub async fn start(&self) -> DashboardStatus {
        let request = self.request();
        self.load(request).await
    }

    /// Re-issues the last request unchanged.
    pub async fn retry(&self) -> DashboardStatus {
        let request = self.request();
        tracing::info!(
            latitude = request.latitude,
            longitude = request.longitude,
            "retrying forecast"
        );
        self.load(request).await
    }

    /// Supersedes any committed search still waiting on the place service.
    pub async fn set_coordinates(&self, latitude: f64, longitude: f64) -> DashboardStatus {
        self.next_commit_generation();
        self.load_coordinates(latitude, longitude).await
    }

    async fn load_coordinates(&self, latitude: f64, longitude: f64) -> DashboardStatus {
        let request = {
            let mut current = self.inner.request.lock();
            *current = current.with_coordinates(latitude, longitude);
            current.clone()
        };
        self.load(request).await
    }

    /// Records a keystroke and schedules a debounced suggestion lookup.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input(&self, text: impl Into<String>) {
        let text = text.into();
        let generation = self.next_suggestion_generation();
        let wants_suggestions = search::wants_suggestions(&text);

        self.inner.state.send_modify(|state| {
            state.search_text.clone_from(&text);
            if !wants_suggestions {
                state.suggestions.clear();
                state.suggestions_loading = false;
            }
        });

        let mut debouncer = self.inner.suggestions.lock();
        if !wants_suggestions {
            debouncer.cancel();
            return;
        }

        let inner = Arc::clone(&self.inner);
        debouncer.schedule(async move {
            inner.fetch_suggestions(generation, text).await;
        });
    }

    /// Committed search for the current search text.
    pub async fn submit(&self) -> DashboardStatus {
        let query = self.inner.state.borrow().search_text.clone();
        self.submit_query(&query).await
    }

    /// Committed search: the top candidate becomes the new location, no
    /// candidate (or a failed lookup) leaves the forecast as it is and
    /// reports not-found. The outcome is dropped if another search, selection
    /// or coordinate change started while the lookup was in flight.
    pub async fn submit_query(&self, query: &str) -> DashboardStatus {
        let generation = self.next_commit_generation();
        self.dismiss_suggestions();
        self.inner.state.send_modify(|state| {
            state.submitted_query = query.to_string();
            state.not_found = false;
        });

        let outcome = search::commit(self.inner.providers.places.as_ref(), query).await;

        if self.inner.commit_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, query, "dropping stale search result");
            return self.status();
        }

        match outcome {
            CommitOutcome::Found(candidate) => self.move_to(candidate).await,
            CommitOutcome::NotFound => {
                tracing::info!(query, "no place matched the search");
                self.inner.state.send_modify(|state| state.not_found = true);
                DashboardStatus::NotFound
            }
        }
    }

    /// Moves the dashboard to `candidate` and starts a new forecast cycle.
    pub async fn select_place(&self, candidate: PlaceCandidate) -> DashboardStatus {
        self.next_commit_generation();
        self.move_to(candidate).await
    }

    async fn move_to(&self, candidate: PlaceCandidate) -> DashboardStatus {
        self.dismiss_suggestions();
        self.inner.state.send_modify(|state| {
            state.not_found = false;
            state.search_text.clone_from(&candidate.label);
        });

        tracing::info!(place = %candidate.label, "place selected");
        self.load_coordinates(candidate.latitude, candidate.longitude)
            .await
    }

    async fn load(&self, request: ForecastRequest) -> DashboardStatus {
        let generation = self.inner.forecast_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let providers = &self.inner.providers;
        let result = decoder::load_forecast(
            providers.forecast.as_ref(),
            providers.reverse_geocoder.as_ref(),
            &request,
        )
        .await;

        if self.inner.forecast_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "dropping stale forecast");
            return self.status();
        }

        self.inner.state.send_modify(|state| {
            state.loading = false;
            match result {
                Ok(forecast) => {
                    state.forecast = Some(forecast);
                    state.error = None;
                }
                Err(error) => {
                    tracing::warn!(%error, "forecast load failed");
                    state.error = Some(error_message(&error));
                }
            }
        });

        self.status()
    }

    fn next_suggestion_generation(&self) -> u64 {
        self.inner
            .suggestion_generation
            .fetch_add(1, Ordering::SeqCst)
            + 1
    }

    fn next_commit_generation(&self) -> u64 {
        self.inner.commit_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn dismiss_suggestions(&self) {
        self.next_suggestion_generation();
        self.inner.suggestions.lock().cancel();
        self.inner.state.send_modify(|state| {
            state.suggestions.clear();
            state.suggestions_loading = false;
        });
    }
}

impl Inner {
    async fn fetch_suggestions(&self, generation: u64, text: String) {
        self.state.send_modify(|state| state.suggestions_loading = true);

        let suggestions = search::suggest(self.providers.places.as_ref(), &text).await;

        if self.suggestion_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, text = %text, "dropping stale suggestions");
            return;
        }

        self.state.send_modify(|state| {
            state.suggestions = suggestions;
            state.suggestions_loading = false;
        });
    }
}

/// Transport failures carry library wording, so they show the generic text.
fn error_message(error: &ForecastError) -> String {
    match error {
        ForecastError::Provider(ProviderError::Transport(_)) => FETCH_FAILED.to_string(),
        other => other.to_string(),
    }
}
