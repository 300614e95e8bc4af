//! Place search shared by live suggestions and committed searches.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::GeocodeFailure;
use crate::model::PlaceCandidate;
use crate::provider::PlaceSearchApi;

pub const RESULT_LIMIT: usize = 4;
pub const MIN_SUGGESTION_CHARS: usize = 2;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Ranked candidates for `query`, at most [`RESULT_LIMIT`], in service order.
pub async fn lookup(
    places: &dyn PlaceSearchApi,
    query: &str,
) -> Result<Vec<PlaceCandidate>, GeocodeFailure> {
    let mut candidates = places.search_places(query, RESULT_LIMIT).await?;
    candidates.truncate(RESULT_LIMIT);
    Ok(candidates)
}

pub fn wants_suggestions(text: &str) -> bool {
    text.chars().count() >= MIN_SUGGESTION_CHARS
}

/// Live-suggestion lookup. Failures are logged and read as "no suggestions".
pub async fn suggest(places: &dyn PlaceSearchApi, text: &str) -> Vec<PlaceCandidate> {
    if !wants_suggestions(text) {
        return Vec::new();
    }

    lookup(places, text).await.unwrap_or_else(|error| {
        tracing::warn!(%error, text, "suggestion lookup failed");
        Vec::new()
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Found(PlaceCandidate),
    NotFound,
}

/// Submitted search: the top-ranked candidate, or `NotFound` when there is
/// none or the lookup failed.
pub async fn commit(places: &dyn PlaceSearchApi, query: &str) -> CommitOutcome {
    let query = query.trim();
    if query.is_empty() {
        return CommitOutcome::NotFound;
    }

    match lookup(places, query).await {
        Ok(candidates) => candidates
            .into_iter()
            .next()
            .map_or(CommitOutcome::NotFound, CommitOutcome::Found),
        Err(error) => {
            tracing::warn!(%error, query, "place search failed");
            CommitOutcome::NotFound
        }
    }
}

/// Runs the latest scheduled task once `delay` has passed without a newer
/// one. Scheduling aborts whatever is still pending, timer or request.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
