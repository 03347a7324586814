//! Bounded identity search
//!
//! One ephemeral connection, one filtered subscription, and a race between
//! the relay's end-of-backlog marker and a fixed timeout. Whichever fires
//! first resolves the call with whatever accumulated; the loser's arrival
//! is a no-op behind a one-shot flag. Search never errors: every failure
//! resolves to an empty list, and the connection is closed on every exit
//! path.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use sotto_core::event::{SignedEvent, KIND_PROFILE_METADATA};

use crate::config::SearchConfig;
use crate::connection::{RelayConnector, SubscriptionObserver};
use crate::error::Result;
use crate::filter::Filter;
use crate::profile::SearchResult;
use crate::ws::WebsocketConnector;

/// Best-effort identity search over one relay
pub struct RelayQueryEngine {
    config: SearchConfig,
    connector: Arc<dyn RelayConnector>,
}

impl RelayQueryEngine {
    /// Engine over the production websocket connector
    pub fn new(config: SearchConfig) -> Self {
        Self::with_connector(config, Arc::new(WebsocketConnector))
    }

    /// Engine over an injected connector
    pub fn with_connector(config: SearchConfig, connector: Arc<dyn RelayConnector>) -> Self {
        Self { config, connector }
    }

    /// Search profile records matching `query`
    ///
    /// Returns at most `limit` deduplicated identity summaries, in arrival
    /// order, within the configured time bound. Empty queries, engines
    /// without a search relay, and failures of any kind all resolve to an
    /// empty list without raising.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }
        let Some(relay_url) = self.config.search_relay.clone() else {
            debug!("no search relay configured, resolving empty");
            return Vec::new();
        };

        match self.run_search(&relay_url, query, limit).await {
            Ok(results) => results,
            Err(e) => {
                debug!("search failed, resolving empty: {e}");
                Vec::new()
            }
        }
    }

    /// [`search`](Self::search) with the configured default limit
    pub async fn search_with_default_limit(&self, query: &str) -> Vec<SearchResult> {
        self.search(query, self.config.default_limit).await
    }

    async fn run_search(&self, relay_url: &str, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let connection = self.connector.connect(relay_url).await?;

        let filter = Filter::new()
            .kinds([KIND_PROFILE_METADATA])
            .search(query)
            .limit(limit);
        let (accumulator, end_of_backlog) = SearchAccumulator::new(limit);

        let outcome = async {
            connection
                .subscribe(filter, accumulator.clone() as Arc<dyn SubscriptionObserver>)
                .await?;

            match tokio::time::timeout(self.config.resolve_timeout(), end_of_backlog).await {
                Ok(_) => debug!(%query, "search resolved at end of backlog"),
                Err(_) => debug!(%query, "search resolved at timeout"),
            }
            Ok(accumulator.resolve())
        }
        .await;

        // every exit path closes; the connection swallows close errors
        connection.close().await;
        outcome
    }
}

struct AccumulatorState {
    results: Vec<SearchResult>,
    seen_authors: HashSet<String>,
    resolved: bool,
    end_of_backlog: Option<oneshot::Sender<()>>,
}

/// Shared result accumulator with one-shot resolution
struct SearchAccumulator {
    limit: usize,
    inner: Mutex<AccumulatorState>,
}

impl SearchAccumulator {
    fn new(limit: usize) -> (Arc<Self>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Arc::new(Self {
                limit,
                inner: Mutex::new(AccumulatorState {
                    results: Vec::new(),
                    seen_authors: HashSet::new(),
                    resolved: false,
                    end_of_backlog: Some(tx),
                }),
            }),
            rx,
        )
    }

    /// Mark the search resolved and take the accumulated results
    fn resolve(&self) -> Vec<SearchResult> {
        let mut state = self.inner.lock();
        state.resolved = true;
        std::mem::take(&mut state.results)
    }
}

impl SubscriptionObserver for SearchAccumulator {
    fn on_record(&self, event: SignedEvent) {
        let mut state = self.inner.lock();
        if state.resolved || state.results.len() >= self.limit {
            return;
        }
        if event.kind != KIND_PROFILE_METADATA {
            return;
        }
        // first record per author wins; later duplicates are dropped
        if !state.seen_authors.insert(event.pubkey.clone()) {
            return;
        }
        if let Some(result) = SearchResult::from_event(&event) {
            state.results.push(result);
        }
    }

    fn on_end_of_backlog(&self) {
        let mut state = self.inner.lock();
        if state.resolved {
            return;
        }
        // one-shot: a second signal finds the sender gone and is a no-op
        if let Some(sender) = state.end_of_backlog.take() {
            let _ = sender.send(());
        }
    }
}
