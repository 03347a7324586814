//! Relay connection abstraction
//!
//! The query engine consumes a connection primitive (connect, subscribe
//! with callbacks, close) rather than a concrete transport. Production
//! code uses the websocket connector in [`crate::ws`]; tests inject their
//! own.

use std::sync::Arc;

use sotto_core::event::SignedEvent;

use crate::error::Result;
use crate::filter::Filter;

/// Callbacks fed by an open subscription
pub trait SubscriptionObserver: Send + Sync {
    /// A record matching the filter arrived
    fn on_record(&self, event: SignedEvent);

    /// The relay delivered its end-of-backlog marker
    fn on_end_of_backlog(&self);
}

/// One open connection to a relay
#[async_trait::async_trait]
pub trait RelayConnection: Send + Sync {
    /// Open the connection's single subscription
    async fn subscribe(
        &self,
        filter: Filter,
        observer: Arc<dyn SubscriptionObserver>,
    ) -> Result<()>;

    /// Close the subscription and the connection
    ///
    /// Infallible by contract: close problems are logged and swallowed by
    /// implementations, never surfaced.
    async fn close(&self);
}

/// Opens relay connections
#[async_trait::async_trait]
pub trait RelayConnector: Send + Sync {
    /// Connect to the relay at `url`
    async fn connect(&self, url: &str) -> Result<Box<dyn RelayConnection>>;
}
