//! Websocket relay connector
//!
//! Production implementation of the connection traits over
//! `async-tungstenite`. One socket per connection, one subscription per
//! socket; a reader task dispatches `EVENT`/`EOSE` frames to the observer
//! until the stream ends or the connection is closed. Incoming records are
//! signature-checked before they reach the observer.

use std::sync::Arc;

use async_tungstenite::tokio::{connect_async, ConnectStream};
use async_tungstenite::tungstenite::Message;
use async_tungstenite::WebSocketStream;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::debug;
use uuid::Uuid;

use sotto_core::event::SignedEvent;

use crate::connection::{RelayConnection, RelayConnector, SubscriptionObserver};
use crate::error::{RelayError, Result};
use crate::filter::Filter;
use crate::wire::{ClientMessage, RelayMessage};

type WsSink = SplitSink<WebSocketStream<ConnectStream>, Message>;
type WsSource = SplitStream<WebSocketStream<ConnectStream>>;

/// Connector opening plain websocket connections
#[derive(Clone, Copy, Debug, Default)]
pub struct WebsocketConnector;

#[async_trait::async_trait]
impl RelayConnector for WebsocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn RelayConnection>> {
        debug!(%url, "connecting to relay");
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| RelayError::ConnectionFailed(e.to_string()))?;
        let (sink, source) = stream.split();
        Ok(Box::new(WebsocketConnection {
            sink: tokio::sync::Mutex::new(sink),
            source: parking_lot::Mutex::new(Some(source)),
            subscription_id: parking_lot::Mutex::new(None),
            reader: parking_lot::Mutex::new(None),
        }))
    }
}

struct WebsocketConnection {
    sink: tokio::sync::Mutex<WsSink>,
    // moved into the reader task on subscribe
    source: parking_lot::Mutex<Option<WsSource>>,
    subscription_id: parking_lot::Mutex<Option<String>>,
    reader: parking_lot::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[async_trait::async_trait]
impl RelayConnection for WebsocketConnection {
    async fn subscribe(
        &self,
        filter: Filter,
        observer: Arc<dyn SubscriptionObserver>,
    ) -> Result<()> {
        let source = self
            .source
            .lock()
            .take()
            .ok_or_else(|| RelayError::Subscription("connection already subscribed".into()))?;

        let subscription_id = Uuid::new_v4().simple().to_string();
        let request = ClientMessage::Req {
            subscription_id: subscription_id.clone(),
            filter,
        }
        .to_json()?;

        self.sink
            .lock()
            .await
            .send(Message::Text(request))
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;

        debug!(%subscription_id, "subscription opened");
        *self.subscription_id.lock() = Some(subscription_id.clone());
        *self.reader.lock() = Some(tokio::spawn(read_loop(source, subscription_id, observer)));
        Ok(())
    }

    async fn close(&self) {
        // best effort on every step; a relay that hangs up first is fine
        let subscription_id = self.subscription_id.lock().take();
        if let Some(subscription_id) = subscription_id {
            if let Ok(frame) = (ClientMessage::Close { subscription_id }).to_json() {
                let _ = self.sink.lock().await.send(Message::Text(frame)).await;
            }
        }
        if let Err(e) = self.sink.lock().await.close().await {
            debug!("relay socket close failed: {e}");
        }
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
    }
}

async fn read_loop(
    mut source: WsSource,
    subscription_id: String,
    observer: Arc<dyn SubscriptionObserver>,
) {
    while let Some(frame) = source.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("relay stream error: {e}");
                break;
            }
        };

        match RelayMessage::parse(&text) {
            Ok(RelayMessage::Event {
                subscription_id: sid,
                event,
            }) if sid == subscription_id => dispatch_record(event, observer.as_ref()),
            Ok(RelayMessage::EndOfBacklog {
                subscription_id: sid,
            }) if sid == subscription_id => observer.on_end_of_backlog(),
            Ok(RelayMessage::Other { verb }) => debug!(%verb, "ignoring relay frame"),
            Ok(_) => debug!("frame for unknown subscription"),
            Err(e) => debug!("unparseable relay frame: {e}"),
        }
    }
}

fn dispatch_record(event: SignedEvent, observer: &dyn SubscriptionObserver) {
    // remote records are untrusted until their signature holds up
    match event.verify() {
        Ok(()) => observer.on_record(event),
        Err(e) => debug!("dropping record with invalid signature: {e}"),
    }
}
