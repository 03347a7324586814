//! Relay wire frames
//!
//! Frames are JSON arrays with a leading verb. The client sends `REQ` and
//! `CLOSE`; the relay answers with `EVENT` frames followed by `EOSE`, the
//! end-of-backlog marker. Anything else a relay may send (`NOTICE`, `OK`,
//! `CLOSED`, ...) is preserved as [`RelayMessage::Other`] and ignored by
//! this client.

use serde_json::{json, Value};

use sotto_core::event::SignedEvent;

use crate::error::{RelayError, Result};
use crate::filter::Filter;

/// Frames sent by the client
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientMessage {
    /// Open a subscription
    Req {
        /// Subscription id, unique per connection
        subscription_id: String,
        /// Filter for the subscription
        filter: Filter,
    },
    /// Close a subscription
    Close {
        /// Subscription id
        subscription_id: String,
    },
}

impl ClientMessage {
    /// Wire form of the frame
    pub fn to_json(&self) -> Result<String> {
        let value = match self {
            Self::Req {
                subscription_id,
                filter,
            } => json!(["REQ", subscription_id, filter]),
            Self::Close { subscription_id } => json!(["CLOSE", subscription_id]),
        };
        serde_json::to_string(&value).map_err(|e| RelayError::Protocol(e.to_string()))
    }
}

/// Frames received from the relay
#[derive(Clone, Debug)]
pub enum RelayMessage {
    /// A stored or live record matching a subscription
    Event {
        /// Subscription the record belongs to
        subscription_id: String,
        /// The record itself
        event: SignedEvent,
    },
    /// All stored records for the subscription have been delivered
    EndOfBacklog {
        /// Subscription id
        subscription_id: String,
    },
    /// Any other frame; carried only for logging
    Other {
        /// Leading verb of the frame
        verb: String,
    },
}

impl RelayMessage {
    /// Parse one incoming frame
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RelayError::Protocol(format!("not JSON: {e}")))?;
        let items = value
            .as_array()
            .ok_or_else(|| RelayError::Protocol("frame is not an array".into()))?;
        let verb = items
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| RelayError::Protocol("frame has no verb".into()))?;

        match verb {
            "EVENT" => {
                if items.len() < 3 {
                    return Err(RelayError::Protocol("EVENT frame too short".into()));
                }
                let subscription_id = items[1]
                    .as_str()
                    .ok_or_else(|| RelayError::Protocol("EVENT subscription id".into()))?
                    .to_string();
                let event: SignedEvent = serde_json::from_value(items[2].clone())
                    .map_err(|e| RelayError::Protocol(format!("malformed event: {e}")))?;
                Ok(Self::Event {
                    subscription_id,
                    event,
                })
            }
            "EOSE" => {
                let subscription_id = items
                    .get(1)
                    .and_then(Value::as_str)
                    .ok_or_else(|| RelayError::Protocol("EOSE subscription id".into()))?
                    .to_string();
                Ok(Self::EndOfBacklog { subscription_id })
            }
            other => Ok(Self::Other {
                verb: other.to_string(),
            }),
        }
    }
}
