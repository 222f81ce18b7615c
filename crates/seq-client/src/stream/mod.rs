//! Live streaming over WebSocket.
//!
//! A stream is opened from a hypermedia link on an entity and yields
//! decoded messages in arrival order until the server closes it or the
//! consumer stops it. See [`crate::http::SeqClient::stream`].

mod channel;
mod handshake;

pub use channel::{MessageStream, StreamHandle};

pub(crate) use channel::connect;
