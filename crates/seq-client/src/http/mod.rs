//! The HTTP client facade for Seq.
//!
//! [`SeqClient`] executes generic verbs (GET, POST, PUT, DELETE) against
//! linked resources, decoding JSON responses into caller types, and opens
//! live WebSocket streams through the same link resolution path. Failure
//! statuses become [`Error::Api`](crate::Error::Api) values carrying the
//! server's own error message when the body provides one.

mod client;
mod root;
mod transport;

pub use client::{API_KEY_HEADER, API_MEDIA_TYPE, SeqClient, SeqClientBuilder};
pub use root::RootDocument;
