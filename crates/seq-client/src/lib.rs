//! Hypermedia client for the Seq HTTP API.
//!
//! This crate navigates a Seq server the way the server describes itself:
//!
//! - **Link resolution**: entities carry named links holding URI templates;
//!   resolution fills them from typed parameters without guessing paths
//! - **Typed verbs**: GET/POST/PUT/DELETE helpers that decode JSON into
//!   caller-chosen types and translate API failures into structured errors
//! - **Streaming**: live WebSocket feeds surfaced as an async sequence of
//!   decoded messages with cooperative, cross-task cancellation
//!
//! # Connecting
//!
//! Every session starts from the root document, which advertises the links
//! the rest of the API hangs off:
//!
//! ```ignore
//! use seq_client::{Parameters, SeqClient};
//!
//! let client = SeqClient::builder("https://seq.example.com")
//!     .api_key("my-api-key")
//!     .build()?;
//!
//! let root = client.root().await?;
//! let signals: Vec<Signal> = client.list(&root, "SignalsResources", None).await?;
//! ```
//!
//! # Parameters
//!
//! Templates are filled from a [`Parameters`] map; values keep their types
//! until render time:
//!
//! ```ignore
//! let params = Parameters::new()
//!     .with("count", 25)
//!     .with("shared", true);
//!
//! let events: Vec<Event> = client.list(&root, "EventsResources", Some(&params)).await?;
//! ```
//!
//! # Streaming
//!
//! Stream links open a WebSocket and yield messages until the server closes
//! the feed or the consumer stops it:
//!
//! ```ignore
//! let mut events = client
//!     .stream_json::<serde_json::Value, _>(&root, "EventsResources", None)
//!     .await?;
//!
//! let handle = events.handle();
//! while let Some(event) = events.next().await {
//!     println!("{:?}", event?);
//! }
//! ```

mod error;

pub mod http;
pub mod links;
pub mod stream;

pub use error::{Error, Result};

// Re-export commonly used types at the crate root
pub use http::{API_KEY_HEADER, API_MEDIA_TYPE, RootDocument, SeqClient, SeqClientBuilder};
pub use links::{
    Link, LinkCollection, Linked, ParameterValue, Parameters, UriTemplate, resolve_link,
};
pub use stream::{MessageStream, StreamHandle};
