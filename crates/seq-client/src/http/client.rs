//! The Seq client and its builder.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::cookie::Jar;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::root::RootDocument;
use super::transport;
use crate::error::{Error, Result};
use crate::links::{self, Linked, Parameters};
use crate::stream::{self, MessageStream};

/// Header carrying the Seq API key.
pub const API_KEY_HEADER: &str = "X-Seq-ApiKey";

/// Versioned media type requested from the server.
pub const API_MEDIA_TYPE: &str = "application/vnd.datalust.seq.v9+json";

/// Builder for configuring a [`SeqClient`].
pub struct SeqClientBuilder {
    server_url: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: String,
}

impl SeqClientBuilder {
    /// Create a new builder for the given server URL.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: None,
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: format!("seq-client/{} (Rust)", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Authenticate with an API key.
    ///
    /// The key is sent in the `X-Seq-ApiKey` header on every request,
    /// including WebSocket handshakes.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<SeqClient> {
        // Relative hrefs join under the base URL, so it must end with `/`.
        let mut server_url = self.server_url;
        if !server_url.ends_with('/') {
            server_url.push('/');
        }
        let base_url = Url::parse(&server_url)?;

        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::ACCEPT,
            http::HeaderValue::from_static(API_MEDIA_TYPE),
        );
        if let Some(ref key) = self.api_key {
            let name = http::HeaderName::try_from(API_KEY_HEADER)?;
            let value = http::HeaderValue::try_from(key.as_str())?;
            headers.insert(name, value);
        }

        let cookies = Arc::new(Jar::default());

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(self.user_agent.as_str())
            .cookie_provider(cookies.clone());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        let http = builder.build()?;

        Ok(SeqClient {
            inner: Arc::new(SeqClientInner {
                http,
                cookies,
                base_url,
                api_key: self.api_key,
            }),
        })
    }
}

/// Internal state shared by clones of the client.
struct SeqClientInner {
    http: reqwest::Client,
    cookies: Arc<Jar>,
    base_url: Url,
    api_key: Option<String>,
}

/// A hypermedia client for a Seq server.
///
/// Every operation resolves a named link on an entity first and only then
/// touches the network, so the set of reachable resources is exactly what
/// the server advertises. The client is cheaply cloneable; clones share
/// the connection pool and cookie jar.
///
/// # Example
///
/// ```ignore
/// use seq_client::SeqClient;
///
/// let client = SeqClient::builder("https://seq.example.com")
///     .api_key("my-api-key")
///     .build()?;
///
/// let root = client.root().await?;
/// let signals: Vec<Signal> = client.list(&root, "Signals", None).await?;
/// ```
#[derive(Clone)]
pub struct SeqClient {
    inner: Arc<SeqClientInner>,
}

impl SeqClient {
    /// Create a builder for the given server URL.
    pub fn builder(server_url: impl Into<String>) -> SeqClientBuilder {
        SeqClientBuilder::new(server_url)
    }

    /// The normalized server base URL.
    pub fn server_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Fetch the root API document.
    ///
    /// The root's link table is the entry point for all navigation.
    pub async fn root(&self) -> Result<RootDocument> {
        let url = self.inner.base_url.join("api")?;
        let response = transport::send_request(&self.inner.http, Method::GET, url, None).await?;
        transport::read_json(response).await
    }

    /// Resolve a named link on an entity into an absolute URL.
    ///
    /// The entity's href may be relative (joined against the server base
    /// URL) or absolute.
    pub fn resolve_link<E: Linked>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
    ) -> Result<Url> {
        let href = links::resolve_link(entity, link, parameters)?;
        Ok(self.inner.base_url.join(&href)?)
    }

    /// GET the linked resource and decode it as JSON.
    pub async fn get<T, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        E: Linked,
    {
        let response = self
            .send(Method::GET, entity, link, parameters, None::<&()>)
            .await?;
        transport::read_json(response).await
    }

    /// GET the linked resource as a raw string.
    pub async fn get_string<E: Linked>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
    ) -> Result<String> {
        let response = self
            .send(Method::GET, entity, link, parameters, None::<&()>)
            .await?;
        transport::read_text(response).await
    }

    /// GET a collection of resources.
    pub async fn list<T, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        E: Linked,
    {
        self.get(entity, link, parameters).await
    }

    /// POST a JSON body to the linked resource, discarding the response
    /// body.
    pub async fn post<B, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
        body: &B,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
        E: Linked,
    {
        self.send(Method::POST, entity, link, parameters, Some(body))
            .await?;
        Ok(())
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_returning<T, B, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
        body: &B,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
        E: Linked,
    {
        let response = self
            .send(Method::POST, entity, link, parameters, Some(body))
            .await?;
        transport::read_json(response).await
    }

    /// POST a JSON body and read the response as a raw string.
    pub async fn post_read_string<B, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
        body: &B,
    ) -> Result<String>
    where
        B: Serialize + ?Sized,
        E: Linked,
    {
        let response = self
            .send(Method::POST, entity, link, parameters, Some(body))
            .await?;
        transport::read_text(response).await
    }

    /// PUT a JSON body to the linked resource.
    pub async fn put<B, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
        body: &B,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
        E: Linked,
    {
        self.send(Method::PUT, entity, link, parameters, Some(body))
            .await?;
        Ok(())
    }

    /// DELETE the linked resource, sending the entity as the JSON body.
    pub async fn delete<B, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
        body: &B,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
        E: Linked,
    {
        self.send(Method::DELETE, entity, link, parameters, Some(body))
            .await?;
        Ok(())
    }

    /// DELETE the linked resource and decode the JSON response.
    pub async fn delete_returning<T, B, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
        body: &B,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
        E: Linked,
    {
        let response = self
            .send(Method::DELETE, entity, link, parameters, Some(body))
            .await?;
        transport::read_json(response).await
    }

    /// Open a WebSocket stream on the linked resource, applying `decode`
    /// to each text frame.
    ///
    /// The link resolves the same way as for plain requests; the resulting
    /// URL's scheme is swapped to `ws`/`wss` and cookies plus the API key
    /// are carried on the handshake.
    pub async fn stream<T, D, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
        decode: D,
    ) -> Result<MessageStream<T>>
    where
        T: Send + 'static,
        D: Fn(&str) -> Result<T> + Send + 'static,
        E: Linked,
    {
        let url = self.resolve_link(entity, link, parameters)?;
        stream::connect(url, self.inner.api_key.as_deref(), &self.inner.cookies, decode).await
    }

    /// Open a WebSocket stream decoding each text frame as JSON.
    pub async fn stream_json<T, E>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
    ) -> Result<MessageStream<T>>
    where
        T: DeserializeOwned + Send + 'static,
        E: Linked,
    {
        self.stream(entity, link, parameters, |text| {
            serde_json::from_str(text).map_err(Error::from)
        })
        .await
    }

    /// Open a WebSocket stream yielding raw text frames.
    pub async fn stream_text<E: Linked>(
        &self,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
    ) -> Result<MessageStream<String>> {
        self.stream(entity, link, parameters, |text| Ok(text.to_string()))
            .await
    }

    async fn send<B, E>(
        &self,
        method: Method,
        entity: &E,
        link: &str,
        parameters: Option<&Parameters>,
        body: Option<&B>,
    ) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
        E: Linked,
    {
        let url = self.resolve_link(entity, link, parameters)?;
        let body = match body {
            Some(body) => Some(serde_json::to_string(body)?),
            None => None,
        };
        transport::send_request(&self.inner.http, method, url, body).await
    }
}

impl std::fmt::Debug for SeqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeqClient")
            .field("server_url", &self.inner.base_url.as_str())
            .field("has_api_key", &self.inner.api_key.is_some())
            .finish()
    }
}
