use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parworks_common::{
    auth::{Credentials, SignatureEncoding},
    constants::DEFAULT_BASE_URL,
    query::QueryStyle,
};
use tokio::runtime::{Handle, Runtime};
use url::Url;

use crate::errors::BuildError;

const DEFAULT_WORKER_THREADS: usize = 2;

#[derive(Debug, Clone)]
#[must_use]
/// Configures a [`Client`] before construction.
///
/// Most code obtains this via [`Client::builder()`], which simply returns
/// `ClientBuilder::default()`.
///
/// # Defaults
/// - Base URL: [`crate::DEFAULT_BASE_URL`]
/// - HTTP request timeout: none, unless set via [`Self::request_timeout`]
///   or per call via [`crate::Call::timeout`]
/// - Worker threads for asynchronous calls: 2
/// - Query style: [`QueryStyle::Compatible`]
/// - Signature encoding: [`SignatureEncoding::Base64`]
/// - User-agent: none. A request carries `apikey`, `salt` and `signature`, plus
///   the `accept: */*` reqwest always sends and the `host` HTTP/1.1 requires.
///   POST requests also carry `content-length`, and `content-type` when they
///   have a multipart body
/// - Redirects: never followed, so a 3xx fails with [`crate::Error::HttpStatus`]
///   and the auth headers never reach another host
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// # use parworks::Client;
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .request_timeout(Duration::from_secs(10))
///     .build()?;
/// # Ok::<_, parworks::BuildError>(())
/// ```
pub struct ClientBuilder {
    base_url: String,
    http_request_timeout: Option<Duration>,
    http_connect_timeout: Option<Duration>,
    worker_threads: usize,
    query_style: QueryStyle,
    signature_encoding: SignatureEncoding,
    user_agent: Option<String>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_request_timeout: None,
            http_connect_timeout: None,
            worker_threads: DEFAULT_WORKER_THREADS,
            query_style: QueryStyle::default(),
            signature_encoding: SignatureEncoding::default(),
            user_agent: None,
        }
    }
}

impl ClientBuilder {
    /// Set the platform's base URL.
    pub fn base_url<S: Into<String>>(&mut self, base_url: S) -> &mut Self {
        self.base_url = base_url.into();

        self
    }

    /// Set HTTP requests timeout. Elapsed deadlines fail with [`crate::Error::Transport`].
    pub fn request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.http_request_timeout = Some(timeout);

        self
    }

    /// Set the TCP connect timeout.
    pub fn connect_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.http_connect_timeout = Some(timeout);

        self
    }

    /// Number of worker threads that run asynchronous calls. Clamped to at least 1.
    pub fn worker_threads(&mut self, threads: usize) -> &mut Self {
        self.worker_threads = threads.max(1);

        self
    }

    /// Shape of emitted query strings.
    pub fn query_style(&mut self, style: QueryStyle) -> &mut Self {
        self.query_style = style;

        self
    }

    /// Text encoding of signatures computed for handles built on this client.
    pub fn signature_encoding(&mut self, encoding: SignatureEncoding) -> &mut Self {
        self.signature_encoding = encoding;

        self
    }

    /// Send a `User-Agent` header with every request.
    pub fn user_agent<S: Into<String>>(&mut self, user_agent: S) -> &mut Self {
        self.user_agent = Some(user_agent.into());

        self
    }

    /// Build [Client]
    pub fn build(&self) -> Result<Client, BuildError> {
        let base_url = Url::parse(&self.base_url)?;

        let mut http_builder =
            reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());

        if let Some(timeout) = self.http_request_timeout {
            http_builder = http_builder.timeout(timeout);
        }
        if let Some(timeout) = self.http_connect_timeout {
            http_builder = http_builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent.as_deref().map(str::trim) {
            if !user_agent.is_empty() {
                http_builder = http_builder.user_agent(user_agent);
            }
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.worker_threads)
            .thread_name("parworks-worker")
            .enable_all()
            .build()?;

        Ok(Client {
            http: http_builder.build()?,
            executor: Arc::new(Executor::new(runtime)),
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            query_style: self.query_style,
            signature_encoding: self.signature_encoding,
        })
    }
}

/// Transport client for the ParWorks AR platform.
///
/// `Client` is the low-level, credential-free engine that [`crate::ArSites`] and
/// [`crate::ArSite`] handles are built on. It owns:
/// - One reqwest HTTP client with its connection pool, shared by every call.
/// - A small multi-threaded runtime that runs asynchronous calls off the
///   caller's thread and drives blocking calls.
/// - The base URL and wire-format settings.
///
/// Clones are cheap and share all of the above.
///
/// ### Construction
/// Use [`Client::builder()`] to tweak the base URL or timeouts, or pick the
/// defaults via [`Client::new()`].
///
/// ```no_run
/// # use parworks::Client;
/// let client = Client::new()?;
/// let sites = client.sites("my-api-key", "my-secret-key");
/// # Ok::<_, parworks::BuildError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    pub(crate) http: reqwest::Client,
    pub(crate) executor: Arc<Executor>,
    pub(crate) base_url: String,
    pub(crate) query_style: QueryStyle,
    pub(crate) signature_encoding: SignatureEncoding,
}

impl Client {
    /// Creates a client for the default deployment.
    pub fn new() -> Result<Client, BuildError> {
        Self::builder().build()
    }

    /// Returns a builder to edit settings before creating [`Client`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Sign a fresh credential triple using this client's signature encoding.
    pub fn credentials(
        &self,
        api_key: impl Into<String>,
        secret_key: impl AsRef<[u8]>,
    ) -> Credentials {
        Credentials::with_encoding(api_key, secret_key, self.signature_encoding)
    }

    /// A site collection handle authenticated with a fresh credential triple.
    pub fn sites(
        &self,
        api_key: impl Into<String>,
        secret_key: impl AsRef<[u8]>,
    ) -> crate::ArSites {
        crate::ArSites::with_credentials(self.clone(), self.credentials(api_key, secret_key))
    }

    // === Getters ===

    /// The base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shape of emitted query strings.
    pub fn query_style(&self) -> QueryStyle {
        self.query_style
    }

    /// Text encoding of signatures.
    pub fn signature_encoding(&self) -> SignatureEncoding {
        self.signature_encoding
    }
}

/// The runtime behind asynchronous calls.
///
/// Shut down in the background on drop, so the last clone of a [`Client`] may
/// be dropped from inside another async runtime.
pub(crate) struct Executor {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl Executor {
    fn new(runtime: Runtime) -> Self {
        Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        }
    }

    /// Run `future` to completion on the current thread.
    ///
    /// # Panics
    /// When called from within an asynchronous execution context.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }

    /// Run `future` on a worker thread.
    pub(crate) fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        drop(self.handle.spawn(future));
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("runtime", &self.handle.runtime_flavor())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let client = Client::new().unwrap();
        assert_eq!(client.base_url(), "http://dev.parworksapi.com");
        assert_eq!(client.query_style(), QueryStyle::Compatible);
        assert_eq!(client.signature_encoding(), SignatureEncoding::Base64);
    }

    #[test]
    fn base_url_is_validated_and_trimmed() {
        let client = Client::builder()
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");

        let err = Client::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, BuildError::BaseUrl(_)));
    }

    #[test]
    fn credentials_follow_the_configured_encoding() {
        let client = Client::builder()
            .signature_encoding(SignatureEncoding::Hex)
            .build()
            .unwrap();
        let creds = client.credentials("K", "S");
        assert_eq!(creds.signature().len(), 64);
        assert!(creds.signature().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn dropping_inside_async_context_does_not_panic() {
        let client = Client::new().unwrap();
        drop(client);
    }
}
