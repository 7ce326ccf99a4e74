//! One pipeline, three ways to call it.
//!
//! Every platform call is a [`Call`]: a method, a path, query parameters, an
//! optional multipart body and an extractor. An [`Invoker`] runs it through
//! URL composition, dispatch, status classification and envelope
//! construction, in that order, and exposes the result:
//!
//! - [`Invoker::call_blocking`] on the caller's thread, returning the decoded value;
//! - [`Invoker::call_async`] on a worker thread, returning a [`PendingCall`] future;
//! - [`Invoker::call_with_listener`] on a worker thread, reporting to an [`ArListener`].
//!
//! Calls are never retried and share nothing mutable; each gets its own
//! request and envelope.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use parworks_common::auth::Credentials;
use parworks_common::query::{ParamValue, QueryParams, build_url};
use reqwest::{Method, multipart::Form};
use tokio::sync::oneshot;

use crate::{
    Client,
    errors::{Error, Result},
    response::{ArResponse, Extractor, RawResponse},
};

/// Everything needed to make one platform call.
pub struct Call<T> {
    method: Method,
    path: String,
    params: QueryParams,
    body: Option<Form>,
    timeout: Option<Duration>,
    extract: Extractor<T>,
}

impl<T> Call<T> {
    /// A call to `path` whose successful responses are decoded by `extract`.
    pub fn new<F>(method: Method, path: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&RawResponse) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            method,
            path: path.into(),
            params: QueryParams::new(),
            body: None,
            timeout: None,
            extract: Box::new(extract),
        }
    }

    /// A `GET` call.
    pub fn get<F>(path: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&RawResponse) -> Result<T> + Send + Sync + 'static,
    {
        Self::new(Method::GET, path, extract)
    }

    /// A `POST` call.
    pub fn post<F>(path: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&RawResponse) -> Result<T> + Send + Sync + 'static,
    {
        Self::new(Method::POST, path, extract)
    }

    /// Set a query parameter; the last value set for a name wins.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Replace all query parameters.
    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Send `form` as a `multipart/form-data` body.
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(form);
        self
    }

    /// Fail with [`Error::Transport`] if the call takes longer than `timeout`.
    /// Overrides the client's request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The endpoint path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The query parameters.
    pub fn query(&self) -> &QueryParams {
        &self.params
    }
}

impl<T> fmt::Debug for Call<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("multipart", &self.body.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Receives the outcome of one asynchronous call.
///
/// Exactly one of the two methods is called, once, on a background thread. It
/// may run concurrently with the code that started the call. Blocking calls
/// such as [`crate::ArSite::info`] are allowed from inside either method.
pub trait ArListener<T>: Send + 'static {
    /// The call got a successful status. Decoding happens when the envelope is asked to.
    fn on_response(self, response: ArResponse<T>);

    /// The call failed before a response envelope could be built.
    fn on_error(self, error: Error);
}

/// Adapts a pair of closures into an [`ArListener`].
///
/// ```no_run
/// # fn ex(sites: parworks::ArSites) {
/// sites.get_existing_with_listener(
///     "my-site",
///     parworks::listener(
///         |response: parworks::ArResponse<parworks::ArSite>| {
///             println!("{:?}", response.decoded().map(|site| site.id().to_string()))
///         },
///         |error| eprintln!("{error}"),
///     ),
/// );
/// # }
/// ```
pub fn listener<T, S, E>(on_response: S, on_error: E) -> FnListener<S, E>
where
    S: FnOnce(ArResponse<T>) + Send + 'static,
    E: FnOnce(Error) + Send + 'static,
{
    FnListener {
        on_response,
        on_error,
    }
}

/// A closure pair acting as an [`ArListener`]. Built by [`listener`].
pub struct FnListener<S, E> {
    on_response: S,
    on_error: E,
}

impl<S, E> fmt::Debug for FnListener<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener").finish_non_exhaustive()
    }
}

impl<T, S, E> ArListener<T> for FnListener<S, E>
where
    S: FnOnce(ArResponse<T>) + Send + 'static,
    E: FnOnce(Error) + Send + 'static,
{
    fn on_response(self, response: ArResponse<T>) {
        (self.on_response)(response)
    }

    fn on_error(self, error: Error) {
        (self.on_error)(error)
    }
}

/// An asynchronous call running on a worker thread.
///
/// Await it for the [`ArResponse`], or [`PendingCall::wait`] from synchronous
/// code. Dropping it detaches the call; the request still completes.
#[must_use = "the outcome of the call is only observable through the PendingCall"]
pub struct PendingCall<T> {
    rx: oneshot::Receiver<Result<ArResponse<T>>>,
}

impl<T> PendingCall<T> {
    /// A call that already failed, without touching the network.
    pub(crate) fn failed(error: Error) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(error));
        Self { rx }
    }

    /// Block the current thread until the call completes.
    ///
    /// # Panics
    /// When called from within an asynchronous execution context.
    pub fn wait(self) -> Result<ArResponse<T>> {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|e| Err(Error::Transport(Box::new(e))))
    }
}

impl<T> Future for PendingCall<T> {
    type Output = Result<ArResponse<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|e| Err(Error::Transport(Box::new(e)))))
    }
}

impl<T> fmt::Debug for PendingCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall").finish_non_exhaustive()
    }
}

/// A [`Client`] bound to one credential triple: the handle every platform call
/// goes through.
///
/// Cheap to clone; clones share the client and the triple.
#[derive(Clone, Debug)]
pub struct Invoker {
    client: Client,
    credentials: Arc<Credentials>,
}

impl Invoker {
    /// Bind `credentials` to `client`.
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials: Arc::new(credentials),
        }
    }

    /// The transport client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The credential triple sent with every call.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Run `call` on the current thread and return its decoded payload.
    ///
    /// # Panics
    /// When called from within an asynchronous execution context; use
    /// [`Invoker::call_async`] there.
    pub fn call_blocking<T>(&self, call: Call<T>) -> Result<T> {
        let response = self
            .client
            .executor
            .block_on(execute(self.client.clone(), Arc::clone(&self.credentials), call))?;
        response.into_decoded()
    }

    /// Start `call` on a worker thread.
    pub fn call_async<T>(&self, call: Call<T>) -> PendingCall<T>
    where
        T: Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task = execute(self.client.clone(), Arc::clone(&self.credentials), call);
        self.client.executor.spawn(async move {
            let _ = tx.send(task.await);
        });
        PendingCall { rx }
    }

    /// Start `call` on a worker thread and report its outcome to `listener`.
    pub fn call_with_listener<T, L>(&self, call: Call<T>, listener: L)
    where
        T: Send + Sync + 'static,
        L: ArListener<T>,
    {
        let task = execute(self.client.clone(), Arc::clone(&self.credentials), call);
        self.client.executor.spawn(async move {
            let outcome = task.await;
            // Off the async workers, so the listener may make blocking calls.
            let delivered = tokio::task::spawn_blocking(move || match outcome {
                Ok(response) => listener.on_response(response),
                Err(error) => listener.on_error(error),
            });
            if let Err(e) = delivered.await {
                tracing::debug!("listener did not complete: {e}");
            }
        });
    }
}

/// Compose, dispatch, classify, wrap.
async fn execute<T>(
    client: Client,
    credentials: Arc<Credentials>,
    call: Call<T>,
) -> Result<ArResponse<T>> {
    let Call {
        method,
        path,
        params,
        body,
        timeout,
        extract,
    } = call;

    let url = build_url(client.base_url(), &path, &params, client.query_style())?;
    tracing::debug!(%method, %path, "dispatching call");

    let raw = client
        .dispatch(&credentials, method, &url, body, timeout)
        .await?;
    Ok(ArResponse::new(raw, extract))
}
