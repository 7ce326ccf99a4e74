use std::time::Duration;

use parworks_common::auth::Credentials;
use reqwest::{Method, RequestBuilder, multipart::Form};

use crate::{Client, Result, response::RawResponse, util::classify_status};

impl Client {
    /// Start building a request carrying the `apikey`, `salt` and `signature`
    /// headers of `credentials`, and nothing else.
    ///
    /// `url` is used verbatim; see [`parworks_common::query::build_url`] to
    /// compose one from the base URL, a path and query parameters.
    pub fn request(&self, credentials: &Credentials, method: Method, url: &str) -> RequestBuilder {
        credentials
            .headers()
            .into_iter()
            .fold(self.http.request(method, url), |rb, (name, value)| {
                rb.header(name, value)
            })
    }

    /// Send one request and read the whole response.
    ///
    /// A single attempt is made. The status is classified before the body is
    /// read, so error bodies are never buffered. The connection goes back to
    /// the pool (or is closed) on every path.
    pub(crate) async fn dispatch(
        &self,
        credentials: &Credentials,
        method: Method,
        url: &str,
        body: Option<Form>,
        timeout: Option<Duration>,
    ) -> Result<RawResponse> {
        let mut rb = self.request(credentials, method, url);
        if let Some(form) = body {
            rb = rb.multipart(form);
        }
        if let Some(timeout) = timeout {
            rb = rb.timeout(timeout);
        }

        let response = rb.send().await?;
        tracing::debug!(
            status = %response.status(),
            path = response.url().path(),
            "received response"
        );

        classify_status(response.status())?;
        RawResponse::read(response).await
    }
}
