//! Raw responses and the lazily decoding [`ArResponse`] envelope.

use std::fmt;
use std::sync::OnceLock;

use bytes::Bytes;
use reqwest::{StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use url::Url;

use crate::errors::{Error, Result};

/// A fully read HTTP response whose status was already classified as success.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Bytes,
}

impl RawResponse {
    /// Assemble a response from its parts.
    pub fn from_parts(
        status: StatusCode,
        headers: HeaderMap,
        url: Url,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            status,
            headers,
            url,
            body: body.into(),
        }
    }

    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;

        Ok(Self {
            status,
            headers,
            url,
            body,
        })
    }

    /// HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The URL that was requested, query string included.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Body bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text. Fails with [`Error::Protocol`] otherwise.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.body).map_err(|e| Error::Protocol(Box::new(e)))
    }

    /// Body deserialized from JSON. Fails with [`Error::Protocol`] otherwise.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Converts a raw response into a typed payload.
pub type Extractor<T> = Box<dyn Fn(&RawResponse) -> Result<T> + Send + Sync>;

/// A successful response paired with the function that decodes it.
///
/// Decoding is deferred until [`ArResponse::decoded`] or
/// [`ArResponse::into_decoded`] is called, and may itself fail, typically with
/// [`Error::Domain`] when the platform answered `success: false`. A successful
/// decode is cached; a failed one is retried on the next call.
pub struct ArResponse<T> {
    raw: RawResponse,
    extract: Extractor<T>,
    decoded: OnceLock<T>,
}

impl<T> ArResponse<T> {
    /// Pair `raw` with `extract`.
    pub fn new(raw: RawResponse, extract: Extractor<T>) -> Self {
        Self {
            raw,
            extract,
            decoded: OnceLock::new(),
        }
    }

    /// The transport response.
    pub fn raw_response(&self) -> &RawResponse {
        &self.raw
    }

    /// Decode the payload, or return the cached value.
    pub fn decoded(&self) -> Result<&T> {
        if let Some(value) = self.decoded.get() {
            return Ok(value);
        }
        let value = (self.extract)(&self.raw)?;
        Ok(self.decoded.get_or_init(|| value))
    }

    /// Decode the payload, consuming the envelope.
    pub fn into_decoded(self) -> Result<T> {
        match self.decoded.into_inner() {
            Some(value) => Ok(value),
            None => (self.extract)(&self.raw),
        }
    }

    /// Give up the decoder and keep the transport response.
    pub fn into_raw(self) -> RawResponse {
        self.raw
    }
}

impl<T: fmt::Debug> fmt::Debug for ArResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArResponse")
            .field("raw", &self.raw)
            .field("decoded", &self.decoded.get())
            .finish_non_exhaustive()
    }
}

/// A platform response body with a `success` flag.
pub trait Payload: DeserializeOwned {
    /// Whether the platform reported success.
    fn success(&self) -> bool;
}

/// Build an extractor that parses a [`Payload`], turns `success: false` into
/// [`Error::Domain`] carrying `failure`, and hands successful payloads to `map`.
pub fn json_extractor<P, T, F>(failure: &'static str, map: F) -> Extractor<T>
where
    P: Payload,
    F: Fn(P) -> Result<T> + Send + Sync + 'static,
{
    Box::new(move |raw: &RawResponse| {
        let payload: P = raw.json()?;
        if !payload.success() {
            return Err(Error::Domain(failure.to_string()));
        }
        map(payload)
    })
}
