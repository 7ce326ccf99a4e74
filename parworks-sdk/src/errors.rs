//! Unified error types for the `parworks` crate.
//!
//! Every platform call fails with one [`Error`], whatever form (blocking,
//! future or listener) it was made in. Variants follow the stage that failed:
//! encoding the query, moving bytes, the HTTP status, or the platform's own
//! `success` flag. Construction of a [`crate::Client`] fails with a separate
//! [`BuildError`].
//!
//! No message produced here contains the api key, salt or signature.

use parworks_common::query::EncodingError;
use reqwest::StatusCode;
use thiserror::Error;

/// Boxed source error for transport and protocol failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// --- Build-Time Error ---

/// Errors that can occur while building a [`crate::Client`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to build the HTTP client (reqwest configuration).
    #[error("Failed to build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to start the worker threads that run asynchronous calls.
    #[error("Failed to start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// The configured base URL is not an absolute URL.
    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

// --- The Main Operational Error Enum ---

/// The crate's top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Building the client failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// I/O error, aborted connection, DNS or TLS failure, or an elapsed deadline.
    #[error("The HTTP connection was aborted or a problem occurred: {0}")]
    Transport(#[source] BoxError),

    /// The server's response was malformed.
    #[error("The HTTP response from the server was invalid: {0}")]
    Protocol(#[source] BoxError),

    /// The server answered 400.
    #[error(
        "The server responded with 400 bad request. There was probably a problem with the input parameters."
    )]
    BadRequest,

    /// The server answered 401.
    #[error(
        "The server responded with 401 authentication failed. The credentials were incorrect."
    )]
    Unauthorized,

    /// The server answered 404.
    #[error(
        "The server responded with 404 problem accessing path. There was an error in the path."
    )]
    PathNotFound,

    /// Any other status outside `200..=226`.
    #[error("The server responded with status code: {}", .0.as_u16())]
    HttpStatus(StatusCode),

    /// The exchange succeeded but the platform reported `success: false`.
    #[error("{0}")]
    Domain(String),

    /// A query parameter could not be encoded. Nothing was sent.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// A caller-supplied argument was rejected before anything was sent.
    #[error("Invalid argument: {message}")]
    Validation {
        /// What was wrong with the argument.
        message: String,
    },
}

/// Fieldless mirror of [`Error`]'s variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Build`].
    Build,
    /// See [`Error::Transport`].
    Transport,
    /// See [`Error::Protocol`].
    Protocol,
    /// See [`Error::BadRequest`].
    BadRequest,
    /// See [`Error::Unauthorized`].
    Unauthorized,
    /// See [`Error::PathNotFound`].
    PathNotFound,
    /// See [`Error::HttpStatus`].
    HttpStatus,
    /// See [`Error::Domain`].
    Domain,
    /// See [`Error::Encoding`].
    Encoding,
    /// See [`Error::Validation`].
    Validation,
}

impl Error {
    /// Which stage failed.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Build(_) => ErrorKind::Build,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::BadRequest => ErrorKind::BadRequest,
            Error::Unauthorized => ErrorKind::Unauthorized,
            Error::PathNotFound => ErrorKind::PathNotFound,
            Error::HttpStatus(_) => ErrorKind::HttpStatus,
            Error::Domain(_) => ErrorKind::Domain,
            Error::Encoding(_) => ErrorKind::Encoding,
            Error::Validation { .. } => ErrorKind::Validation,
        }
    }

    /// The HTTP status that caused this error, if it was caused by one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::BadRequest => Some(StatusCode::BAD_REQUEST),
            Error::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Error::PathNotFound => Some(StatusCode::NOT_FOUND),
            Error::HttpStatus(status) => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for `parworks` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Decoding, redirect and HTTP parse failures mean the server sent something
/// unusable; everything else reqwest reports happened while moving bytes.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_redirect() || is_malformed_response(&err) {
            Error::Protocol(Box::new(err))
        } else {
            Error::Transport(Box::new(err))
        }
    }
}

/// reqwest reports an unparsable response as a request or connect error, with
/// the underlying `hyper::Error` somewhere down the source chain.
fn is_malformed_response(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(hyper_err) = current.downcast_ref::<hyper::Error>() {
            return hyper_err.is_parse()
                || hyper_err.is_parse_status()
                || hyper_err.is_incomplete_message();
        }
        source = current.source();
    }
    false
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Protocol(Box::new(err))
    }
}
