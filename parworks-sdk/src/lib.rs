#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(any(), deny(clippy::unwrap_used))]

mod client;
pub mod errors;
mod global;
mod invoker;
pub mod payloads;
mod response;
mod site;
mod sites;
mod util;

pub mod prelude;

// --- PUBLIC API EXPORTS ---
// Transport
pub use client::core::{Client, ClientBuilder};
// Facade
pub use site::{ArSite, NewOverlay};
pub use sites::{ArSites, NewSite};
// Call pipeline
pub use invoker::{ArListener, Call, FnListener, Invoker, PendingCall, listener};
pub use response::{ArResponse, Extractor, Payload, RawResponse, json_extractor};
pub use util::classify_status;

// Error and global client
pub use errors::{BoxError, BuildError, Error, ErrorKind, Result};
pub use global::{drop_global_client, global_client, set_global_client};

// Re-exports
pub use parworks_common::{
    self,
    auth::{Credentials, SignatureEncoding},
    constants::DEFAULT_BASE_URL,
    query::{EncodingError, ParamValue, QueryParams, QueryStyle},
};
pub use reqwest::{Method, StatusCode};
