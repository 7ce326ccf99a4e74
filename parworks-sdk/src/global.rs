//! Process-wide, resettable default [`Client`].
//!
//! Lets one-liners like [`crate::ArSites::new`] work without threading a
//! `Client` through the application, while still sharing one connection pool
//! and one worker runtime between every handle built that way.
//!
//! - Backing storage is an `ArcSwapOption<Client>` inside a `OnceLock`; reads
//!   are a single atomic load and return a cheap clone.
//! - Replacing or clearing the global never invalidates handles already built
//!   on the previous client.
//! - Concurrent first use may build more than one client; the last one stored
//!   wins and the others are dropped.
//!
//! Tests that need a specific base URL inject a client with
//! [`set_global_client`] or, better, pass it explicitly to [`Client::sites`].
//!
//! ```no_run
//! # use parworks::{Client, global_client, set_global_client, drop_global_client};
//! let custom = Client::builder().base_url("http://localhost:8080").build()?;
//! set_global_client(custom);
//! assert_eq!(global_client()?.base_url(), "http://localhost:8080");
//!
//! drop_global_client();
//! let fresh = global_client()?; // rebuilt on demand
//! # Ok::<(), parworks::BuildError>(())
//! ```

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::OnceLock;

use crate::{BuildError, Client};

static GLOBAL_CLIENT: OnceLock<ArcSwapOption<Client>> = OnceLock::new();

#[inline]
fn slot() -> &'static ArcSwapOption<Client> {
    GLOBAL_CLIENT.get_or_init(|| ArcSwapOption::from(None))
}

/// Get-or-init the process-wide default client.
///
/// Built with [`Client::new`] on first use.
pub fn global_client() -> Result<Client, BuildError> {
    if let Some(current) = slot().load_full() {
        return Ok(current.as_ref().clone());
    }

    let fresh = Client::new()?;
    slot().store(Some(Arc::new(fresh.clone())));
    tracing::debug!(base_url = fresh.base_url(), "initialized global client");
    Ok(fresh)
}

/// Replace the global default client.
pub fn set_global_client(client: Client) {
    slot().store(Some(Arc::new(client)));
}

/// Clear the global default client. The next [`global_client`] builds a fresh one.
pub fn drop_global_client() {
    slot().store(None);
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test touches the global slot, so parallel tests cannot race on it.
    #[test]
    fn set_get_and_drop() {
        let custom = Client::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        set_global_client(custom);
        assert_eq!(global_client().unwrap().base_url(), "http://127.0.0.1:9");

        drop_global_client();
        assert_eq!(global_client().unwrap().base_url(), "http://dev.parworksapi.com");

        drop_global_client();
    }
}
