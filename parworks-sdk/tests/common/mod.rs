#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use httpmock::MockServer;
use parworks::{ArSites, Client, Credentials};

pub const API_KEY: &str = "K";
pub const SECRET: &str = "S";

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn client_for(base_url: &str) -> Client {
    init_tracing();
    Client::builder()
        .base_url(base_url)
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

pub fn sites_for(server: &MockServer) -> ArSites {
    let client = client_for(&server.base_url());
    ArSites::with_credentials(client, Credentials::new(API_KEY, SECRET))
}
