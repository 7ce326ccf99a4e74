//! Client-server authentication using a signed construction timestamp.
//!
//! A [`Credentials`] triple is derived once, when a client handle is built:
//! the timestamp is the wall clock in milliseconds and the signature is
//! `HMAC-SHA256(key = secret, message = timestamp)`. The same triple is then
//! sent as the `apikey`, `salt` and `signature` headers of every request the
//! handle makes. Nothing is re-derived per call.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::headers;

type HmacSha256 = Hmac<Sha256>;

/// Text representation of the signature bytes on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureEncoding {
    /// Standard, padded base64. What the platform expects.
    #[default]
    Base64,
    /// Lowercase hex.
    Hex,
}

/// Compute `HMAC-SHA256(secret, message)` and encode it as text.
pub fn sign(secret: &[u8], message: &[u8], encoding: SignatureEncoding) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(message);
    let digest = mac.finalize().into_bytes();

    match encoding {
        SignatureEncoding::Base64 => base64::engine::general_purpose::STANDARD.encode(digest),
        SignatureEncoding::Hex => hex::encode(digest),
    }
}

/// The immutable `(apikey, salt, signature)` triple of one client handle.
///
/// Two triples built from the same key pair within the same millisecond are
/// equal; built at different milliseconds, their timestamps and signatures
/// differ.
///
/// The signature never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    issued_at: u64,
    timestamp: String,
    signature: String,
}

impl Credentials {
    /// Sign the current wall-clock time with `secret_key`.
    pub fn new(api_key: impl Into<String>, secret_key: impl AsRef<[u8]>) -> Self {
        Self::with_encoding(api_key, secret_key, SignatureEncoding::default())
    }

    /// Like [`Credentials::new`] with an explicit signature encoding.
    pub fn with_encoding(
        api_key: impl Into<String>,
        secret_key: impl AsRef<[u8]>,
        encoding: SignatureEncoding,
    ) -> Self {
        Self::at(api_key, secret_key, now_millis(), encoding)
    }

    /// Sign a given timestamp, in milliseconds since the Unix epoch.
    pub fn at(
        api_key: impl Into<String>,
        secret_key: impl AsRef<[u8]>,
        issued_at_millis: u64,
        encoding: SignatureEncoding,
    ) -> Self {
        let timestamp = issued_at_millis.to_string();
        let signature = sign(secret_key.as_ref(), timestamp.as_bytes(), encoding);

        Self {
            api_key: api_key.into(),
            issued_at: issued_at_millis,
            timestamp,
            signature,
        }
    }

    // === Getters ===

    /// The API key, sent as the `apikey` header.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Decimal milliseconds since the epoch, sent as the `salt` header.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The signing instant in milliseconds since the epoch.
    pub fn issued_at_millis(&self) -> u64 {
        self.issued_at
    }

    /// The encoded signature, sent as the `signature` header.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Time elapsed since the triple was signed.
    ///
    /// The platform's freshness window is not published; hosts holding a
    /// handle for a long time can use this to decide when to build a new one.
    pub fn age(&self) -> Duration {
        Duration::from_millis(now_millis().saturating_sub(self.issued_at))
    }

    /// The three authentication headers, in wire order.
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            (headers::API_KEY, self.api_key.as_str()),
            (headers::SALT, self.timestamp.as_str()),
            (headers::SIGNATURE, self.signature.as_str()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("timestamp", &self.timestamp)
            .field("signature", &"<redacted>")
            .finish()
    }
}

fn now_millis() -> u64 {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc4231_test_case_2() {
        let secret = b"Jefe";
        let message = b"what do ya want for nothing?";

        assert_eq!(
            sign(secret, message, SignatureEncoding::Hex),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        assert_eq!(
            sign(secret, message, SignatureEncoding::Base64),
            "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM="
        );
    }

    #[test]
    fn signs_the_timestamp_with_a_32_byte_secret() {
        let secret: Vec<u8> = (0u8..32).collect();
        let creds = Credentials::at("K", &secret, 1_700_000_000_123, SignatureEncoding::Hex);

        assert_eq!(creds.timestamp(), "1700000000123");
        assert_eq!(
            creds.signature(),
            "9e4ff0493a0c6b359e574f8edd58a3d484cdd34c1567e9af7fe3f6b10fea07b0"
        );
    }

    #[test]
    fn default_encoding_is_base64() {
        let creds = Credentials::at("K", "S", 1_355_270_400_000, SignatureEncoding::default());

        assert_eq!(creds.api_key(), "K");
        assert_eq!(creds.timestamp(), "1355270400000");
        assert_eq!(
            creds.signature(),
            "P0Zvo3IbAz8SOrXp/Cobdo8Z1bfEP43gZ+4DHLV3igs="
        );
    }

    #[test]
    fn same_millisecond_same_triple() {
        let a = Credentials::at("K", "S", 42, SignatureEncoding::Base64);
        let b = Credentials::at("K", "S", 42, SignatureEncoding::Base64);
        assert_eq!(a, b);

        let later = Credentials::at("K", "S", 43, SignatureEncoding::Base64);
        assert_ne!(a, later);
        assert_ne!(a.signature(), later.signature());
    }

    #[test]
    fn headers_are_in_wire_order() {
        let creds = Credentials::at("K", "S", 7, SignatureEncoding::Hex);
        let names: Vec<&str> = creds.headers().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["apikey", "salt", "signature"]);
        assert_eq!(creds.headers()[1].1, "7");
    }

    #[test]
    fn debug_redacts_signature() {
        let creds = Credentials::at("K", "S", 7, SignatureEncoding::Hex);
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains(creds.signature()));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn new_stamps_the_current_time() {
        let creds = Credentials::new("K", "S");
        assert!(creds.issued_at_millis() > 1_600_000_000_000);
        assert!(creds.age() < Duration::from_secs(60));
    }
}
