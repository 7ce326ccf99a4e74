//! Query parameter sets and request URL composition.

use std::borrow::Cow;
use std::collections::BTreeMap;

use url::form_urlencoded;

/// A query parameter value that could not be represented as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Query parameter `{name}` cannot be encoded as UTF-8")]
pub struct EncodingError {
    /// Name of the offending parameter.
    pub name: String,
}

/// A query parameter value, as handed over by the host.
///
/// Rust strings are always UTF-8, but hosts embedding the SDK may pass text
/// in other shapes (UTF-16 code units from JVM or Windows strings, raw bytes
/// from platform strings). Those are validated when the URL is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// UTF-8 text.
    Utf8(String),
    /// UTF-16 code units, possibly containing unpaired surrogates.
    Utf16(Vec<u16>),
    /// Bytes that should hold UTF-8.
    Bytes(Vec<u8>),
}

impl ParamValue {
    /// The value as text, or `None` if it is not valid Unicode.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            ParamValue::Utf8(s) => Some(Cow::Borrowed(s)),
            ParamValue::Utf16(units) => String::from_utf16(units).ok().map(Cow::Owned),
            ParamValue::Bytes(bytes) => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Utf8(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Utf8(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Utf8(value.clone())
    }
}

/// Floats render with at least one fractional digit: `37.0`, `-122.0`.
impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Utf8(format!("{value:?}"))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Utf8(value.to_string())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Utf8(value.to_string())
    }
}

/// Parameter name to value. Inserting an existing name replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`QueryParams::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set `name` to `value`, returning the previous value if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(name.into(), value.into())
    }

    /// The value stored for `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<N, V> FromIterator<(N, V)> for QueryParams
where
    N: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Shape of the emitted query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStyle {
    /// What deployed servers have always received: a `?` even when there are
    /// no parameters, and a `&` before every pair (`?&site=abc&x=1`).
    #[default]
    Compatible,
    /// `?site=abc&x=1`, and no `?` at all when there are no parameters.
    Canonical,
}

/// Compose `base` + `path` + query string.
///
/// Values are form-urlencoded from their UTF-8 bytes (space becomes `+`);
/// names are emitted verbatim. Every value is validated before anything is
/// written, so an unencodable value never yields a partial URL.
pub fn build_url(
    base: &str,
    path: &str,
    params: &QueryParams,
    style: QueryStyle,
) -> Result<String, EncodingError> {
    let pairs = params
        .iter()
        .map(|(name, value)| {
            let text = value.as_text().ok_or_else(|| EncodingError {
                name: name.to_string(),
            })?;
            let encoded: String = form_urlencoded::byte_serialize(text.as_bytes()).collect();
            Ok::<_, EncodingError>((name, encoded))
        })
        .collect::<Result<Vec<_>, EncodingError>>()?;

    let mut url = join_path(base, path);

    match style {
        QueryStyle::Compatible => {
            url.push('?');
            for (name, value) in pairs {
                url.push('&');
                url.push_str(name);
                url.push('=');
                url.push_str(&value);
            }
        }
        QueryStyle::Canonical => {
            for (i, (name, value)) in pairs.into_iter().enumerate() {
                url.push(if i == 0 { '?' } else { '&' });
                url.push_str(name);
                url.push('=');
                url.push_str(&value);
            }
        }
    }

    Ok(url)
}

/// Decode a query string (with or without the leading `?`) into pairs.
///
/// Empty segments, such as the one produced by [`QueryStyle::Compatible`]'s
/// leading `&`, are skipped.
pub fn decode_query(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

fn join_path(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://dev.parworksapi.com";

    #[test]
    fn compatible_style_prefixes_every_pair() {
        let params = QueryParams::new().with("site", "abc");
        let url = build_url(BASE, "/ar/site/info", &params, QueryStyle::Compatible).unwrap();
        assert_eq!(url, "http://dev.parworksapi.com/ar/site/info?&site=abc");
    }

    #[test]
    fn compatible_style_keeps_question_mark_when_empty() {
        let url = build_url(BASE, "/ar/ping", &QueryParams::new(), QueryStyle::Compatible).unwrap();
        assert_eq!(url, "http://dev.parworksapi.com/ar/ping?");
    }

    #[test]
    fn canonical_style() {
        let params = QueryParams::new().with("b", "2").with("a", "1");
        let url = build_url(BASE, "/x", &params, QueryStyle::Canonical).unwrap();
        assert_eq!(url, "http://dev.parworksapi.com/x?a=1&b=2");

        let url = build_url(BASE, "/x", &QueryParams::new(), QueryStyle::Canonical).unwrap();
        assert_eq!(url, "http://dev.parworksapi.com/x");
    }

    #[test]
    fn values_are_form_urlencoded() {
        let params = QueryParams::new()
            .with("description", "a b&c=d/é")
            .with("name", "x*y-z._");
        let url = build_url(BASE, "/ar/site/add", &params, QueryStyle::Canonical).unwrap();
        assert_eq!(
            url,
            "http://dev.parworksapi.com/ar/site/add?description=a+b%26c%3Dd%2F%C3%A9&name=x*y-z._"
        );
    }

    #[test]
    fn empty_values_are_preserved() {
        let params = QueryParams::new()
            .with("lat", 37.0)
            .with("lon", -122.0)
            .with("max", "")
            .with("radius", "");
        let url = build_url(BASE, "/ar/site/nearby", &params, QueryStyle::Compatible).unwrap();
        assert_eq!(
            url,
            "http://dev.parworksapi.com/ar/site/nearby?&lat=37.0&lon=-122.0&max=&radius="
        );
    }

    #[test]
    fn last_write_wins() {
        let mut params = QueryParams::new();
        params.insert("site", "first");
        let previous = params.insert("site", "second");

        assert_eq!(previous, Some(ParamValue::from("first")));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("site"), Some(&ParamValue::from("second")));
    }

    #[test]
    fn lone_surrogate_is_rejected() {
        let params = QueryParams::new()
            .with("site", "ok")
            .with("name", ParamValue::Utf16(vec![0x0061, 0xD800, 0x0062]));

        let err = build_url(BASE, "/ar/site/add", &params, QueryStyle::Compatible).unwrap_err();
        assert_eq!(err.name, "name");
    }

    #[test]
    fn invalid_bytes_are_rejected() {
        let params = QueryParams::new().with("site", ParamValue::Bytes(vec![0x66, 0xFF]));
        assert!(build_url(BASE, "/ar/site/info", &params, QueryStyle::Canonical).is_err());
    }

    #[test]
    fn valid_utf16_is_accepted() {
        let units: Vec<u16> = "héllo wörld".encode_utf16().collect();
        let params = QueryParams::new().with("name", ParamValue::Utf16(units));
        let url = build_url(BASE, "/x", &params, QueryStyle::Canonical).unwrap();
        assert_eq!(url, "http://dev.parworksapi.com/x?name=h%C3%A9llo+w%C3%B6rld");
    }

    #[test]
    fn decoding_recovers_the_parameters() {
        let params: QueryParams = [
            ("id", "site 1"),
            ("description", "100% & more"),
            ("channel", ""),
            ("name", "日本語"),
        ]
        .into_iter()
        .collect();

        for style in [QueryStyle::Compatible, QueryStyle::Canonical] {
            let url = build_url(BASE, "/ar/site/add", &params, style).unwrap();
            let (_, query) = url.split_once('?').unwrap();

            let mut decoded = decode_query(query);
            decoded.sort();
            let mut expected: Vec<(String, String)> = params
                .iter()
                .map(|(n, v)| (n.to_string(), v.as_text().unwrap().into_owned()))
                .collect();
            expected.sort();

            assert_eq!(decoded, expected);
        }
    }

    #[test]
    fn path_is_joined_with_a_single_slash() {
        let params = QueryParams::new().with("site", "s");
        let url = build_url("http://host/", "ar/site/overlay", &params, QueryStyle::Canonical)
            .unwrap();
        assert_eq!(url, "http://host/ar/site/overlay?site=s");
    }
}
