//! Request and response values passed between the host, the agent and
//! the cache.
//!
//! Requests always carry an absolute URL. Relative paths (as found in the
//! precache list) are resolved against the configured origin before the
//! agent ever sees them.

use crate::error::{OffgridError, OffgridResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// HTTP request method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Convert to the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = OffgridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(OffgridError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// What the requesting page intends to do with the response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Unknown, e.g. `fetch()` from script
    #[default]
    Empty,
    /// Top-level navigation
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    Worker,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Document => "document",
            Self::Image => "image",
            Self::Script => "script",
            Self::Style => "style",
            Self::Font => "font",
            Self::Manifest => "manifest",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for Destination {
    type Err = OffgridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "empty" => Ok(Self::Empty),
            "document" => Ok(Self::Document),
            "image" => Ok(Self::Image),
            "script" => Ok(Self::Script),
            "style" => Ok(Self::Style),
            "font" => Ok(Self::Font),
            "manifest" => Ok(Self::Manifest),
            "worker" => Ok(Self::Worker),
            _ => Err(OffgridError::UnknownDestination(s.to_string())),
        }
    }
}

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    /// Header names are stored lowercase
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a GET request for an absolute URL
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            destination: Destination::Empty,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Resolve `raw` (absolute or origin-relative) against `base`.
    ///
    /// Only http(s) URLs are accepted.
    pub fn resolve(base: &Url, raw: &str) -> OffgridResult<Self> {
        let url = base.join(raw).map_err(|e| OffgridError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(OffgridError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(Self::get(url))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// The URL as a string
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }

    /// Whether the request targets the same origin as `origin`
    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }

    /// Key under which this request is cached. The fragment is not part
    /// of the key.
    pub fn cache_key(&self) -> CacheKey {
        let mut url = self.url.clone();
        url.set_fragment(None);
        CacheKey::new(self.method, url.as_str())
    }
}

/// A request as handed to `add_all`: either a constructed request or the
/// raw URL string it could not be built from.
#[derive(Debug, Clone)]
pub enum RequestInfo {
    Request(Request),
    Raw(String),
}

impl RequestInfo {
    /// Build a request for `raw`, degrading to the raw string when the
    /// URL cannot be resolved.
    pub fn build(base: &Url, raw: &str) -> Self {
        match Request::resolve(base, raw) {
            Ok(request) => Self::Request(request),
            Err(e) => {
                tracing::debug!("Falling back to raw key for {}: {}", raw, e);
                Self::Raw(raw.to_string())
            }
        }
    }

    /// Key the entry will be stored under
    pub fn cache_key(&self) -> CacheKey {
        match self {
            Self::Request(request) => request.cache_key(),
            Self::Raw(raw) => CacheKey::new(Method::Get, raw),
        }
    }

    /// Turn into a fetchable request, resolving raw strings again
    pub fn into_request(self, base: &Url) -> OffgridResult<Request> {
        match self {
            Self::Request(request) => Ok(request),
            Self::Raw(raw) => Request::resolve(base, &raw),
        }
    }
}

/// Cache lookup key: method plus URL
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(method: Method, url: &str) -> Self {
        Self(format!("{} {}", method.as_str(), url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL part of the key
    pub fn url(&self) -> &str {
        self.0.split_once(' ').map(|(_, url)| url).unwrap_or(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform classification of a fetched response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response
    Basic,
    /// Cross-origin response with CORS headers
    Cors,
    /// Synthesized locally
    #[default]
    Default,
    /// Network error placeholder
    Error,
    /// Cross-origin response without CORS
    Opaque,
    /// Unfollowed redirect
    OpaqueRedirect,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Default => "default",
            Self::Error => "error",
            Self::Opaque => "opaque",
            Self::OpaqueRedirect => "opaqueredirect",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured response. Bodies are reference counted, so clones are cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub response_type: ResponseType,
    pub url: String,
    pub redirected: bool,
    /// Header names are stored lowercase
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Response {
    /// Create an empty response with a status
    pub fn new(status: u16) -> Self {
        Self {
            status,
            response_type: ResponseType::Default,
            url: String::new(),
            redirected: false,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    /// Synthesized page returned for navigations while offline
    pub fn offline_notice(body: &str) -> Self {
        Self::new(503)
            .with_header("Content-Type", "text/html")
            .with_body(body.to_string())
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 2xx status
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// A 200, same-origin, non-redirected response
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic && !self.redirected
    }

    /// Body decoded as UTF-8, lossy
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
