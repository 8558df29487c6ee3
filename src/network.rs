//! Network access for the agent
//!
//! `HttpNetwork` performs real requests with ureq on the blocking pool.
//! Redirects are followed; the response carries the final URL and is
//! flagged `redirected`, which keeps it out of the runtime bucket.
//! Responses whose final URL is cross-origin are classified `opaque`.

use crate::config::schema::NetworkConfig;
use crate::error::{OffgridError, OffgridResult};
use crate::http::{Method, Request, Response, ResponseType};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use ureq::ResponseExt;
use url::Url;

/// Abstract fetch primitive
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. Errors mean no response was received at all;
    /// HTTP error statuses are returned as responses.
    async fn fetch(&self, request: &Request) -> OffgridResult<Response>;
}

/// ureq-backed network client for one origin
#[derive(Clone)]
pub struct HttpNetwork {
    agent: ureq::Agent,
    origin: Url,
}

impl HttpNetwork {
    pub fn new(origin: Url, config: &NetworkConfig) -> Self {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent, origin }
    }

    /// Response type for a response that ended up at `final_url`
    fn classify(&self, final_url: &Url) -> ResponseType {
        if final_url.origin() == self.origin.origin() {
            ResponseType::Basic
        } else {
            ResponseType::Opaque
        }
    }
}

/// Whether the response was served from somewhere other than the
/// requested URL. Fragments never reach the wire and are ignored.
fn was_redirected(request: &Request, final_url: &Url) -> bool {
    let mut requested = request.url.clone();
    requested.set_fragment(None);
    requested != *final_url
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, request: &Request) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn fetch_blocking(
    agent: &ureq::Agent,
    request: &Request,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let mut target = request.url.clone();
    target.set_fragment(None);
    let url = target.as_str();
    let body: &[u8] = request.body.as_deref().unwrap_or(&[]);

    match request.method {
        Method::Get => with_headers(agent.get(url), request).call(),
        Method::Head => with_headers(agent.head(url), request).call(),
        Method::Delete => with_headers(agent.delete(url), request).call(),
        Method::Post => with_headers(agent.post(url), request).send(body),
        Method::Put => with_headers(agent.put(url), request).send(body),
        Method::Patch => with_headers(agent.patch(url), request).send(body),
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> OffgridResult<Response> {
        let agent = self.agent.clone();
        let owned = request.clone();
        let url = request.url_str().to_string();

        debug!("{} {}", request.method, url);

        let (status, final_uri, headers, body) = tokio::task::spawn_blocking(move || {
            let mut response = fetch_blocking(&agent, &owned)?;
            let status = response.status().as_u16();
            let final_uri = response.get_uri().to_string();
            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.body_mut().read_to_vec()?;
            Ok::<_, ureq::Error>((status, final_uri, headers, body))
        })
        .await
        .map_err(|e| OffgridError::Internal(format!("fetch task failed: {}", e)))?
        .map_err(|e| OffgridError::network(&url, e.to_string()))?;

        let final_url = Url::parse(&final_uri).map_err(|e| OffgridError::InvalidUrl {
            url: final_uri.clone(),
            reason: e.to_string(),
        })?;
        let redirected = was_redirected(request, &final_url);
        if redirected {
            debug!("{} redirected to {}", url, final_url);
        }

        let mut response = Response::new(status)
            .with_type(self.classify(&final_url))
            .with_url(final_url.as_str())
            .with_body(body);
        response.redirected = redirected;
        for (name, value) in headers {
            response = response.with_header(&name, value);
        }

        Ok(response)
    }
}

/// Wraps a network with an online/offline switch
pub struct SwitchableNetwork {
    inner: Arc<dyn Network>,
    online: AtomicBool,
}

impl SwitchableNetwork {
    pub fn new(inner: Arc<dyn Network>) -> Self {
        Self {
            inner,
            online: AtomicBool::new(true),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for SwitchableNetwork {
    async fn fetch(&self, request: &Request) -> OffgridResult<Response> {
        if !self.is_online() {
            return Err(OffgridError::Offline(request.url_str().to_string()));
        }
        self.inner.fetch(request).await
    }
}
