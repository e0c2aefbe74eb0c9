//! Development reverse proxy.
//!
//! Forwards a fixed set of path prefixes (by default `/images` and `/mmapi`)
//! to the analysis backend so the dashboard and the backend appear to share
//! one origin. There is a single static target and no retry.

mod config;

pub use config::{PathRewrites, ProxyConfig, ProxyRouteConfig, DEFAULT_TARGET};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use regex::Regex;
use reqwest::{redirect, Client};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// Largest request body forwarded upstream.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid proxy target: {0}")]
    InvalidTarget(#[from] url::ParseError),

    #[error("Invalid route prefix '{0}': must start with '/'")]
    InvalidPrefix(String),

    #[error("Invalid path rewrite '{pattern}': {source}")]
    InvalidRewrite {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("No proxy route for {0}")]
    NoRoute(String),

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

/// A compiled route: prefix plus ordered path rewrites.
#[derive(Debug)]
pub struct ProxyRoute {
    prefix: String,
    rewrites: Vec<(Regex, String)>,
}

impl ProxyRoute {
    fn compile(config: &ProxyRouteConfig) -> Result<Self, ProxyError> {
        if !config.prefix.starts_with('/') {
            return Err(ProxyError::InvalidPrefix(config.prefix.clone()));
        }
        let rewrites = config
            .path_rewrite
            .iter()
            .map(|(pattern, replacement)| {
                Regex::new(pattern)
                    .map(|re| (re, replacement.to_string()))
                    .map_err(|source| ProxyError::InvalidRewrite {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            prefix: config.prefix.trim_end_matches('/').to_string(),
            rewrites,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn matches(&self, path: &str) -> bool {
        path == self.prefix
            || path
                .strip_prefix(&self.prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Apply the first rewrite whose pattern matches; later rules are not tried.
    fn rewrite(&self, path: &str) -> String {
        match self.rewrites.iter().find(|(re, _)| re.is_match(path)) {
            Some((re, replacement)) => re.replace(path, replacement.as_str()).into_owned(),
            None => path.to_string(),
        }
    }
}

/// Forwarding proxy to one backend origin.
#[derive(Debug)]
pub struct DevProxy {
    client: Client,
    target: Url,
    change_origin: bool,
    routes: Vec<ProxyRoute>,
}

impl DevProxy {
    pub fn new(config: &ProxyConfig, timeout: Duration) -> Result<Self, ProxyError> {
        let target = Url::parse(&config.target)?;
        let routes = config
            .routes
            .iter()
            .map(ProxyRoute::compile)
            .collect::<Result<Vec<_>, _>>()?;

        // Pass bodies through untouched: no redirects, no decompression.
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .no_gzip()
            .no_brotli()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            target,
            change_origin: config.change_origin,
            routes,
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn routes(&self) -> &[ProxyRoute] {
        &self.routes
    }

    fn route_for(&self, path: &str) -> Option<&ProxyRoute> {
        self.routes.iter().find(|r| r.matches(path))
    }

    /// Upstream URL for a request path, or `None` if no route matches.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> Option<String> {
        let route = self.route_for(path)?;
        let base = self.target.as_str().trim_end_matches('/');
        let mut url = format!("{}{}", base, route.rewrite(path));
        if let Some(q) = query {
            url.push('?');
            url.push_str(q);
        }
        Some(url)
    }

    /// Forward one request and relay the backend's response.
    pub async fn forward(&self, request: Request) -> Result<Response, ProxyError> {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path();
        let upstream = self
            .upstream_url(path, parts.uri.query())
            .ok_or_else(|| ProxyError::NoRoute(path.to_string()))?;
        debug!("{} {} -> {}", parts.method, parts.uri, upstream);

        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| ProxyError::Body(e.to_string()))?;

        let mut builder = self.client.request(parts.method.clone(), &upstream);
        for (name, value) in parts.headers.iter() {
            if is_hop_by_hop(name) || name == header::CONTENT_LENGTH {
                continue;
            }
            // Dropping Host lets the client derive it from the target URL.
            if name == header::HOST && self.change_origin {
                continue;
            }
            builder = builder.header(name, value);
        }

        let upstream_response = builder.body(body).send().await?;
        let status = upstream_response.status();
        let headers = upstream_response.headers().clone();
        let bytes = upstream_response.bytes().await?;

        let mut response = Response::builder().status(status);
        for (name, value) in headers.iter() {
            if !is_hop_by_hop(name) {
                response = response.header(name, value);
            }
        }
        Ok(response.body(Body::from(bytes))?)
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Router forwarding every configured prefix to the backend.
pub fn router(proxy: Arc<DevProxy>) -> Router {
    let mut router = Router::new();
    for route in proxy.routes() {
        router = router
            .route(route.prefix(), any(forward))
            .route(&format!("{}/*rest", route.prefix()), any(forward));
    }
    router.with_state(proxy)
}

async fn forward(State(proxy): State<Arc<DevProxy>>, request: Request) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    match proxy.forward(request).await {
        Ok(response) => response,
        Err(e) => {
            error!("Proxy error for {} {}: {}", method, uri, e);
            (StatusCode::BAD_GATEWAY, format!("Proxy error: {}", e)).into_response()
        }
    }
}

/// Run the proxy on its own.
pub async fn serve(proxy: DevProxy, addr: SocketAddr) -> anyhow::Result<()> {
    let target = proxy.target().clone();
    let prefixes: Vec<String> = proxy.routes().iter().map(|r| r.prefix().to_string()).collect();
    let app = router(Arc::new(proxy));

    tracing::info!(
        "Proxying {} to {} on http://{}",
        prefixes.join(", "),
        target,
        addr
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
