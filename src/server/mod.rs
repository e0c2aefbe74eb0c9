//! Web dashboard for browsing forensic reports.
//!
//! Provides:
//! - A list of cached report pointers, newest first
//! - A report page with tabbed analysis panels
//! - The resolved report as JSON
//! - Optionally, the dev proxy mounted on the same origin

mod assets;
mod handlers;
mod routes;
mod template_structs;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::ReportSource;
use crate::cache::ReportCache;
use crate::config::Settings;
use crate::proxy::DevProxy;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ReportSource>,
    pub cache: Arc<ReportCache>,
    /// Proxied origin whose image URLs are rewritten to relative paths.
    /// `None` when no proxy is mounted.
    pub image_origin: Option<String>,
}

impl AppState {
    pub fn new(settings: &Settings, proxy_mounted: bool) -> anyhow::Result<Self> {
        Ok(Self {
            source: Arc::new(settings.create_api_client()?),
            cache: Arc::new(settings.open_cache()),
            image_origin: settings.image_origin(proxy_mounted).map(str::to_string),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, addr: SocketAddr, with_proxy: bool) -> anyhow::Result<()> {
    let proxy = if with_proxy && settings.proxy.enabled {
        Some(Arc::new(settings.create_proxy()?))
    } else {
        None
    };
    let state = AppState::new(settings, proxy.is_some())?;

    if let Some(ref proxy) = proxy {
        tracing::info!("Forwarding backend routes to {}", proxy.target());
    }
    let app = create_router(state, proxy);

    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
