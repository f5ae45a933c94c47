//! Cached, filtered access to the upstream photo provider.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{ResponseCache, TtlCache};
use crate::config::GatewayConfig;
use crate::error::{Result, ShutterError};
use crate::rest::UnsplashHttpClient;
use crate::types::{PageRequest, PhotoPage};

/// Anything that can serve one page of photos.
///
/// Implemented by the raw provider client and by [`UpstreamGateway`] itself,
/// so consumers can be pointed at either.
pub trait PhotoSource: Send + Sync + 'static {
    fn list(&self, request: &PageRequest) -> impl Future<Output = Result<PhotoPage>> + Send;
}

impl PhotoSource for UnsplashHttpClient {
    async fn list(&self, request: &PageRequest) -> Result<PhotoPage> {
        self.list_photos(request).await
    }
}

/// Forwards page queries upstream, serving repeats from a short-lived cache.
pub struct UpstreamGateway<P> {
    provider: P,
    cache: Arc<dyn ResponseCache>,
}

impl<P: PhotoSource> UpstreamGateway<P> {
    pub fn new(provider: P, cache: Arc<dyn ResponseCache>) -> Self {
        Self { provider, cache }
    }

    /// Gateway with a process-local [`TtlCache`].
    pub fn with_ttl_cache(provider: P, ttl: std::time::Duration) -> Self {
        Self::new(provider, Arc::new(TtlCache::new(ttl)))
    }

    /// Serve `request` from cache if fresh, otherwise from the provider.
    ///
    /// Only successful payloads are cached. Provider failures of any kind
    /// surface as [`ShutterError::Upstream`]; invalid requests fail with
    /// [`ShutterError::Validation`] before touching cache or provider.
    pub async fn list(&self, request: &PageRequest) -> Result<PhotoPage> {
        request.validate()?;

        if let Some(page) = self.cache.get(request) {
            debug!(key = %request, count = page.items.len(), "cache hit");
            return Ok(page);
        }

        debug!(key = %request, "cache miss, forwarding upstream");
        let page = self.provider.list(request).await.map_err(|e| {
            warn!(key = %request, error = %e, "upstream list failed");
            into_upstream(e)
        })?;

        self.cache.set(*request, page.clone());
        Ok(page)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl UpstreamGateway<UnsplashHttpClient> {
    /// Gateway over the Unsplash REST API with the configured TTL.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let client = UnsplashHttpClient::from_config(config)?;
        Ok(Self::with_ttl_cache(client, config.cache_ttl))
    }
}

impl<P: PhotoSource> PhotoSource for UpstreamGateway<P> {
    async fn list(&self, request: &PageRequest) -> Result<PhotoPage> {
        UpstreamGateway::list(self, request).await
    }
}

fn into_upstream(e: ShutterError) -> ShutterError {
    match e {
        ShutterError::Validation(_) | ShutterError::Cancelled | ShutterError::Auth(_) => e,
        ShutterError::Upstream(_) => e,
        ShutterError::Http { status, message } if message.is_empty() => {
            ShutterError::Upstream(format!("provider returned HTTP {status}"))
        }
        ShutterError::Http { status, message } => {
            ShutterError::Upstream(format!("provider returned HTTP {status}: {message}"))
        }
        ShutterError::Json(e) => ShutterError::Upstream(format!("malformed payload: {e}")),
        other => ShutterError::Upstream(other.to_string()),
    }
}
