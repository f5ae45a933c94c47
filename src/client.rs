use std::path::Path;
use std::sync::Arc;

use shutter::{
    Authenticator, GatewayConfig, JsonFileLikeStore, UnsplashHttpClient, UpstreamGateway,
    UserLikes,
};
use tracing::info;

use crate::cli::Credentials;
use crate::error::GalleryError;
use crate::likes::LikeController;

pub type Gateway = UpstreamGateway<UnsplashHttpClient>;
pub type Likes = UserLikes<JsonFileLikeStore>;

/// Build the cached provider gateway.
///
/// Loads `.env`, reads the access key from the environment and points the
/// client at `base_url`. Fails early when no access key is configured.
pub fn create_gateway(base_url: &str) -> Result<Arc<Gateway>, GalleryError> {
    let _ = dotenvy::dotenv();

    let config = GatewayConfig {
        base_url: base_url.to_string(),
        ..GatewayConfig::from_env()
    };
    if config.access_key.is_empty() {
        return Err(GalleryError::MissingAccessKey);
    }
    config.validate()?;

    info!(base_url = %config.base_url, ttl = ?config.cache_ttl, "gateway ready");
    Ok(Arc::new(UpstreamGateway::from_config(&config)?))
}

/// Authenticate `credentials` and open that user's likes in `store`.
///
/// Returns a controller whose initial list load is already in flight.
pub fn create_like_controller(
    credentials: &Credentials,
    store: &Path,
) -> Result<(Arc<Likes>, LikeController<Likes>), GalleryError> {
    let identity = Authenticator::default().authenticate(&credentials.user, &credentials.password)?;
    info!(user = %identity.username, store = %store.display(), "authenticated");

    let store = Arc::new(JsonFileLikeStore::new(store));
    let api = Arc::new(UserLikes::new(store, Some(identity)));
    let controller = LikeController::new(Arc::clone(&api));
    Ok((api, controller))
}
