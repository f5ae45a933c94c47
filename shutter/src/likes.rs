//! User-scoped like endpoints backed by a [`LikeStore`].

use std::future::Future;
use std::sync::Arc;

use crate::auth::Identity;
use crate::error::{AuthFailure, Result, ShutterError};
use crate::store::LikeStore;
use crate::types::{LikedResponse, LikesResponse};

/// Server calls a like controller depends on.
pub trait LikeApi: Send + Sync + 'static {
    /// Full list of liked ids for the current user.
    fn fetch_likes(&self) -> impl Future<Output = Result<LikesResponse>> + Send;

    /// Flip membership of `item_id`; the response is authoritative.
    fn toggle(&self, item_id: &str) -> impl Future<Output = Result<LikedResponse>> + Send;
}

/// Like operations on behalf of one (possibly anonymous) caller.
pub struct UserLikes<S> {
    store: Arc<S>,
    identity: Option<Identity>,
}

impl<S: LikeStore> UserLikes<S> {
    pub fn new(store: Arc<S>, identity: Option<Identity>) -> Self {
        Self { store, identity }
    }

    fn user(&self) -> Result<&str> {
        self.identity
            .as_ref()
            .map(|i| i.username.as_str())
            .ok_or(ShutterError::Auth(AuthFailure::Unauthenticated))
    }

    fn check_item(item_id: &str) -> Result<()> {
        if item_id.trim().is_empty() {
            return Err(ShutterError::Validation("missing item id".into()));
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<LikesResponse> {
        let user = self.user()?;
        let likes = self.store.list(user).await?;
        Ok(LikesResponse { likes })
    }

    pub async fn toggle(&self, item_id: &str) -> Result<LikedResponse> {
        let user = self.user()?;
        Self::check_item(item_id)?;
        let liked = self.store.toggle(user, item_id).await?;
        Ok(LikedResponse { liked })
    }

    /// Unlike unconditionally.
    pub async fn remove(&self, item_id: &str) -> Result<LikedResponse> {
        let user = self.user()?;
        Self::check_item(item_id)?;
        self.store.delete(user, item_id).await?;
        Ok(LikedResponse { liked: false })
    }
}

impl<S: LikeStore> LikeApi for UserLikes<S> {
    async fn fetch_likes(&self) -> Result<LikesResponse> {
        self.list().await
    }

    async fn toggle(&self, item_id: &str) -> Result<LikedResponse> {
        UserLikes::toggle(self, item_id).await
    }
}
