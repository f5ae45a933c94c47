//! Liked-set tracker with optimistic toggles and server reconciliation.
//!
//! The local set is authoritative for rendering. A toggle applies the
//! negated membership immediately, then either reconciles to the server's
//! answer or rolls back to the snapshot taken before the toggle.
//!
//! Overlapping toggles of the same id are not serialised: whichever server
//! response resolves last decides the local membership.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shutter::LikeApi;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Display projection of the like state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LikesView {
    pub liked: Arc<HashSet<String>>,
    /// The initial list is still loading.
    pub loading: bool,
    /// Last toggle or load failure.
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct LikeState {
    liked: Arc<HashSet<String>>,
    loading: bool,
    /// Memberships set locally while the initial list was loading; replayed
    /// on top of it once it arrives.
    overrides: HashMap<String, bool>,
    error: Option<String>,
}

impl LikeState {
    fn set(&mut self, id: &str, liked: bool) {
        if self.liked.contains(id) != liked {
            let set = Arc::make_mut(&mut self.liked);
            if liked {
                set.insert(id.to_string());
            } else {
                set.remove(id);
            }
        }
        if self.loading {
            self.overrides.insert(id.to_string(), liked);
        }
    }

    fn view(&self) -> LikesView {
        LikesView {
            liked: Arc::clone(&self.liked),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

struct LikeInner<A> {
    api: Arc<A>,
    state: Mutex<LikeState>,
    view_tx: watch::Sender<LikesView>,
}

/// Optimistic like controller. Cheap to clone; clones share state.
pub struct LikeController<A> {
    inner: Arc<LikeInner<A>>,
}

impl<A> Clone for LikeController<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: LikeApi> LikeController<A> {
    /// Create the controller and start loading the liked list in the
    /// background. Must be called within a Tokio runtime.
    pub fn new(api: Arc<A>) -> Self {
        let state = LikeState {
            loading: true,
            ..Default::default()
        };
        let (view_tx, _) = watch::channel(state.view());
        let inner = Arc::new(LikeInner {
            api,
            state: Mutex::new(state),
            view_tx,
        });

        let loader = Arc::clone(&inner);
        tokio::spawn(async move {
            let result = loader.api.fetch_likes().await;
            loader.finish_load(result);
        });

        Self { inner }
    }

    /// Membership test. Conservatively false until the initial load is done,
    /// unless the id was toggled locally in the meantime.
    pub fn is_liked(&self, id: &str) -> bool {
        self.inner.lock().liked.contains(id)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().loading
    }

    /// Toggle `id` and return the resulting membership.
    ///
    /// The local set flips before the server call. On success the server's
    /// answer wins; on failure the previous membership is restored and
    /// returned.
    pub async fn toggle(&self, id: &str) -> bool {
        let previous = {
            let mut s = self.inner.lock();
            let previous = s.liked.contains(id);
            s.set(id, !previous);
            self.inner.publish(&s);
            previous
        };
        debug!(id, optimistic = !previous, "like toggled locally");

        match self.inner.api.toggle(id).await {
            Ok(resp) => {
                let mut s = self.inner.lock();
                s.set(id, resp.liked);
                s.error = None;
                self.inner.publish(&s);
                if resp.liked == previous {
                    warn!(id, server = resp.liked, "server disagreed with optimistic toggle");
                }
                resp.liked
            }
            Err(e) => {
                let mut s = self.inner.lock();
                s.set(id, previous);
                s.error = Some(e.to_string());
                self.inner.publish(&s);
                warn!(id, error = %e, "like toggle failed, rolled back");
                previous
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LikesView> {
        self.inner.view_tx.subscribe()
    }

    pub fn snapshot(&self) -> LikesView {
        self.inner.view_tx.borrow().clone()
    }
}

impl<A: LikeApi> LikeInner<A> {
    fn lock(&self) -> MutexGuard<'_, LikeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &LikeState) {
        self.view_tx.send_replace(state.view());
    }

    fn finish_load(&self, result: shutter::Result<shutter::LikesResponse>) {
        let mut s = self.lock();
        s.loading = false;
        let overrides = std::mem::take(&mut s.overrides);
        match result {
            Ok(resp) => {
                let mut liked: HashSet<String> = resp.likes.into_iter().collect();
                for (id, member) in overrides {
                    if member {
                        liked.insert(id);
                    } else {
                        liked.remove(&id);
                    }
                }
                info!(count = liked.len(), "likes loaded");
                s.liked = Arc::new(liked);
            }
            Err(e) => {
                warn!(error = %e, "failed to load likes");
                s.error = Some(e.to_string());
            }
        }
        self.publish(&s);
    }
}
