//! Infinite pagination over a [`PhotoSource`].
//!
//! [`PaginationController`] owns the canonical session state (cursor,
//! accumulated photos, in-flight/backoff activity, retry counter, liveness
//! token) behind a mutex and publishes a read-only [`GalleryView`] through a
//! `watch` channel after every transition.
//!
//! Every fetch or retry timer is tagged with a fresh token and a child
//! [`CancellationToken`]. Starting a new fetch, changing filters or closing
//! the controller cancels the previous one; a result that still resolves is
//! compared against the current token and dropped on mismatch, so a
//! superseded request can never touch the live session.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use shutter::{FilterSet, PageRequest, Photo, PhotoPage, PhotoSource, ShutterError};
use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

/// Tuning for the pagination controller.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Items requested per page.
    pub page_size: u32,
    /// Automatic attempts per page before the error is left for a manual retry.
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `n * retry_base_delay`.
    pub retry_base_delay: Duration,
    /// Upper bound on a single page fetch.
    pub request_timeout: Duration,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Display projection of the session. Derived, never written back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryView {
    pub filters: FilterSet,
    pub photos: Arc<Vec<Photo>>,
    /// Page the cursor points at (0 before the first fetch).
    pub page: u32,
    /// A subsequent page (or an automatic retry) is loading.
    pub loading: bool,
    /// The first page of a session is loading.
    pub refreshing: bool,
    pub has_more: bool,
    /// Error waiting for a manual retry.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Idle,
    Refreshing,
    Loading,
    /// Waiting out the delay before an automatic retry.
    Backoff,
}

struct Session {
    /// Incremented on every filter change; used for log correlation only.
    id: u64,
    filters: FilterSet,
    photos: Arc<Vec<Photo>>,
    seen: HashSet<String>,
    cursor: u32,
    has_more: bool,
    activity: Activity,
    error: Option<String>,
    /// Consecutive failed attempts for the current page.
    failures: u32,
    /// Liveness token of the outstanding fetch or retry timer. Monotonic for
    /// the lifetime of the controller, across sessions.
    token: u64,
    pending: Option<CancellationToken>,
}

impl Session {
    fn new(filters: FilterSet) -> Self {
        Self {
            id: 0,
            filters,
            photos: Arc::new(Vec::new()),
            seen: HashSet::new(),
            cursor: 0,
            has_more: true,
            activity: Activity::Idle,
            error: None,
            failures: 0,
            token: 0,
            pending: None,
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(cancel) = self.pending.take() {
            cancel.cancel();
        }
    }

    /// Start a fresh session for `filters`, keeping the token counter.
    fn reset(&mut self, filters: FilterSet) {
        self.cancel_pending();
        self.id += 1;
        self.filters = filters;
        self.photos = Arc::new(Vec::new());
        self.seen.clear();
        self.cursor = 1;
        self.has_more = true;
        self.activity = Activity::Idle;
        self.error = None;
        self.failures = 0;
    }

    fn next_token(&mut self) -> u64 {
        self.token += 1;
        self.token
    }

    /// Append unseen photos in arrival order. Returns how many were new.
    fn merge(&mut self, items: Vec<Photo>) -> usize {
        let fresh: Vec<Photo> = items
            .into_iter()
            .filter(|p| self.seen.insert(p.id.clone()))
            .collect();
        let added = fresh.len();
        if added > 0 {
            Arc::make_mut(&mut self.photos).extend(fresh);
        }
        added
    }

    fn view(&self) -> GalleryView {
        let backoff = self.activity == Activity::Backoff;
        GalleryView {
            filters: self.filters,
            photos: Arc::clone(&self.photos),
            page: self.cursor,
            loading: matches!(self.activity, Activity::Loading | Activity::Backoff),
            refreshing: self.activity == Activity::Refreshing,
            has_more: self.has_more,
            error: if backoff { None } else { self.error.clone() },
        }
    }
}

struct Inner<S> {
    source: Arc<S>,
    config: PaginationConfig,
    session: Mutex<Session>,
    view_tx: watch::Sender<GalleryView>,
    shutdown: CancellationToken,
    sentinel: Mutex<Option<CancellationToken>>,
}

/// Drives sequential page fetches for one filter set at a time.
///
/// Cheap to clone; all clones share one session. Dropping the last clone
/// cancels any outstanding fetch, retry timer and sentinel listener.
/// Operations spawn onto the current Tokio runtime and never block.
pub struct PaginationController<S> {
    inner: Arc<Inner<S>>,
    _shutdown: Arc<DropGuard>,
}

impl<S> Clone for PaginationController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _shutdown: Arc::clone(&self._shutdown),
        }
    }
}

impl<S: PhotoSource> PaginationController<S> {
    /// Create an idle controller. Nothing is fetched until
    /// [`set_filters`](Self::set_filters) or
    /// [`request_next_page`](Self::request_next_page) is called.
    pub fn new(source: Arc<S>, config: PaginationConfig) -> Self {
        let session = Session::new(FilterSet::default());
        let (view_tx, _) = watch::channel(session.view());
        let shutdown = CancellationToken::new();
        let guard = shutdown.clone().drop_guard();
        Self {
            inner: Arc::new(Inner {
                source,
                config,
                session: Mutex::new(session),
                view_tx,
                shutdown,
                sentinel: Mutex::new(None),
            }),
            _shutdown: Arc::new(guard),
        }
    }

    /// Terminate the current session and start a new one at page 1.
    pub fn set_filters(&self, filters: FilterSet) {
        self.inner.set_filters(filters);
    }

    /// Fetch the next page unless busy, exhausted or holding an error.
    ///
    /// An outstanding error blocks paging on purpose: advancing the cursor
    /// past a failed page would drop it from the feed. Clear it with
    /// [`retry`](Self::retry). Returns whether a fetch was issued.
    pub fn request_next_page(&self) -> bool {
        self.inner.request_next_page()
    }

    /// Clear the error and re-fetch the current page with a fresh retry budget.
    pub fn retry(&self) {
        self.inner.retry();
    }

    /// Fetch the next page each time `visible` turns true.
    ///
    /// Replaces any previously attached sentinel.
    pub fn attach_sentinel(&self, visible: watch::Receiver<bool>) {
        Arc::clone(&self.inner).attach_sentinel(visible);
    }

    /// Subscribe to view updates.
    pub fn subscribe(&self) -> watch::Receiver<GalleryView> {
        self.inner.view_tx.subscribe()
    }

    /// Current view.
    pub fn snapshot(&self) -> GalleryView {
        self.inner.view_tx.borrow().clone()
    }

    /// Cancel outstanding work. Later operations are no-ops.
    pub fn close(&self) {
        self.inner.close();
    }
}

impl<S: PhotoSource> Inner<S> {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) {
        self.view_tx.send_replace(session.view());
    }

    fn closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn set_filters(self: &Arc<Self>, filters: FilterSet) {
        if self.closed() {
            return;
        }
        let mut s = self.lock();
        s.reset(filters);
        info!(
            session = s.id,
            order_by = %filters.order_by,
            color = %filters.color,
            orientation = %filters.orientation,
            "filters changed, session reset"
        );
        self.begin_fetch(&mut s, false);
        self.publish(&s);
    }

    fn request_next_page(self: &Arc<Self>) -> bool {
        if self.closed() {
            return false;
        }
        let mut s = self.lock();
        if s.activity != Activity::Idle || !s.has_more || s.error.is_some() {
            debug!(
                session = s.id,
                activity = ?s.activity,
                has_more = s.has_more,
                "next page ignored"
            );
            return false;
        }
        s.cursor += 1;
        self.begin_fetch(&mut s, false);
        self.publish(&s);
        true
    }

    fn retry(self: &Arc<Self>) {
        if self.closed() {
            return;
        }
        let mut s = self.lock();
        s.error = None;
        s.failures = 0;
        if s.photos.is_empty() {
            s.cursor = 1;
        }
        info!(session = s.id, page = s.cursor, "manual retry");
        self.begin_fetch(&mut s, false);
        self.publish(&s);
    }

    fn close(&self) {
        self.shutdown.cancel();
        let mut s = self.lock();
        s.cancel_pending();
        // Anything still resolving now carries a stale token.
        s.next_token();
        s.activity = Activity::Idle;
        self.publish(&s);
        debug!(session = s.id, "pagination closed");
    }

    /// Issue a fetch for the cursor page, superseding whatever is pending.
    ///
    /// Called with the session lock held; the spawned task re-locks only
    /// after the request settles.
    fn begin_fetch(self: &Arc<Self>, s: &mut Session, auto_retry: bool) {
        s.cancel_pending();
        let token = s.next_token();
        let cancel = self.shutdown.child_token();
        s.pending = Some(cancel.clone());
        s.activity = if s.cursor == 1 && !auto_retry {
            Activity::Refreshing
        } else {
            Activity::Loading
        };
        s.error = None;

        let request = PageRequest::new(s.cursor, self.config.page_size, s.filters);
        let timeout = self.config.request_timeout;
        debug!(session = s.id, token, key = %request, auto_retry, "fetch issued");

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(token, "fetch cancelled");
                    return;
                }
                res = time::timeout(timeout, inner.source.list(&request)) => {
                    res.unwrap_or(Err(ShutterError::Timeout(timeout)))
                }
            };
            inner.settle(token, request, outcome);
        });
    }

    fn settle(self: &Arc<Self>, token: u64, request: PageRequest, outcome: shutter::Result<PhotoPage>) {
        if self.closed() {
            debug!(token, key = %request, "result after teardown discarded");
            return;
        }
        let mut s = self.lock();
        if s.token != token {
            debug!(token, current = s.token, key = %request, "stale result discarded");
            return;
        }
        s.pending = None;
        s.activity = Activity::Idle;

        match outcome {
            Ok(page) if page.items.is_empty() => {
                s.has_more = false;
                s.failures = 0;
                info!(session = s.id, page = request.page, "empty page, end of results");
            }
            Ok(page) => {
                let received = page.items.len();
                let added = s.merge(page.items);
                s.has_more = received >= self.config.page_size as usize;
                s.failures = 0;
                info!(
                    session = s.id,
                    page = request.page,
                    received,
                    added,
                    total = s.photos.len(),
                    has_more = s.has_more,
                    "page merged"
                );
            }
            Err(ShutterError::Cancelled) => {
                debug!(token, "fetch reported cancellation");
            }
            Err(e) => self.fail(&mut s, e),
        }
        self.publish(&s);
    }

    fn fail(self: &Arc<Self>, s: &mut Session, error: ShutterError) {
        s.failures += 1;
        s.error = Some(error.to_string());

        if error.is_retryable() && s.failures < self.config.max_attempts && s.has_more {
            let delay = self.config.retry_base_delay * s.failures;
            warn!(
                session = s.id,
                page = s.cursor,
                attempt = s.failures,
                delay = ?delay,
                error = %error,
                "fetch failed, retrying"
            );
            self.schedule_retry(s, delay);
        } else {
            warn!(
                session = s.id,
                page = s.cursor,
                attempts = s.failures,
                error = %error,
                "fetch failed, waiting for manual retry"
            );
        }
    }

    fn schedule_retry(self: &Arc<Self>, s: &mut Session, delay: Duration) {
        let token = s.next_token();
        let cancel = self.shutdown.child_token();
        s.pending = Some(cancel.clone());
        s.activity = Activity::Backoff;

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(token, "retry timer cancelled");
                }
                _ = time::sleep(delay) => {
                    if inner.closed() {
                        return;
                    }
                    let mut s = inner.lock();
                    if s.token != token || !s.has_more {
                        return;
                    }
                    inner.begin_fetch(&mut s, true);
                    inner.publish(&s);
                }
            }
        });
    }

    fn attach_sentinel(self: Arc<Self>, mut visible: watch::Receiver<bool>) {
        if self.closed() {
            return;
        }
        let cancel = self.shutdown.child_token();
        let previous = self
            .sentinel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(cancel.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        tokio::spawn(async move {
            if *visible.borrow_and_update() {
                self.request_next_page();
            }
            loop {
                tokio::select! {
                    changed = visible.changed() => {
                        if changed.is_err() {
                            debug!("sentinel sender dropped");
                            return;
                        }
                        if *visible.borrow_and_update() {
                            self.request_next_page();
                        }
                    }
                    _ = cancel.cancelled() => return,
                }
            }
        });
    }
}
