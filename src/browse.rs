use std::io::Write;
use std::sync::Arc;

use shutter::{FilterSet, PhotoSource};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::GalleryError;
use crate::filters::FilterState;
use crate::output;
use crate::pagination::{PaginationConfig, PaginationController};

/// Limits and output mode for one browse run.
#[derive(Debug, Clone, Copy)]
pub struct BrowseOptions {
    pub max_pages: u32,
    /// Manual retries allowed once a page has used up its automatic attempts.
    pub manual_retries: u32,
    pub json_mode: bool,
}

/// Page through `source` until `max_pages` pages are shown, the feed runs
/// dry or `cancel` fires. Photos are written to `writer` as they arrive.
///
/// Scrolling is simulated by pulsing the controller's sentinel whenever the
/// view settles. A page that still fails after the automatic retries is
/// retried by hand up to `manual_retries` times, then ends the run.
pub async fn run_browse<S: PhotoSource, W: Write>(
    source: Arc<S>,
    filters: FilterSet,
    config: PaginationConfig,
    opts: BrowseOptions,
    writer: &mut W,
    cancel: CancellationToken,
) -> Result<u32, GalleryError> {
    let BrowseOptions {
        max_pages,
        mut manual_retries,
        json_mode,
    } = opts;
    let controller = PaginationController::new(source, config);
    let (visible_tx, visible_rx) = watch::channel(false);
    controller.attach_sentinel(visible_rx);
    let mut views = controller.subscribe();
    let _state = FilterState::new(controller.clone(), filters);

    info!(?filters, max_pages, "browsing");

    let mut buf = String::with_capacity(256);
    let mut written = 0usize;

    let result = loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let view = views.borrow_and_update().clone();

                for photo in view.photos.iter().skip(written) {
                    output::write_photo(photo, json_mode, &mut buf, writer)?;
                }
                written = written.max(view.photos.len());

                if view.loading || view.refreshing {
                    continue;
                }
                if let Some(err) = view.error {
                    if manual_retries == 0 {
                        break Err(GalleryError::Browse(err));
                    }
                    manual_retries -= 1;
                    warn!(page = view.page, error = %err, remaining = manual_retries, "retrying page");
                    controller.retry();
                    continue;
                }
                if !view.has_more {
                    info!(page = view.page, photos = written, "feed exhausted");
                    break Ok(());
                }
                if view.page >= max_pages {
                    debug!(page = view.page, "page limit reached");
                    break Ok(());
                }
                // Scroll the sentinel out of view and back in.
                visible_tx.send_replace(false);
                visible_tx.send_replace(true);
            }
            _ = cancel.cancelled() => {
                info!("browse cancelled");
                break Ok(());
            }
        }
    };

    controller.close();
    if let Err(e) = &result {
        warn!(error = %e, "browse failed");
    }
    result.map(|()| written as u32)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use shutter::{PageRequest, Photo, PhotoPage, PhotoUrls, ShutterError};

    use super::*;

    /// Serves `pages` full pages, then an empty one. Fails every call when
    /// `fail` is set.
    struct PagedSource {
        pages: u32,
        fail: bool,
        calls: AtomicUsize,
    }

    impl PagedSource {
        fn new(pages: u32) -> Arc<Self> {
            Arc::new(Self {
                pages,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl PhotoSource for PagedSource {
        async fn list(&self, request: &PageRequest) -> shutter::Result<PhotoPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ShutterError::Upstream("provider down".into()));
            }
            if request.page > self.pages {
                return Ok(PhotoPage::default());
            }
            let items = (0..request.page_size)
                .map(|i| Photo {
                    id: format!("{}-{i}", request.page),
                    urls: PhotoUrls {
                        regular: Some(format!("https://img/{}-{i}", request.page)),
                        ..Default::default()
                    },
                    alt_description: None,
                    description: None,
                    author: None,
                    width: None,
                    height: None,
                    likes: None,
                    downloads: None,
                    views: None,
                    created_at: None,
                    color: None,
                })
                .collect();
            Ok(PhotoPage { items, total: 0 })
        }
    }

    fn config() -> PaginationConfig {
        PaginationConfig {
            page_size: 2,
            ..Default::default()
        }
    }

    fn opts(max_pages: u32, manual_retries: u32) -> BrowseOptions {
        BrowseOptions {
            max_pages,
            manual_retries,
            json_mode: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_page_limit() {
        let source = PagedSource::new(10);
        let mut out = Vec::new();
        let n = run_browse(
            Arc::clone(&source),
            FilterSet::default(),
            config(),
            opts(2, 0),
            &mut out,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(n, 4);
        let text = String::from_utf8(out).unwrap();
        let ids: Vec<&str> = text.lines().map(|l| l.split('\t').next().unwrap()).collect();
        assert_eq!(ids, vec!["1-0", "1-1", "2-0", "2-1"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_feed_runs_dry() {
        let source = PagedSource::new(1);
        let mut out = Vec::new();
        let n = run_browse(
            source,
            FilterSet::default(),
            config(),
            BrowseOptions {
                json_mode: true,
                ..opts(5, 0)
            },
            &mut out,
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(n, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_end_with_error() {
        let source = Arc::new(PagedSource {
            pages: 1,
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let mut out = Vec::new();
        let started = tokio::time::Instant::now();
        let err = run_browse(
            Arc::clone(&source),
            FilterSet::default(),
            config(),
            opts(5, 0),
            &mut out,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GalleryError::Browse(ref m) if m.contains("provider down")));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(6));
        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_retry_restarts_attempt_budget() {
        let source = Arc::new(PagedSource {
            pages: 1,
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let mut out = Vec::new();
        let err = run_browse(
            Arc::clone(&source),
            FilterSet::default(),
            config(),
            opts(5, 1),
            &mut out,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GalleryError::Browse(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_browsing() {
        let source = PagedSource::new(10);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        run_browse(source, FilterSet::default(), config(), opts(5, 0), &mut out, cancel)
            .await
            .unwrap();
    }
}
