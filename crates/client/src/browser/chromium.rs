//! Chromium implementation of [`PageFetcher`] using chromiumoxide.

use std::path::Path;
use std::time::{Duration, Instant};

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, SetLifecycleEventsEnabledParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chrono::Utc;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use url::Url;

use super::{BrowserOptions, FetchError, PageFetcher, PageSnapshot, extract_metadata, parse_target};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Long-lived Chromium session that opens one page per fetch.
///
/// Call [`BrowserFetcher::close`] to shut the browser down cleanly; dropping
/// the fetcher only stops the event handler task.
pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    options: BrowserOptions,
}

impl BrowserFetcher {
    /// Launch a browser instance.
    ///
    /// Chrome DevTools Protocol events are pumped on a background task for
    /// the lifetime of the fetcher.
    pub async fn launch(options: BrowserOptions) -> Result<Self, FetchError> {
        let (width, height) = options.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .request_timeout(options.navigation_timeout);
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(FetchError::BrowserLaunch)?;

        let (browser, mut handler) =
            Browser::launch(config).await.map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        tracing::info!(headless = options.headless, "browser launched");
        Ok(Self { browser, handler, options })
    }

    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    /// Close the browser and wait for the process to exit.
    pub async fn close(mut self) -> Result<(), FetchError> {
        self.browser.close().await.map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!(error = %e, "browser process did not exit cleanly");
        }
        tracing::info!("browser closed");
        Ok(())
    }

    /// Load `url` and write a full-page PNG screenshot to `path`.
    pub async fn screenshot(&self, url: &str, path: &Path) -> Result<(), FetchError> {
        let target = parse_target(url)?;
        let guard = self.open_page().await?;

        let outcome = async {
            self.navigate(guard.page(), &target).await?;
            save_screenshot(guard.page(), path).await
        }
        .await;

        guard.close().await;
        outcome?;
        tracing::debug!(url = %target, path = %path.display(), "screenshot saved");
        Ok(())
    }

    /// Like [`PageFetcher::fetch_page`], also saving a full-page PNG of the
    /// same loaded page to `path`.
    ///
    /// A failed screenshot is logged and leaves [`PageSnapshot::screenshot`]
    /// unset; it does not fail the fetch.
    pub async fn fetch_with_screenshot(
        &self, url: &str, wait_for: Option<&str>, path: &Path,
    ) -> Result<PageSnapshot, FetchError> {
        self.fetch(url, wait_for, Some(path)).await
    }

    async fn fetch(&self, url: &str, wait_for: Option<&str>, screenshot: Option<&Path>) -> Result<PageSnapshot, FetchError> {
        let target = parse_target(url)?;
        let start = Instant::now();

        let guard = self.open_page().await?;
        let outcome = async {
            let mut snapshot = self.capture(guard.page(), &target, wait_for).await?;
            if let Some(path) = screenshot {
                match save_screenshot(guard.page(), path).await {
                    Ok(()) => snapshot.screenshot = Some(path.to_path_buf()),
                    Err(e) => tracing::warn!(url = %target, error = %e, "screenshot failed"),
                }
            }
            Ok::<PageSnapshot, FetchError>(snapshot)
        }
        .await;
        guard.close().await;

        let mut snapshot = outcome?;
        snapshot.fetch_ms = millis(start.elapsed());
        tracing::debug!(url = %snapshot.url, final_url = %snapshot.final_url, fetch_ms = snapshot.fetch_ms, "page fetched");
        Ok(snapshot)
    }

    async fn open_page(&self) -> Result<PageGuard, FetchError> {
        if self.handler.is_finished() {
            return Err(FetchError::BrowserClosed);
        }
        let page = self.browser.new_page("about:blank").await.map_err(|e| FetchError::Navigation(e.to_string()))?;
        Ok(PageGuard::new(page))
    }

    /// Navigate and wait for the main frame to go network idle, all within
    /// the navigation budget.
    async fn navigate(&self, page: &Page, target: &Url) -> Result<(), FetchError> {
        let budget = self.options.navigation_timeout;
        let load = async {
            page.execute(SetLifecycleEventsEnabledParams::new(true)).await?;
            let mut events = page.event_listener::<EventLifecycleEvent>().await?;
            let mut idle = NetworkIdle::new(page.mainframe().await?.map(|frame| frame.inner().clone()));

            page.goto(target.as_str()).await?;

            while let Some(event) = events.next().await {
                if idle.observe(event.frame_id.inner(), event.loader_id.inner(), &event.name) {
                    return Ok(());
                }
            }
            Err(FetchError::BrowserClosed)
        };

        match tokio::time::timeout(budget, load).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout { stage: "navigation", ms: millis(budget) }),
        }
    }

    async fn wait_for_selector(&self, page: &Page, selector: &str) -> Result<(), FetchError> {
        let budget = self.options.wait_timeout;
        let poll = async {
            while page.find_element(selector).await.is_err() {
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(budget, poll)
            .await
            .map_err(|_| FetchError::SelectorNotFound { selector: selector.to_string(), ms: millis(budget) })
    }

    async fn capture(&self, page: &Page, target: &Url, wait_for: Option<&str>) -> Result<PageSnapshot, FetchError> {
        self.navigate(page, target).await?;

        if let Some(selector) = wait_for {
            self.wait_for_selector(page, selector).await?;
        }

        let title = page
            .get_title()
            .await
            .map_err(|e| FetchError::ContentRetrieval(e.to_string()))?
            .unwrap_or_default();

        let content = page.content().await.map_err(|e| FetchError::ContentRetrieval(e.to_string()))?;

        let text = page
            .find_element("body")
            .await
            .map_err(|e| FetchError::ContentRetrieval(e.to_string()))?
            .inner_text()
            .await
            .map_err(|e| FetchError::ContentRetrieval(e.to_string()))?
            .unwrap_or_default();

        let final_url = page
            .url()
            .await
            .map_err(|e| FetchError::ContentRetrieval(e.to_string()))?
            .unwrap_or_else(|| target.to_string());

        let metadata = extract_metadata(&content);

        Ok(PageSnapshot {
            url: target.to_string(),
            final_url,
            title,
            content,
            text,
            metadata,
            fetched_at: Utc::now(),
            fetch_ms: 0,
            screenshot: None,
        })
    }
}

#[async_trait::async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_page(&self, url: &str, wait_for: Option<&str>) -> Result<PageSnapshot, FetchError> {
        self.fetch(url, wait_for, None).await
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Closes its page when dropped, so cancelled or failed fetches never leak tabs.
struct PageGuard {
    page: Page,
    closed: bool,
}

impl PageGuard {
    fn new(page: Page) -> Self {
        Self { page, closed: false }
    }

    fn page(&self) -> &Page {
        &self.page
    }

    async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!("page close failed: {e}");
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                page.close().await.ok();
            });
        }
    }
}

async fn save_screenshot(page: &Page, path: &Path) -> Result<(), FetchError> {
    let params = ScreenshotParams::builder().full_page(true).build();
    page.save_screenshot(params, path).await.map_err(|e| FetchError::Screenshot(e.to_string()))?;
    Ok(())
}

impl From<CdpError> for FetchError {
    fn from(err: CdpError) -> Self {
        FetchError::Navigation(err.to_string())
    }
}

/// Tracks page lifecycle events until the navigation's document goes
/// network idle (no requests in flight for 500ms).
///
/// Chromium replays lifecycle events of the current document when they are
/// enabled, so an idle event only counts once an `init` for a new document
/// has been seen on the main frame.
#[derive(Debug)]
struct NetworkIdle {
    main_frame: Option<String>,
    loader: Option<String>,
}

impl NetworkIdle {
    fn new(main_frame: Option<String>) -> Self {
        Self { main_frame, loader: None }
    }

    /// Feed one event; true once the main frame's new document is idle.
    fn observe(&mut self, frame_id: &str, loader_id: &str, name: &str) -> bool {
        if self.main_frame.as_deref().is_some_and(|main| main != frame_id) {
            return false;
        }
        match name {
            "init" => {
                self.loader = Some(loader_id.to_string());
                false
            }
            "networkIdle" => self.loader.as_deref() == Some(loader_id),
            _ => false,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
