//! Rasterization of assembled documents through headless Chrome/Chromium
//!
//! One browser is launched per call and torn down before returning, on every
//! exit path. There is no pooling: concurrent renders run independent
//! browser processes.
//!
//! Each call runs against a single [`Deadline`]. Every browser step gets only
//! the time left on it, and once it has passed the call returns
//! [`RasterError::DeadlineExceeded`], dropping the session and with it the
//! browser process.

use std::ffi::OsStr;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use thiserror::Error;

use crate::document::ChartDocument;

/// Element the rasterizer waits for before capturing
const CHART_SELECTOR: &str = "#timeline";
/// Element whose full extent is captured
const ROOT_SELECTOR: &str = "#chart-root";

/// Rasterization error
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Document load failed: {0}")]
    Load(String),

    #[error("Screenshot capture failed: {0}")]
    Capture(String),

    #[error("Render deadline passed")]
    DeadlineExceeded,
}

/// Point in time by which a rasterization must be finished
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    /// Deadline `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Time left, or [`RasterError::DeadlineExceeded`] once none is
    pub fn remaining(&self) -> Result<Duration, RasterError> {
        let left = self.0.saturating_duration_since(Instant::now());
        if left.is_zero() {
            Err(RasterError::DeadlineExceeded)
        } else {
            Ok(left)
        }
    }
}

/// Turns an assembled document into PNG bytes before `deadline`
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, document: &ChartDocument, deadline: Deadline)
        -> Result<Vec<u8>, RasterError>;
}

/// Headless Chrome rasterizer configuration
#[derive(Clone, Debug)]
pub struct ChromeRasterizer {
    /// Browser binary; autodetected when `None`
    pub chrome_path: Option<PathBuf>,
    /// Run Chrome with its sandbox (disable inside unprivileged containers)
    pub sandbox: bool,
    /// Extra pixels added to the window beyond the document estimate
    pub window_margin: u32,
}

impl Default for ChromeRasterizer {
    fn default() -> Self {
        Self {
            chrome_path: None,
            sandbox: true,
            window_margin: 64,
        }
    }
}

impl ChromeRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific Chrome/Chromium binary
    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Launch Chrome with `--no-sandbox`
    pub fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Browser window size for a document, so the whole chart is laid out
    /// without scrolling
    fn window_size(&self, document: &ChartDocument) -> (u32, u32) {
        (
            document.width + self.window_margin,
            document.height + self.window_margin,
        )
    }

    fn launch_options(
        &self,
        document: &ChartDocument,
        deadline: Deadline,
    ) -> Result<LaunchOptions<'static>, RasterError> {
        LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.sandbox)
            .window_size(Some(self.window_size(document)))
            .path(self.chrome_path.clone())
            .idle_browser_timeout(deadline.remaining()?)
            .args(vec![OsStr::new("--hide-scrollbars")])
            .build()
            .map_err(|e| RasterError::Launch(e.to_string()))
    }
}

/// Browser process and tab for one render, released on drop
struct BrowserSession {
    // Field order matters: the tab handle goes before the browser that owns it.
    tab: Arc<Tab>,
    browser: Browser,
    deadline: Deadline,
    started: Instant,
}

impl BrowserSession {
    fn launch(options: LaunchOptions<'static>, deadline: Deadline) -> Result<Self, RasterError> {
        let started = Instant::now();
        let browser = Browser::new(options).map_err(|e| RasterError::Launch(e.to_string()))?;
        deadline.remaining()?;
        let tab = browser
            .new_tab()
            .map_err(|e| RasterError::Launch(e.to_string()))?;
        tracing::debug!(pid = ?browser.get_process_id(), "browser session started");
        Ok(Self {
            tab,
            browser,
            deadline,
            started,
        })
    }

    /// Tab with its wait timeout cut to the time left before the deadline
    fn step(&self) -> Result<&Arc<Tab>, RasterError> {
        let left = self.deadline.remaining()?;
        self.tab.set_default_timeout(left);
        Ok(&self.tab)
    }

    /// A failed step after the deadline is reported as the deadline
    fn failure(&self, kind: fn(String) -> RasterError, error: &impl Display) -> RasterError {
        if self.deadline.is_expired() {
            RasterError::DeadlineExceeded
        } else {
            kind(error.to_string())
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        tracing::debug!(
            pid = ?self.browser.get_process_id(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            deadline_passed = self.deadline.is_expired(),
            "browser session released"
        );
    }
}

impl Rasterizer for ChromeRasterizer {
    fn rasterize(
        &self,
        document: &ChartDocument,
        deadline: Deadline,
    ) -> Result<Vec<u8>, RasterError> {
        deadline.remaining()?;
        // The temp file and the browser are both scoped to this call.
        let mut page = tempfile::Builder::new()
            .prefix("mxchart-")
            .suffix(".html")
            .tempfile()?;
        std::io::Write::write_all(&mut page, document.html.as_bytes())?;
        let url = format!("file://{}", page.path().display());

        let session = BrowserSession::launch(self.launch_options(document, deadline)?, deadline)?;

        session
            .step()?
            .navigate_to(&url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| session.failure(RasterError::Load, &e))?;
        session
            .step()?
            .wait_for_element(CHART_SELECTOR)
            .map_err(|e| session.failure(RasterError::Load, &e))?;

        let root = session
            .step()?
            .wait_for_element(ROOT_SELECTOR)
            .map_err(|e| session.failure(RasterError::Load, &e))?;
        deadline.remaining()?;
        let clip = root
            .get_box_model()
            .map_err(|e| session.failure(RasterError::Capture, &e))?
            .margin_viewport();

        let png = session
            .step()?
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| session.failure(RasterError::Capture, &e))?;

        tracing::debug!(bytes = png.len(), columns = document.columns, "captured chart");
        Ok(png)
    }
}
