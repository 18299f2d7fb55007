use anyhow::{Context, Result, anyhow};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::session::PageSession;

/// A visible Chromium driven over CDP, using a persistent profile so cookies
/// and consent state survive between runs.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    closed: bool,
}

impl ChromeSession {
    pub async fn launch(cfg: &Config) -> Result<Self> {
        std::fs::create_dir_all(&cfg.profile_dir).with_context(|| {
            format!("cannot create profile dir {}", cfg.profile_dir.display())
        })?;

        let browser_cfg = BrowserConfig::builder()
            .with_head()
            .disable_default_args()
            .user_data_dir(&cfg.profile_dir)
            .args(launch_args(cfg))
            .build()
            .map_err(|e| anyhow!("invalid browser config: {e}"))?;

        info!(profile = %cfg.profile_dir.display(), "launching chromium");
        let (browser, mut events) = Browser::launch(browser_cfg)
            .await
            .context("failed to launch chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "cdp handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open a tab")?;

        Ok(Self {
            browser,
            page,
            handler,
            closed: false,
        })
    }
}

// chromiumoxide's stock flags minus `--enable-automation` (sets
// navigator.webdriver) and its `--lang=en_US`.
const QUIET_DEFAULTS: &[&str] = &[
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--metrics-recording-only",
    "--no-first-run",
    "--password-store=basic",
    "--use-mock-keychain",
];

fn launch_args(cfg: &Config) -> Vec<String> {
    let mut args: Vec<String> = QUIET_DEFAULTS.iter().map(|a| a.to_string()).collect();
    args.extend([
        "--profile-directory=Default".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--lang=en-US".to_string(),
        "--start-maximized".to_string(),
        format!("--user-agent={}", cfg.user_agent),
    ]);
    args
}

impl PageSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        Ok(())
    }

    async fn scroll_by(&mut self, px: i64) -> Result<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {px});"))
            .await
            .context("scroll failed")?;
        Ok(())
    }

    async fn html(&mut self) -> Result<String> {
        // outerHTML reflects client-side mutations more reliably than Page::content.
        if let Ok(val) = self.page.evaluate("document.documentElement.outerHTML").await {
            if let Ok(html) = val.into_value::<String>() {
                if !html.is_empty() {
                    return Ok(html);
                }
            }
        }
        self.page.content().await.context("failed to read page content")
    }

    async fn current_url(&mut self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        info!("closing browser");
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("browser session dropped without close; killing handler");
            self.handler.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_args_hide_automation_and_keep_one_locale() {
        let args = launch_args(&Config::default());
        assert!(!args.iter().any(|a| a == "--enable-automation"));
        let langs: Vec<_> = args.iter().filter(|a| a.starts_with("--lang=")).collect();
        assert_eq!(langs, ["--lang=en-US"]);
        assert!(args.iter().any(|a| a == "--disable-blink-features=AutomationControlled"));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=Mozilla/5.0")));
    }
}
