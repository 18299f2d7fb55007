use anyhow::Result;
use scraper::{Html, Selector};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::config::WaitPolicy;

/// One live page the scraper drives. The entry point owns the session and
/// lends it out by `&mut`; exactly one page is ever open.
#[allow(async_fn_in_trait)]
pub trait PageSession {
    /// Navigate the page to `url`. Errors are navigation faults.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Scroll the viewport down by `px` pixels.
    async fn scroll_by(&mut self, px: i64) -> Result<()>;

    /// The current rendered document.
    async fn html(&mut self) -> Result<String>;

    /// Where the page ended up after redirects, if a page is loaded.
    async fn current_url(&mut self) -> Option<String>;

    /// Release the underlying browser/client. Called once, at the end of a run.
    async fn close(&mut self) -> Result<()>;
}

/// Let a freshly navigated page render according to `policy`.
pub async fn settle<S: PageSession>(session: &mut S, policy: &WaitPolicy) {
    match policy {
        WaitPolicy::Fixed(d) => {
            if !d.is_zero() {
                sleep(*d).await;
            }
        }
        WaitPolicy::UntilPresent {
            selector,
            timeout,
            interval,
        } => {
            let sel = match Selector::parse(selector) {
                Ok(s) => s,
                Err(e) => {
                    warn!(selector = %selector, error = ?e, "bad readiness selector, not waiting");
                    return;
                }
            };
            let deadline = Instant::now() + *timeout;
            loop {
                match session.html().await {
                    Ok(html) if has_match(&html, &sel) => return,
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "page not readable yet"),
                }
                if Instant::now() >= deadline {
                    debug!(selector = %selector, ?timeout, "readiness timeout, reading page as-is");
                    return;
                }
                sleep(*interval).await;
            }
        }
    }
}

fn has_match(html: &str, sel: &Selector) -> bool {
    Html::parse_document(html).select(sel).next().is_some()
}

// -------------------------
// In-memory session for tests
// -------------------------


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::fake::FakeSession;
    use super::*;

    #[tokio::test]
    async fn until_present_returns_once_marker_renders() {
        let mut s = FakeSession::new().page("https://x/", r#"<div id="benefits">ok</div>"#);
        s.goto("https://x/").await.unwrap();
        let policy = WaitPolicy::UntilPresent {
            selector: "#benefits".into(),
            timeout: Duration::from_secs(5),
            interval: Duration::from_millis(1),
        };
        settle(&mut s, &policy).await;
        assert_eq!(s.html_reads, 1);
    }

    #[tokio::test]
    async fn until_present_gives_up_after_timeout() {
        let mut s = FakeSession::new().page("https://x/", "<p>still loading</p>");
        s.goto("https://x/").await.unwrap();
        let policy = WaitPolicy::UntilPresent {
            selector: "#benefits".into(),
            timeout: Duration::from_millis(20),
            interval: Duration::from_millis(5),
        };
        settle(&mut s, &policy).await;
        assert!(s.html_reads >= 2);
    }

    #[tokio::test]
    async fn bad_selector_does_not_poll() {
        let mut s = FakeSession::new().page("https://x/", "<p></p>");
        let policy = WaitPolicy::UntilPresent {
            selector: "[[[".into(),
            timeout: Duration::from_secs(1),
            interval: Duration::from_millis(1),
        };
        settle(&mut s, &policy).await;
        assert_eq!(s.html_reads, 0);
    }
}
