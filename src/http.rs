use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use rand::{Rng, rng};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, HeaderMap, HeaderName, HeaderValue, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use tracing::debug;

use crate::session::PageSession;

/// Plain-HTTP stand-in for the browser, for result pages that are rendered
/// server-side. No script runs, so scrolling does nothing.
pub struct HttpSession {
    client: reqwest::Client,
    current: Option<String>,
    body: String,
}

impl HttpSession {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(8))
            .timeout(Duration::from_secs(25))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            current: None,
            body: String::new(),
        })
    }
}

impl PageSession for HttpSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        let referer = self.current.take().unwrap_or_else(|| origin_of(url));
        self.body.clear();

        let rsp = self
            .client
            .get(url)
            .headers(base_headers(&referer))
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = rsp.status();
        let final_url = rsp.url().to_string();
        if !status.is_success() {
            debug!(url, %status, final_url, "fetch rejected");
            return Err(anyhow!("GET {url} -> {status}"));
        }
        let text = rsp
            .text()
            .await
            .with_context(|| format!("reading body of {url} failed"))?;
        debug!(url, %status, final_url, len = text.len(), "fetched");

        self.current = Some(final_url);
        self.body = text;
        Ok(())
    }

    async fn scroll_by(&mut self, _px: i64) -> Result<()> {
        Ok(())
    }

    async fn html(&mut self) -> Result<String> {
        if self.current.is_none() {
            return Err(anyhow!("no page loaded"));
        }
        Ok(self.body.clone())
    }

    async fn current_url(&mut self) -> Option<String> {
        self.current.clone()
    }

    async fn close(&mut self) -> Result<()> {
        self.current = None;
        self.body.clear();
        Ok(())
    }
}

fn origin_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_default()
}

fn base_headers(referer: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    if let Ok(ua) = HeaderValue::from_str(random_desktop_ua()) {
        h.insert(USER_AGENT, ua);
    }
    h.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en-US;q=0.9,en;q=0.8"));
    if let Ok(r) = HeaderValue::from_str(referer) {
        h.insert(REFERER, r);
    }
    h.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    h.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    h.insert(DNT, HeaderValue::from_static("1"));
    h.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    h.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    h
}

fn random_desktop_ua() -> &'static str {
    const UAS: &[&str] = &[
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    ];
    UAS[rng().random_range(0..UAS.len())]
}
