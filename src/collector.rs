use std::collections::HashSet;

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::extractor::selector;
use crate::session::{PageSession, settle};

/// Anchor of a job card title on a search-results page.
pub const JOB_LINK_SEL: &str = r#"a[class*="jcs-JobTitle"]"#;

pub struct ListingMarkers {
    job_link: Selector,
}

impl ListingMarkers {
    pub fn new() -> Result<Self> {
        Ok(Self {
            job_link: selector(JOB_LINK_SEL)?,
        })
    }
}

/// Load one search-results page, scroll it to trigger lazy loading, and
/// return the unique listing links on it (document order). An empty result is
/// not an error.
pub async fn collect_links<S: PageSession>(
    session: &mut S,
    page_url: &str,
    markers: &ListingMarkers,
    cfg: &Config,
) -> Result<Vec<String>> {
    info!(url = page_url, "scraping results page");
    session
        .goto(page_url)
        .await
        .context("results page did not load")?;
    settle(session, &cfg.listing_wait).await;

    for _ in 0..cfg.scroll_steps {
        if let Err(e) = session.scroll_by(cfg.scroll_px).await {
            warn!(url = page_url, error = %e, "scroll failed");
        }
        if !cfg.scroll_pause.is_zero() {
            sleep(cfg.scroll_pause).await;
        }
    }

    let html = session.html().await.context("results page unreadable")?;
    // relative hrefs resolve against where the page landed, not where we asked to go
    let base = session
        .current_url()
        .await
        .unwrap_or_else(|| page_url.to_string());
    let links = parse_listing_links(&html, &base, markers);
    if links.is_empty() {
        warn!(url = page_url, "no job links on page");
    } else {
        info!(url = page_url, links = links.len(), "found job links");
    }
    Ok(links)
}

pub fn parse_listing_links(html: &str, page_url: &str, markers: &ListingMarkers) -> Vec<String> {
    let base = Url::parse(page_url).ok();
    let doc = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for a in doc.select(&markers.job_link) {
        let Some(href) = a.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            continue;
        };
        let Some(link) = resolve(base.as_ref(), href) else {
            continue;
        };
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }
    links
}

// absolute http(s) URL for an href, as a browser's `a.href` would report it
fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let url = match base {
        Some(b) => b.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
