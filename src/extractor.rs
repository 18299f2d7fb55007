use anyhow::{Result, anyhow};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::Config;
use crate::record::{JobRecord, or_sentinel};
use crate::session::{PageSession, settle};

// -------------------------
// Detail page markers
// -------------------------

pub const TITLE_SEL: &str = r#"[class*="e1tiznh50"] span"#;
pub const RATING_SEL: &str = r#"[class*="css-79ia3k"]"#;
pub const LOCATION_SEL: &str = r#"[class*="css-dgqgie"]"#;
pub const PAY_SEL: &str = r#"#salaryInfoAndJobType [class*="eu4oa1w0"]"#;
pub const BENEFITS_SEL: &str = "#benefits";

pub struct DetailMarkers {
    title: Selector,
    rating: Selector,
    location: Selector,
    pay: Selector,
    benefits: Selector,
}

impl DetailMarkers {
    pub fn new() -> Result<Self> {
        Ok(Self {
            title: selector(TITLE_SEL)?,
            rating: selector(RATING_SEL)?,
            location: selector(LOCATION_SEL)?,
            pay: selector(PAY_SEL)?,
            benefits: selector(BENEFITS_SEL)?,
        })
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e:?}"))
}

// -------------------------
// Extraction
// -------------------------

/// Visit one listing and pull its fields. Any fault while loading or reading
/// the page drops the whole listing; field lookups themselves never fail.
pub async fn extract_job<S: PageSession>(
    session: &mut S,
    link: &str,
    markers: &DetailMarkers,
    cfg: &Config,
) -> Option<JobRecord> {
    match load_detail(session, link, cfg).await {
        Ok(html) => Some(parse_job(&html, link, markers)),
        Err(e) => {
            warn!(link, error = %format!("{e:#}"), "skipping listing");
            None
        }
    }
}

async fn load_detail<S: PageSession>(session: &mut S, link: &str, cfg: &Config) -> Result<String> {
    session.goto(link).await?;
    settle(session, &cfg.detail_wait).await;
    session.html().await
}

pub fn parse_job(html: &str, link: &str, m: &DetailMarkers) -> JobRecord {
    let doc = Html::parse_document(html);

    let mut pay = doc.select(&m.pay).map(inline_text);
    let salary = pay.next().filter(|s| !s.is_empty());
    let contract_type = pay.next().filter(|s| !s.is_empty());

    let record = JobRecord {
        title: or_sentinel(locate(&doc, &m.title)),
        rating: or_sentinel(locate(&doc, &m.rating)),
        location: or_sentinel(locate(&doc, &m.location)),
        salary: or_sentinel(salary),
        contract_type: or_sentinel(contract_type),
        benefits: or_sentinel(
            doc.select(&m.benefits)
                .next()
                .map(block_text)
                .filter(|s| !s.is_empty()),
        ),
        link: link.to_string(),
    };
    debug!(link, title = %record.title, "parsed listing");
    record
}

/// Text of the first element matching `sel`, or `None` when nothing matches
/// or the match has no visible text.
pub fn locate(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .map(inline_text)
        .filter(|s| !s.is_empty())
}

fn inline_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

// one line per text run, as a browser renders block children
fn block_text(el: ElementRef) -> String {
    el.text()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
