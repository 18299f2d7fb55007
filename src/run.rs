use std::{collections::HashSet, path::PathBuf};

use anyhow::Result;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::collector::{ListingMarkers, collect_links};
use crate::config::Config;
use crate::extractor::{DetailMarkers, extract_job};
use crate::record::JobRecord;
use crate::session::PageSession;
use crate::store;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Unique listing links found across all result pages.
    pub links: usize,
    pub scraped: usize,
    pub final_path: Option<PathBuf>,
}

/// Run the whole scrape on `session`, then release it whatever happened.
pub async fn run_and_close<S: PageSession>(session: &mut S, cfg: &Config) -> Result<RunSummary> {
    let outcome = run(session, cfg).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to release session");
    }
    outcome
}

pub async fn run<S: PageSession>(session: &mut S, cfg: &Config) -> Result<RunSummary> {
    let listing = ListingMarkers::new()?;
    let detail = DetailMarkers::new()?;

    let links = gather_links(session, &listing, cfg).await;
    info!(links = links.len(), "total unique job links collected");

    let records = scrape_details(session, &links, &detail, cfg, |recs| {
        match store::write_records(&cfg.progress_file, recs) {
            Ok(()) => info!(records = recs.len(), path = %cfg.progress_file.display(), "progress saved"),
            Err(e) => warn!(error = %format!("{e:#}"), "progress save failed"),
        }
    })
    .await;

    let mut summary = RunSummary {
        links: links.len(),
        scraped: records.len(),
        final_path: None,
    };

    if records.is_empty() {
        warn!("no job data was collected");
        return Ok(summary);
    }

    store::write_records(&cfg.complete_file, &records)?;
    info!(
        records = records.len(),
        path = %cfg.complete_file.display(),
        "all job data saved"
    );
    match store::remove_if_exists(&cfg.progress_file) {
        Ok(true) => info!(path = %cfg.progress_file.display(), "progress file removed"),
        Ok(false) => {}
        Err(e) => warn!(error = %format!("{e:#}"), "could not remove progress file"),
    }
    summary.final_path = Some(cfg.complete_file.clone());
    Ok(summary)
}

// -------------------------
// Phase 1 + 2: results pages -> unique links
// -------------------------

async fn gather_links<S: PageSession>(
    session: &mut S,
    markers: &ListingMarkers,
    cfg: &Config,
) -> Vec<String> {
    let mut all = Vec::new();

    match collect_links(session, &cfg.seed_url, markers, cfg).await {
        Ok(links) => all.extend(links),
        Err(e) => error!(url = %cfg.seed_url, error = %format!("{e:#}"), "seed page failed"),
    }

    for url in supplementary_pages(cfg) {
        match collect_links(session, &url, markers, cfg).await {
            Ok(links) => all.extend(links),
            Err(e) => error!(url = %url, error = %format!("{e:#}"), "results page failed"),
        }
        if !cfg.page_pause.is_zero() {
            sleep(cfg.page_pause).await;
        }
    }

    dedup(all)
}

fn supplementary_pages(cfg: &Config) -> Vec<String> {
    let path = &cfg.links_file;
    if !path.exists() {
        warn!(path = %path.display(), "links file not found, using seed page only");
        return Vec::new();
    }
    match store::read_page_urls(path) {
        Ok(urls) => {
            info!(path = %path.display(), pages = urls.len(), "additional pages to scrape");
            urls
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "cannot read links file, skipping it");
            Vec::new()
        }
    }
}

/// Keep the first occurrence of every link.
fn dedup(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(links.len());
    links.into_iter().filter(|l| seen.insert(l.clone())).collect()
}

// -------------------------
// Phase 3: per-listing extraction with checkpoints
// -------------------------

/// Extract every link in order. `on_checkpoint` sees the records gathered so
/// far after every `cfg.checkpoint_every`-th attempt, failed attempts included.
pub async fn scrape_details<S, F>(
    session: &mut S,
    links: &[String],
    markers: &DetailMarkers,
    cfg: &Config,
    mut on_checkpoint: F,
) -> Vec<JobRecord>
where
    S: PageSession,
    F: FnMut(&[JobRecord]),
{
    let total = links.len();
    let mut records = Vec::new();

    for (i, link) in links.iter().enumerate() {
        let n = i + 1;
        info!(n, total, link = %link, "scraping job");

        if let Some(r) = extract_job(session, link, markers, cfg).await {
            records.push(r);
        }

        if !cfg.detail_pause.is_zero() {
            sleep(cfg.detail_pause).await;
        }

        if cfg.checkpoint_every > 0 && n % cfg.checkpoint_every == 0 {
            on_checkpoint(&records);
        }
    }
    records
}
