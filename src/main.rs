mod chrome;
mod collector;
mod config;
mod extractor;
mod http;
mod record;
mod run;
mod session;
mod store;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::chrome::ChromeSession;
use crate::config::{Config, SessionKind};
use crate::http::HttpSession;
use crate::run::{RunSummary, run_and_close};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env();
    info!(seed = %cfg.seed_url, session = ?cfg.session, "starting jobclaw");

    // A session that cannot start is the one fatal error: nothing was scraped yet.
    let summary = match cfg.session {
        SessionKind::Chrome => {
            let mut session = ChromeSession::launch(&cfg).await?;
            run_and_close(&mut session, &cfg).await
        }
        SessionKind::Http => run_and_close(&mut HttpSession::new()?, &cfg).await,
    };

    report(summary)
}

fn report(summary: Result<RunSummary>) -> Result<()> {
    let summary = summary?;
    info!(
        links = summary.links,
        scraped = summary.scraped,
        output = ?summary.final_path,
        "scraping completed"
    );
    Ok(())
}
