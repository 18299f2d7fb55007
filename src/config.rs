use std::{env, path::PathBuf, time::Duration};

use crate::collector::JOB_LINK_SEL;
use crate::extractor::TITLE_SEL;

// -------------------------
// Compiled-in defaults
// -------------------------

pub const SEED_URL: &str =
    "https://uk.indeed.com/jobs?q=data+engineer&l=London+East%2C+Greater+London&radius=100";

pub const LINKS_FILE: &str = "links.csv";
pub const PROGRESS_FILE: &str = "indeed_jobs_progress.csv";
pub const COMPLETE_FILE: &str = "indeed_jobs_complete.csv";
pub const PROFILE_DIR: &str = "scraping_profile";

pub const LISTING_SETTLE: Duration = Duration::from_secs(20);
pub const DETAIL_SETTLE: Duration = Duration::from_secs(5);
pub const SCROLL_STEPS: usize = 3;
pub const SCROLL_PX: i64 = 1000;
pub const SCROLL_PAUSE: Duration = Duration::from_secs(3);
pub const PAGE_PAUSE: Duration = Duration::from_secs(5); // between supplementary pages
pub const DETAIL_PAUSE: Duration = Duration::from_secs(2);
pub const CHECKPOINT_EVERY: usize = 10;
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub const DESKTOP_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// How long to let a freshly navigated page render before reading it.
#[derive(Clone, Debug, PartialEq)]
pub enum WaitPolicy {
    Fixed(Duration),
    /// Poll the rendered document until `selector` matches or `timeout`
    /// elapses. A timeout is not an error; extraction proceeds on whatever
    /// rendered.
    UntilPresent {
        selector: String,
        timeout: Duration,
        interval: Duration,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionKind {
    Chrome,
    Http,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub seed_url: String,
    pub links_file: PathBuf,
    pub progress_file: PathBuf,
    pub complete_file: PathBuf,
    pub profile_dir: PathBuf,
    pub session: SessionKind,
    pub user_agent: String,

    pub listing_wait: WaitPolicy,
    pub detail_wait: WaitPolicy,
    pub scroll_steps: usize,
    pub scroll_px: i64,
    pub scroll_pause: Duration,
    pub page_pause: Duration,
    pub detail_pause: Duration,
    pub checkpoint_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_url: SEED_URL.to_string(),
            links_file: PathBuf::from(LINKS_FILE),
            progress_file: PathBuf::from(PROGRESS_FILE),
            complete_file: PathBuf::from(COMPLETE_FILE),
            profile_dir: PathBuf::from(PROFILE_DIR),
            session: SessionKind::Chrome,
            user_agent: DESKTOP_UA.to_string(),
            listing_wait: WaitPolicy::Fixed(LISTING_SETTLE),
            detail_wait: WaitPolicy::Fixed(DETAIL_SETTLE),
            scroll_steps: SCROLL_STEPS,
            scroll_px: SCROLL_PX,
            scroll_pause: SCROLL_PAUSE,
            page_pause: PAGE_PAUSE,
            detail_pause: DETAIL_PAUSE,
            checkpoint_every: CHECKPOINT_EVERY,
        }
    }
}

impl Config {
    /// Defaults, with the handful of deployment knobs taken from the
    /// environment when set.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(url) = non_empty_var("JOBCLAW_SEED_URL") {
            cfg = cfg.with_seed_url(url);
        }
        if let Some(path) = non_empty_var("JOBCLAW_LINKS_FILE") {
            cfg = cfg.with_links_file(path);
        }
        if let Some(dir) = non_empty_var("JOBCLAW_OUTPUT_DIR") {
            cfg = cfg.with_output_dir(dir);
        }
        if let Some(dir) = non_empty_var("JOBCLAW_PROFILE_DIR") {
            cfg.profile_dir = PathBuf::from(dir);
        }
        if let Some(kind) = non_empty_var("JOBCLAW_SESSION") {
            match kind.to_ascii_lowercase().as_str() {
                "http" => cfg.session = SessionKind::Http,
                "chrome" => cfg.session = SessionKind::Chrome,
                other => tracing::warn!(session = other, "unknown JOBCLAW_SESSION, using chrome"),
            }
        }
        match non_empty_var("JOBCLAW_WAIT").map(|w| w.to_ascii_lowercase()).as_deref() {
            Some("poll") => cfg = cfg.with_polling(),
            Some("none") => cfg = cfg.without_delays(),
            Some("fixed") | None => {}
            Some(other) => tracing::warn!(wait = other, "unknown JOBCLAW_WAIT, using fixed delays"),
        }
        cfg
    }

    /// Place both output files under `dir`, keeping their file names.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.progress_file = dir.join(PROGRESS_FILE);
        self.complete_file = dir.join(COMPLETE_FILE);
        self
    }

    pub fn with_seed_url(mut self, url: impl Into<String>) -> Self {
        self.seed_url = url.into();
        self
    }

    pub fn with_links_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.links_file = path.into();
        self
    }

    /// Zero every pause and fixed wait.
    pub fn without_delays(mut self) -> Self {
        self.listing_wait = WaitPolicy::Fixed(Duration::ZERO);
        self.detail_wait = WaitPolicy::Fixed(Duration::ZERO);
        self.scroll_pause = Duration::ZERO;
        self.page_pause = Duration::ZERO;
        self.detail_pause = Duration::ZERO;
        self
    }

    pub fn with_wait_policies(mut self, listing: WaitPolicy, detail: WaitPolicy) -> Self {
        self.listing_wait = listing;
        self.detail_wait = detail;
        self
    }

    /// Replace the fixed settle delays with polling for the job-card link and
    /// the job title, bounded by the same durations.
    pub fn with_polling(self) -> Self {
        self.with_wait_policies(
            WaitPolicy::UntilPresent {
                selector: JOB_LINK_SEL.to_string(),
                timeout: LISTING_SETTLE,
                interval: POLL_INTERVAL,
            },
            WaitPolicy::UntilPresent {
                selector: TITLE_SEL.to_string(),
                timeout: DETAIL_SETTLE,
                interval: POLL_INTERVAL,
            },
        )
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_compiled_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.seed_url, SEED_URL);
        assert_eq!(cfg.checkpoint_every, 10);
        assert_eq!(cfg.scroll_steps, 3);
        assert_eq!(cfg.listing_wait, WaitPolicy::Fixed(Duration::from_secs(20)));
        assert_eq!(cfg.detail_wait, WaitPolicy::Fixed(Duration::from_secs(5)));
        assert_eq!(cfg.session, SessionKind::Chrome);
    }

    #[test]
    fn output_dir_keeps_file_names() {
        let cfg = Config::default().with_output_dir("/tmp/out");
        assert_eq!(cfg.progress_file, PathBuf::from("/tmp/out").join(PROGRESS_FILE));
        assert_eq!(cfg.complete_file, PathBuf::from("/tmp/out").join(COMPLETE_FILE));
    }

    #[test]
    fn polling_is_bounded_by_the_fixed_delays() {
        let cfg = Config::default().with_polling();
        match cfg.detail_wait {
            WaitPolicy::UntilPresent { timeout, ref selector, .. } => {
                assert_eq!(timeout, DETAIL_SETTLE);
                assert_eq!(selector, TITLE_SEL);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn without_delays_zeroes_waits() {
        let cfg = Config::default().without_delays();
        assert_eq!(cfg.listing_wait, WaitPolicy::Fixed(Duration::ZERO));
        assert_eq!(cfg.detail_pause, Duration::ZERO);
        assert_eq!(cfg.scroll_steps, 3);
    }
}
