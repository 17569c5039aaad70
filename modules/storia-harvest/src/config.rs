//! Run configuration, loaded from environment variables with the defaults
//! the pipeline was tuned against. A few common knobs can be overridden from
//! the CLI (see `main.rs`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

const DEFAULT_PAGE_URL_TEMPLATE: &str =
    "https://www.storia.ro/ro/rezultate/vanzare/apartament/bucuresti?limit=72&page={page}";

const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Site root, used to absolutize relative listing links.
    pub base_url: String,
    /// Results-page URL with a `{page}` placeholder.
    pub page_url_template: String,
    pub max_pages: u32,
    pub output_path: PathBuf,
    pub debug_dir: PathBuf,

    /// Render service endpoint and optional access token.
    pub render_url: String,
    pub render_token: Option<String>,

    pub goto_timeout: Duration,
    /// Inter-page pacing bounds, seconds.
    pub page_sleep: (f64, f64),

    pub enrich_enabled: bool,
    pub detail_timeout: Duration,
    /// Inter-detail-fetch pacing bounds, seconds.
    pub detail_sleep: (f64, f64),

    /// Candidate client identities; one is chosen per run.
    pub user_agents: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            base_url: env_or("STORIA_BASE_URL", "https://www.storia.ro"),
            page_url_template: env_or("STORIA_PAGE_URL_TEMPLATE", DEFAULT_PAGE_URL_TEMPLATE),
            max_pages: env_parse("STORIA_MAX_PAGES", 20),
            output_path: PathBuf::from(env_or(
                "STORIA_OUTPUT_CSV",
                "storia_real_estate_dataset.csv",
            )),
            debug_dir: PathBuf::from(env_or("STORIA_DEBUG_DIR", "debug_pages")),
            render_url: env_or("RENDER_URL", "http://localhost:3000"),
            render_token: env::var("RENDER_TOKEN").ok(),
            goto_timeout: Duration::from_millis(env_parse("STORIA_GOTO_TIMEOUT_MS", 45_000)),
            page_sleep: (
                env_parse("STORIA_PAGE_SLEEP_MIN", 1.5),
                env_parse("STORIA_PAGE_SLEEP_MAX", 3.5),
            ),
            enrich_enabled: env_parse("STORIA_ENRICH", true),
            detail_timeout: Duration::from_millis(env_parse("STORIA_DETAIL_TIMEOUT_MS", 35_000)),
            detail_sleep: (
                env_parse("STORIA_DETAIL_SLEEP_MIN", 0.8),
                env_parse("STORIA_DETAIL_SLEEP_MAX", 1.6),
            ),
            user_agents: env::var("STORIA_USER_AGENTS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Results-page URL for page `n`.
    pub fn page_url(&self, page: u32) -> String {
        self.page_url_template.replace("{page}", &page.to_string())
    }

    /// Jittered inter-page pacing interval.
    pub fn page_pacing(&self) -> Duration {
        jittered(self.page_sleep)
    }

    /// Jittered inter-detail-fetch pacing interval.
    pub fn detail_pacing(&self) -> Duration {
        jittered(self.detail_sleep)
    }

    /// Pick one client identity for this run.
    pub fn pick_user_agent(&self) -> String {
        if self.user_agents.is_empty() {
            return String::new();
        }
        let idx = rand::rng().random_range(0..self.user_agents.len());
        self.user_agents[idx].clone()
    }
}

fn jittered((lo, hi): (f64, f64)) -> Duration {
    if hi <= lo {
        return Duration::from_secs_f64(lo.max(0.0));
    }
    Duration::from_secs_f64(rand::rng().random_range(lo..hi))
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} has an invalid value: {raw}")),
        Err(_) => default,
    }
}
