//! Application configuration. WebDriver endpoint, timing knobs.

use serde::Deserialize;

/// Default WebDriver endpoint (a local chromedriver).
pub const DEFAULT_WEBDRIVER_URL: &str = "http://127.0.0.1:9515";

/// Default upper bound in seconds on the search-results wait.
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// WebDriver server URL. Read from VPASS_TALLY_WEBDRIVER_URL.
    #[serde(default)]
    pub webdriver_url: Option<String>,

    /// `debuggerAddress` of an already-authenticated Chrome (e.g.
    /// "127.0.0.1:9222"). Without it the session launches a fresh profile,
    /// which will not be signed in to the mailbox. Read from
    /// VPASS_TALLY_DEBUGGER_ADDRESS.
    #[serde(default)]
    pub debugger_address: Option<String>,

    /// Upper bound in seconds on the search-results wait. Read from
    /// VPASS_TALLY_SEARCH_TIMEOUT_SECS.
    #[serde(default)]
    pub search_timeout_secs: Option<u64>,

    /// Drive the built-in scripted page instead of a live tab. Read from
    /// VPASS_TALLY_MOCK_PAGE.
    #[serde(default)]
    pub mock_page: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("VPASS_TALLY"));
        if let Ok(path) = std::env::var("VPASS_TALLY_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // Numeric/bool env values arrive as strings; parse them explicitly.
        if let Ok(s) = std::env::var("VPASS_TALLY_SEARCH_TIMEOUT_SECS") {
            if let Ok(n) = s.parse::<u64>() {
                cfg.search_timeout_secs = Some(n);
            }
        }
        if let Ok(s) = std::env::var("VPASS_TALLY_MOCK_PAGE") {
            cfg.mock_page = Some(matches!(s.as_str(), "1" | "true" | "yes"));
        }
        Ok(cfg)
    }

    /// WebDriver endpoint. Defaults to a local chromedriver.
    pub fn webdriver_url_or_default(&self) -> String {
        self.webdriver_url
            .clone()
            .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string())
    }

    /// Search wait budget in seconds. The host UI's render latency is
    /// unbounded and variable, so the default stays conservative.
    pub fn search_timeout_secs_or_default(&self) -> u64 {
        self.search_timeout_secs
            .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS)
    }

    pub fn mock_page_or_default(&self) -> bool {
        self.mock_page.unwrap_or(false)
    }
}
