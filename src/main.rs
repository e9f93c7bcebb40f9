//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vpass_tally::adapters::browser::mock_page::MockPage;
use vpass_tally::adapters::browser::webdriver::WebDriverPage;
use vpass_tally::adapters::ui::tui::TuiInputPort;
use vpass_tally::ports::{InputPort, PageDriver};
use vpass_tally::shared::config::AppConfig;
use vpass_tally::usecases::{AggregateService, EngineTuning};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found"),
    }

    vpass_tally::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_default();

    // --- Page gateway (live WebDriver session, or the scripted demo page) ---
    let page: Arc<dyn PageDriver> = if cfg.mock_page_or_default() {
        warn!("VPASS_TALLY_MOCK_PAGE set; driving the built-in scripted page");
        Arc::new(MockPage::demo())
    } else {
        let webdriver_url = cfg.webdriver_url_or_default();
        info!(url = %webdriver_url, "connecting WebDriver session");
        if cfg.debugger_address.is_none() {
            warn!(
                "VPASS_TALLY_DEBUGGER_ADDRESS not set; a fresh Chrome profile will not be signed in to the mailbox"
            );
        }
        Arc::new(
            WebDriverPage::connect(&webdriver_url, cfg.debugger_address.as_deref())
                .await
                .map_err(|e| anyhow::anyhow!("WebDriver connect failed: {}", e))?,
        )
    };

    // --- Services ---
    let tuning = EngineTuning {
        search_timeout: Duration::from_secs(cfg.search_timeout_secs_or_default()),
        ..EngineTuning::default()
    };
    let service = Arc::new(AggregateService::new(page, tuning));

    // --- Run (range menu -> aggregate -> render, until quit) ---
    let input: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(service));
    input.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
