//! Navigation driver: issue a search against the host UI and wait for the
//! result list to materialize; best-effort return from a message to the
//! list.
//!
//! Navigation is an in-page hash assignment. A full page load would tear
//! down the host SPA state mid-aggregation, so it is never requested.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::{DomainError, SearchQuery};
use crate::ports::PageDriver;
use crate::usecases::selectors;
use crate::usecases::wait::await_condition;

/// Recognizes the user-indexed mail base, e.g.
/// `https://mail.google.com/mail/u/0`.
static MAIL_BASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https://mail\.google\.com/mail/u/\d+)").expect("mail base pattern"));

const URL_POLL: Duration = Duration::from_millis(100);
const URL_TIMEOUT: Duration = Duration::from_secs(5);
const RESULT_POLL: Duration = Duration::from_millis(500);
const LIST_POLL: Duration = Duration::from_millis(300);
const LIST_TIMEOUT: Duration = Duration::from_secs(8);

/// Drives the host UI's search surface through the page gateway.
pub struct NavigationDriver {
    page: Arc<dyn PageDriver>,
    /// Upper bound on the results wait. The host render latency is
    /// unbounded and variable, so this stays conservative.
    search_timeout: Duration,
    /// Fixed settle delay after the location change takes effect.
    settle: Duration,
}

impl NavigationDriver {
    pub fn new(page: Arc<dyn PageDriver>, search_timeout: Duration, settle: Duration) -> Self {
        Self {
            page,
            search_timeout,
            settle,
        }
    }

    /// Issue `query` and wait until the result list has at least one row or
    /// the explicit empty-result indicator is present.
    pub async fn search(&self, query: &SearchQuery) -> Result<(), DomainError> {
        let current = self.page.current_url().await?;
        let base = MAIL_BASE
            .captures(&current)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| {
                DomainError::Navigation(
                    "current tab is not a Gmail main view; open https://mail.google.com first"
                        .into(),
                )
            })?;

        let target = format!("{}/#search/{}", base, urlencoding::encode(query.as_str()));
        debug!(url = %target, "issuing search");
        self.page.assign_location(&target).await?;

        // The hash change is observed asynchronously; give up silently after
        // the short budget and let the results wait be the arbiter.
        let page = Arc::clone(&self.page);
        let _ = await_condition("search view in location", URL_POLL, URL_TIMEOUT, || {
            let page = Arc::clone(&page);
            async move { Ok(page.current_url().await?.contains("#search/")) }
        })
        .await;

        tokio::time::sleep(self.settle).await;

        let page = Arc::clone(&self.page);
        await_condition(
            "search results or empty indicator",
            RESULT_POLL,
            self.search_timeout,
            || {
                let page = Arc::clone(&page);
                async move {
                    if !page.find_all(selectors::RESULT_ROW).await?.is_empty() {
                        return Ok(true);
                    }
                    empty_indicator_present(page.as_ref()).await
                }
            },
        )
        .await
        .map_err(|e| match e {
            DomainError::WaitTimeout { condition } => DomainError::SearchTimeout(condition),
            other => other,
        })?;

        // Brief extra settle so partially-painted rows finish rendering.
        tokio::time::sleep(RESULT_POLL).await;
        Ok(())
    }

    /// Count of currently-listed result rows, freshly enumerated.
    pub async fn result_count(&self) -> Result<usize, DomainError> {
        Ok(self.page.find_all(selectors::RESULT_ROW).await?.len())
    }

    /// Best-effort return from an open message to the result list: explicit
    /// back affordance, then the host UI's native shortcut, then generic
    /// history navigation. No single method is required to succeed — the
    /// subsequent [`await_list_view`](Self::await_list_view) is the gate.
    pub async fn return_to_list(&self) {
        for css in selectors::BACK_TO_LIST {
            if let Ok(elements) = self.page.find_all(css).await {
                if let Some(el) = elements.first() {
                    if self.page.click(el).await.is_ok() {
                        return;
                    }
                }
            }
        }
        if self.page.press_key(selectors::BACK_SHORTCUT).await.is_ok() {
            return;
        }
        let _ = self.page.history_back().await;
    }

    /// Wait until the result list is visible again after a return.
    pub async fn await_list_view(&self) -> Result<(), DomainError> {
        let page = Arc::clone(&self.page);
        await_condition("result list to reappear", LIST_POLL, LIST_TIMEOUT, || {
            let page = Arc::clone(&page);
            async move { Ok(!page.find_all(selectors::RESULT_ROW).await?.is_empty()) }
        })
        .await
    }
}

async fn empty_indicator_present(page: &dyn PageDriver) -> Result<bool, DomainError> {
    for el in page.find_all(selectors::EMPTY_STATE).await? {
        // A container replaced mid-read is treated as empty text.
        let text = page.text(&el).await.unwrap_or_default();
        if selectors::EMPTY_STATE_MARKERS
            .iter()
            .any(|marker| text.contains(marker))
        {
            return Ok(true);
        }
    }
    Ok(false)
}
