//! Top-level aggregation state machine: search once, then per item
//! open → expand → extract → return, accumulating a sorted total.
//!
//! Strictly sequential: the host UI has exactly one visible state, so only
//! one interaction is ever in flight. Per-item failures are absorbed — a
//! single malformed message never prevents aggregation of the rest.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{
    dedup, extract, AggregateResult, DateRange, DomainError, SearchQuery, TransactionRecord,
};
use crate::ports::PageDriver;
use crate::usecases::expansion::ExpansionDriver;
use crate::usecases::navigation::NavigationDriver;
use crate::usecases::selectors;
use crate::usecases::wait::await_condition;

const CONTENT_POLL: Duration = Duration::from_millis(300);
const CONTENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning knobs for one aggregation run. Defaults mirror the settle and
/// timeout budgets the host UI is known to need.
#[derive(Debug, Clone)]
pub struct EngineTuning {
    /// Upper bound on the initial results wait.
    pub search_timeout: Duration,
    /// Settle after issuing the search navigation.
    pub search_settle: Duration,
    /// Settle after opening a list item.
    pub open_settle: Duration,
    /// Settle after each expansion round.
    pub expand_settle: Duration,
    /// Settle after returning to the list.
    pub back_settle: Duration,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            search_timeout: Duration::from_secs(15),
            search_settle: Duration::from_millis(2000),
            open_settle: Duration::from_millis(1500),
            expand_settle: Duration::from_millis(400),
            back_settle: Duration::from_millis(1000),
        }
    }
}

/// Aggregation orchestrator. Owns the per-item loop and the running total.
pub struct AggregateService {
    page: Arc<dyn PageDriver>,
    navigation: NavigationDriver,
    expansion: ExpansionDriver,
    tuning: EngineTuning,
}

impl AggregateService {
    pub fn new(page: Arc<dyn PageDriver>, tuning: EngineTuning) -> Self {
        let navigation = NavigationDriver::new(
            Arc::clone(&page),
            tuning.search_timeout,
            tuning.search_settle,
        );
        let expansion = ExpansionDriver::new(Arc::clone(&page), tuning.expand_settle);
        Self {
            page,
            navigation,
            expansion,
            tuning,
        }
    }

    /// Aggregate card-usage notifications over `range`.
    ///
    /// Only navigation and search-stabilization failures escalate. Anything
    /// that goes wrong for one item is logged and that item skipped, so the
    /// caller always gets whatever the rest of the list yielded.
    pub async fn aggregate(&self, range: &DateRange) -> Result<AggregateResult, DomainError> {
        let query = SearchQuery::card_notifications(range);
        self.navigation.search(&query).await?;

        // Item budget: the count at this instant. The list itself is
        // re-enumerated before every open; the budget only bounds the loop.
        let budget = self.navigation.result_count().await?;
        if budget == 0 {
            info!("search matched no notifications");
            return Ok(AggregateResult::empty());
        }
        info!(items = budget, "search results ready");

        let mut details: Vec<TransactionRecord> = Vec::new();
        for index in 0..budget {
            match self.process_item(index).await {
                Ok(Some(records)) => details.extend(records),
                Ok(None) => {
                    warn!(index, budget, "result list shrank; stopping early");
                    break;
                }
                Err(e) => {
                    warn!(item = index, error = %e, "item failed; continuing with the rest");
                    // Best-effort recovery: the failure may have left the UI
                    // in the detail view, which would strand every later item.
                    self.navigation.return_to_list().await;
                    let _ = self.navigation.await_list_view().await;
                }
            }
        }

        // Zero-padded dates sort correctly as strings; the sort is stable so
        // ties keep extraction order.
        details.sort_by(|a, b| b.date.cmp(&a.date));

        let total_amount = details.iter().map(|record| record.amount).sum();
        Ok(AggregateResult {
            total_amount,
            count: details.len(),
            details,
        })
    }

    /// Open, expand, extract, and leave one list item. `Ok(None)` means the
    /// freshly-enumerated list no longer has an item at `index`.
    async fn process_item(
        &self,
        index: usize,
    ) -> Result<Option<Vec<TransactionRecord>>, DomainError> {
        // Handles from the previous iteration are invalid: opening and
        // returning mutates the list's rendering.
        let rows = self.page.find_all(selectors::RESULT_ROW).await?;
        let Some(row) = rows.get(index) else {
            return Ok(None);
        };

        self.page
            .click(row)
            .await
            .map_err(|e| DomainError::ItemProcessing {
                index,
                reason: format!("open: {}", e),
            })?;
        tokio::time::sleep(self.tuning.open_settle).await;
        self.await_message_content().await?;

        let expanded = self.expansion.expand_all().await;
        if expanded > 0 {
            debug!(item = index, expanded, "expanded thread sub-messages");
        }

        let records = self.extract_visible_records().await?;

        // Leave the item before reporting it; if the list never reappears
        // the whole item counts as failed and its records are discarded.
        self.navigation.return_to_list().await;
        tokio::time::sleep(self.tuning.back_settle).await;
        self.navigation.await_list_view().await?;

        Ok(Some(records))
    }

    /// Wait until at least one message body with plausible content rendered.
    async fn await_message_content(&self) -> Result<(), DomainError> {
        let page = Arc::clone(&self.page);
        await_condition("message content", CONTENT_POLL, CONTENT_TIMEOUT, || {
            let page = Arc::clone(&page);
            async move {
                for css in selectors::MESSAGE_BODIES {
                    for el in page.find_all(css).await? {
                        if let Ok(text) = page.text(&el).await {
                            if text.chars().count() > extract::MIN_TEXT_LEN {
                                return Ok(true);
                            }
                        }
                    }
                }
                Ok(false)
            }
        })
        .await
    }

    /// Extract a record from every currently-visible message body, then
    /// deduplicate within this one item: the body selectors overlap, and a
    /// retried expansion pass can surface the same body twice. A body that
    /// yields no record is simply zero records, not an error.
    async fn extract_visible_records(&self) -> Result<Vec<TransactionRecord>, DomainError> {
        let mut candidates = Vec::new();
        for css in selectors::MESSAGE_BODIES {
            for el in self.page.find_all(css).await? {
                // A body replaced mid-read is skipped this pass.
                let Ok(text) = self.page.text(&el).await else {
                    continue;
                };
                if let Some(record) = extract::extract(&text) {
                    candidates.push(record);
                }
            }
        }
        Ok(dedup::merge(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::browser::mock_page::{CollapsedSub, MockPage, MockThread};
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    fn notification(date: &str, merchant: &str, amount: &str) -> String {
        format!(
            "三井住友カードの会員様\nカードのご利用がありましたのでお知らせします。\n\nご利用日：{}\nご利用先：{}\nご利用金額：{}円\n\n本メールは送信専用です。\n",
            date, merchant, amount
        )
    }

    fn service(page: Arc<MockPage>) -> AggregateService {
        AggregateService::new(page, EngineTuning::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_items_short_circuits_to_empty_result() {
        let page = Arc::new(MockPage::new(Vec::new()));
        let result = service(page).aggregate(&range()).await.unwrap();
        assert_eq!(result, AggregateResult::empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_aggregates_and_sorts_by_date_descending() {
        let page = Arc::new(MockPage::new(vec![
            MockThread::plain(notification("2024年1月1日", "店舗A", "1,000")),
            MockThread::plain(notification("2024年1月15日", "店舗B", "2,000")),
            MockThread::plain(notification("2024年1月10日", "店舗C", "3,000")),
        ]));
        let result = service(page).aggregate(&range()).await.unwrap();

        assert_eq!(result.total_amount, 6000);
        assert_eq!(result.count, 3);
        let dates: Vec<&str> = result.details.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024/01/15", "2024/01/10", "2024/01/01"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_item_is_skipped_not_fatal() {
        let page = Arc::new(
            MockPage::new(vec![
                MockThread::plain(notification("2024年1月1日", "店舗A", "1,000")),
                MockThread::plain(notification("2024年1月2日", "店舗B", "2,000")),
                MockThread::plain(notification("2024年1月3日", "店舗C", "3,000")),
            ])
            .with_fail_open(1),
        );
        let result = service(page).aggregate(&range()).await.unwrap();

        assert_eq!(result.count, 2);
        assert_eq!(result.total_amount, 4000);
        assert!(result.details.iter().all(|r| r.merchant != "店舗B"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_with_no_content_recovers_and_continues() {
        // Item 1 opens but its body never renders: the content wait times
        // out, the orchestrator recovers back to the list, and the later
        // item is still aggregated.
        let page = Arc::new(MockPage::new(vec![
            MockThread::plain(notification("2024年1月1日", "店舗A", "1,000")),
            MockThread {
                bodies: Vec::new(),
                collapsed: Vec::new(),
            },
            MockThread::plain(notification("2024年1月3日", "店舗C", "3,000")),
        ]));
        let result = service(page).aggregate(&range()).await.unwrap();

        assert_eq!(result.count, 2);
        assert_eq!(result.total_amount, 4000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_thread_sub_messages_expanded_and_deduplicated() {
        // One conversation: a rendered body plus two collapsed sub-messages,
        // one of which duplicates the rendered body after expansion.
        let rendered = notification("2024年1月5日", "店舗A", "1,000");
        let thread = MockThread {
            bodies: vec![rendered.clone()],
            collapsed: vec![
                CollapsedSub {
                    indicator: "span.adx",
                    body: notification("2024年1月6日", "店舗B", "2,000"),
                    reveals: Vec::new(),
                },
                CollapsedSub {
                    indicator: "div.kv",
                    body: rendered,
                    reveals: Vec::new(),
                },
            ],
        };
        let page = Arc::new(MockPage::new(vec![thread]));
        let result = service(page).aggregate(&range()).await.unwrap();

        assert_eq!(result.count, 2);
        assert_eq!(result.total_amount, 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cross_item_duplicates_are_kept() {
        // Identical transactions in two separate conversations are two real
        // records; deduplication is scoped to one item.
        let body = notification("2024年1月5日", "店舗A", "1,000");
        let page = Arc::new(MockPage::new(vec![
            MockThread::plain(body.clone()),
            MockThread::plain(body),
        ]));
        let result = service(page).aggregate(&range()).await.unwrap();

        assert_eq!(result.count, 2);
        assert_eq!(result.total_amount, 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shrunk_list_stops_loop_without_failing() {
        let page = Arc::new(
            MockPage::new(vec![
                MockThread::plain(notification("2024年1月1日", "店舗A", "1,000")),
                MockThread::plain(notification("2024年1月2日", "店舗B", "2,000")),
                MockThread::plain(notification("2024年1月3日", "店舗C", "3,000")),
            ])
            .with_shrink_on_return(1),
        );
        let result = service(page).aggregate(&range()).await.unwrap();

        // Item 0 lands; afterwards the list only has one row, so indexes 1
        // and 2 are out of range and the loop stops.
        assert_eq!(result.count, 1);
        assert_eq!(result.details[0].merchant, "店舗A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_body_without_record_counts_as_zero_records() {
        let page = Arc::new(MockPage::new(vec![
            MockThread::plain(
                "三井住友カードの会員様\nお知らせ：会員規約が改定されました。改定内容の詳細および適用開始日につきましては、会員サイトのお知らせページをご覧ください。",
            ),
            MockThread::plain(notification("2024年1月2日", "店舗B", "2,000")),
        ]));
        let result = service(page).aggregate(&range()).await.unwrap();

        assert_eq!(result.count, 1);
        assert_eq!(result.total_amount, 2000);
    }
}
