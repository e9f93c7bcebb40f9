//! Thread expansion driver: force every collapsed sub-message of an open
//! conversation to render before extraction.
//!
//! This is a fixed-point expansion, not "expand N messages": expanding one
//! indicator can reveal new nested indicators, so the loop runs until a
//! round expands nothing, under a hard round budget that guarantees
//! termination against an adversarially deep thread. Best-effort by
//! contract; it never fails — whatever became visible gets extracted.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::ports::PageDriver;
use crate::usecases::selectors;

/// Round budget. Empirically generous; real threads converge in two or
/// three rounds.
const MAX_ROUNDS: usize = 20;

pub struct ExpansionDriver {
    page: Arc<dyn PageDriver>,
    /// Settle delay after a round that clicked something.
    settle: Duration,
}

impl ExpansionDriver {
    pub fn new(page: Arc<dyn PageDriver>, settle: Duration) -> Self {
        Self { page, settle }
    }

    /// Expand until no collapsed indicator remains or the round budget is
    /// exhausted. Returns the number of indicators clicked in total.
    pub async fn expand_all(&self) -> usize {
        let mut total = 0;
        for round in 0..MAX_ROUNDS {
            let clicked = self.expand_round().await;
            if clicked == 0 {
                break;
            }
            total += clicked;
            debug!(round, clicked, "expanded collapsed indicators");
            tokio::time::sleep(self.settle).await;
        }
        total
    }

    /// One pass over every known collapsed-indicator shape. The shapes are
    /// not mutually exclusive; an element that vanished or went stale since
    /// enumeration simply fails to click and is not counted.
    async fn expand_round(&self) -> usize {
        let mut clicked = 0;
        for css in selectors::COLLAPSED_INDICATORS {
            let elements = match self.page.find_all(css).await {
                Ok(elements) => elements,
                Err(_) => continue,
            };
            for el in &elements {
                if self.page.click(el).await.is_ok() {
                    clicked += 1;
                }
            }
        }
        clicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::browser::mock_page::{CollapsedSub, MockPage, MockThread};
    use crate::usecases::selectors;

    async fn open_first_item(page: &MockPage) {
        page.assign_location("https://mail.google.com/mail/u/0/#search/q")
            .await
            .unwrap();
        let rows = page.find_all(selectors::RESULT_ROW).await.unwrap();
        page.click(&rows[0]).await.unwrap();
    }

    fn driver(page: Arc<MockPage>) -> ExpansionDriver {
        ExpansionDriver::new(page, Duration::from_millis(400))
    }

    #[tokio::test(start_paused = true)]
    async fn test_expands_nested_indicators_to_fixed_point() {
        // Expanding the collapsed header reveals a stack badge that was not
        // present in the first round's enumeration, so a second round (and a
        // closing zero-progress round) is required to converge.
        let thread = MockThread {
            bodies: vec!["first body".into()],
            collapsed: vec![CollapsedSub {
                indicator: "div.kv",
                body: "second body".into(),
                reveals: vec![CollapsedSub {
                    indicator: "span.adx",
                    body: "third body".into(),
                    reveals: Vec::new(),
                }],
            }],
        };
        let page = Arc::new(MockPage::new(vec![thread]));
        open_first_item(&page).await;

        let clicked = driver(Arc::clone(&page)).expand_all().await;

        assert_eq!(clicked, 2);
        assert_eq!(page.visible_body_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_budget_bounds_adversarial_depth() {
        // A chain deeper than the round budget: one reveal per round, so the
        // loop must stop at the budget instead of draining the chain.
        let mut chain = CollapsedSub {
            indicator: "div.kQ",
            body: "deepest".into(),
            reveals: Vec::new(),
        };
        for depth in 0..25 {
            chain = CollapsedSub {
                indicator: "div.kQ",
                body: format!("depth {}", depth),
                reveals: vec![chain],
            };
        }
        let thread = MockThread {
            bodies: vec!["root".into()],
            collapsed: vec![chain],
        };
        let page = Arc::new(MockPage::new(vec![thread]));
        open_first_item(&page).await;

        let clicked = driver(Arc::clone(&page)).expand_all().await;
        assert_eq!(clicked, MAX_ROUNDS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fully_expanded_thread_is_a_no_op() {
        let page = Arc::new(MockPage::new(vec![MockThread::plain("only body")]));
        open_first_item(&page).await;

        let clicked = driver(Arc::clone(&page)).expand_all().await;
        assert_eq!(clicked, 0);
        assert_eq!(page.visible_body_count().await, 1);
    }
}
