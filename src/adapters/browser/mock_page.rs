//! Scripted in-memory host page for tests and demo runs.
//!
//! Models just enough of the webmail DOM contract (see
//! `usecases::selectors`) to exercise the drivers: a searchable result
//! list, open conversations with collapsed sub-messages, render latency,
//! and injected per-item failures. No network, no real DOM.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{DomainError, ElementHandle};
use crate::ports::PageDriver;
use crate::usecases::selectors;

/// One collapsed sub-message behind an indicator.
#[derive(Debug, Clone)]
pub struct CollapsedSub {
    /// Which collapsed-indicator selector this sub answers to.
    pub indicator: &'static str,
    /// Body text revealed by expanding.
    pub body: String,
    /// Nested indicators that only appear after this one expands.
    pub reveals: Vec<CollapsedSub>,
}

/// One conversation in the result list.
#[derive(Debug, Clone, Default)]
pub struct MockThread {
    /// Bodies rendered as soon as the conversation opens.
    pub bodies: Vec<String>,
    /// Collapsed sub-messages awaiting expansion.
    pub collapsed: Vec<CollapsedSub>,
}

impl MockThread {
    /// Single-message conversation, fully rendered on open.
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            bodies: vec![body.into()],
            collapsed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    List,
    Message,
}

#[derive(Debug, Clone)]
struct LiveIndicator {
    sub: CollapsedSub,
    consumed: bool,
}

#[derive(Debug)]
struct PageState {
    url: String,
    view: View,
    threads: Vec<MockThread>,
    /// Rendered bodies of the currently-open conversation.
    open_bodies: Vec<String>,
    /// Collapsed indicators of the currently-open conversation. Consumed
    /// entries stay in place so earlier handles do not shift.
    open_indicators: Vec<LiveIndicator>,
    /// Result-row polls remaining before the list "renders".
    result_latency: u32,
    searched: bool,
    /// Items whose open click fails (simulates a vanished row).
    fail_open: HashSet<usize>,
    /// Truncate the list to this length on the next return to it.
    shrink_on_return: Option<usize>,
}

/// Scripted [`PageDriver`]. Shared-state, cheap to clone behind an `Arc`.
pub struct MockPage {
    state: Mutex<PageState>,
}

impl MockPage {
    pub fn new(threads: Vec<MockThread>) -> Self {
        Self {
            state: Mutex::new(PageState {
                url: "https://mail.google.com/mail/u/0/#inbox".into(),
                view: View::List,
                threads,
                open_bodies: Vec::new(),
                open_indicators: Vec::new(),
                result_latency: 0,
                searched: false,
                fail_open: HashSet::new(),
                shrink_on_return: None,
            }),
        }
    }

    /// Rows and the empty indicator only materialize after this many
    /// result-row polls, simulating the host UI's render latency.
    pub fn with_result_latency(self, polls: u32) -> Self {
        self.state().result_latency = polls;
        self
    }

    /// Make opening the item at `index` fail.
    pub fn with_fail_open(self, index: usize) -> Self {
        self.state().fail_open.insert(index);
        self
    }

    /// Truncate the result list to `len` items on the first return to it.
    pub fn with_shrink_on_return(self, len: usize) -> Self {
        self.state().shrink_on_return = Some(len);
        self
    }

    /// Start from a non-mail tab (drivers must refuse to search).
    pub fn with_url(self, url: &str) -> Self {
        self.state().url = url.to_string();
        self
    }

    /// Demo page used when no WebDriver endpoint is configured: a couple of
    /// plain notifications and one threaded conversation.
    pub fn demo() -> Self {
        let mail = |date: &str, merchant: &str, amount: &str| {
            format!(
                "三井住友カードの会員様\nいつもご利用ありがとうございます。カードのご利用がありましたのでお知らせします。\n\nご利用日：{}\nご利用先：{}\nご利用金額：{}円\n\n本メールは送信専用です。\n",
                date, merchant, amount
            )
        };
        Self::new(vec![
            MockThread::plain(mail("2025年6月3日", "Amazon.co.jp", "3,480")),
            MockThread::plain(mail("2025年6月10日", "コンビニエンスストア", "1,260")),
            MockThread {
                bodies: vec![mail("2025年6月18日", "スーパーマーケット", "5,980")],
                collapsed: vec![CollapsedSub {
                    indicator: "span.adx",
                    body: mail("2025年6月21日", "ガソリンスタンド", "7,700"),
                    reveals: Vec::new(),
                }],
            },
        ])
        .with_result_latency(2)
    }

    /// Number of bodies currently rendered in the open conversation.
    pub async fn visible_body_count(&self) -> usize {
        self.state().open_bodies.len()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open_item(state: &mut PageState, index: usize) {
        let thread = &state.threads[index];
        state.open_bodies = thread.bodies.clone();
        state.open_indicators = thread
            .collapsed
            .iter()
            .map(|sub| LiveIndicator {
                sub: sub.clone(),
                consumed: false,
            })
            .collect();
        state.view = View::Message;
    }

    fn back_to_list(state: &mut PageState) {
        state.view = View::List;
        state.open_bodies.clear();
        state.open_indicators.clear();
        if let Some(len) = state.shrink_on_return.take() {
            state.threads.truncate(len);
        }
    }

    fn list_rendered(state: &mut PageState) -> bool {
        if state.result_latency > 0 {
            state.result_latency -= 1;
            return false;
        }
        state.searched
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn current_url(&self) -> Result<String, DomainError> {
        Ok(self.state().url.clone())
    }

    async fn assign_location(&self, url: &str) -> Result<(), DomainError> {
        let mut state = self.state();
        state.url = url.to_string();
        if url.contains("#search/") {
            state.searched = true;
            Self::back_to_list(&mut state);
        }
        Ok(())
    }

    async fn find_all(&self, css: &str) -> Result<Vec<ElementHandle>, DomainError> {
        let mut state = self.state();
        let handles = if css == selectors::RESULT_ROW {
            if state.view == View::List && Self::list_rendered(&mut state) {
                (0..state.threads.len())
                    .map(|i| ElementHandle::new(format!("row:{}", i)))
                    .collect()
            } else {
                Vec::new()
            }
        } else if css == selectors::EMPTY_STATE {
            if state.view == View::List
                && state.searched
                && state.result_latency == 0
                && state.threads.is_empty()
            {
                vec![ElementHandle::new("empty")]
            } else {
                Vec::new()
            }
        } else if selectors::MESSAGE_BODIES.contains(&css) {
            // Every body answers both body selectors — the overlap the
            // per-item deduplication exists for.
            if state.view == View::Message {
                (0..state.open_bodies.len())
                    .map(|i| ElementHandle::new(format!("body:{}", i)))
                    .collect()
            } else {
                Vec::new()
            }
        } else if selectors::COLLAPSED_INDICATORS.contains(&css) {
            if state.view == View::Message {
                state
                    .open_indicators
                    .iter()
                    .enumerate()
                    .filter(|(_, ind)| !ind.consumed && ind.sub.indicator == css)
                    .map(|(i, _)| ElementHandle::new(format!("indicator:{}", i)))
                    .collect()
            } else {
                Vec::new()
            }
        } else if selectors::BACK_TO_LIST.contains(&css) {
            if state.view == View::Message {
                vec![ElementHandle::new("back")]
            } else {
                Vec::new()
            }
        } else {
            Vec::new()
        };
        Ok(handles)
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, DomainError> {
        let state = self.state();
        let handle = element.opaque_ref.as_str();
        if let Some(index) = handle.strip_prefix("body:") {
            let index: usize = index
                .parse()
                .map_err(|_| DomainError::PageGateway("bad handle".into()))?;
            return state
                .open_bodies
                .get(index)
                .cloned()
                .ok_or_else(|| DomainError::PageGateway("stale element reference".into()));
        }
        match handle {
            "empty" => Ok("一致するメッセージがありません".into()),
            _ if handle.starts_with("row:") => Ok("カードご利用のお知らせ".into()),
            _ if handle.starts_with("indicator:") => Ok("折りたたまれたメッセージ".into()),
            _ => Ok(String::new()),
        }
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DomainError> {
        let mut state = self.state();
        let handle = element.opaque_ref.as_str();

        if let Some(index) = handle.strip_prefix("row:") {
            let index: usize = index
                .parse()
                .map_err(|_| DomainError::PageGateway("bad handle".into()))?;
            if state.view != View::List || index >= state.threads.len() {
                return Err(DomainError::PageGateway("stale element reference".into()));
            }
            if state.fail_open.contains(&index) {
                return Err(DomainError::PageGateway("row vanished mid-click".into()));
            }
            Self::open_item(&mut state, index);
            return Ok(());
        }

        if let Some(index) = handle.strip_prefix("indicator:") {
            let index: usize = index
                .parse()
                .map_err(|_| DomainError::PageGateway("bad handle".into()))?;
            if state.view != View::Message {
                return Err(DomainError::PageGateway("stale element reference".into()));
            }
            let indicator = state
                .open_indicators
                .get_mut(index)
                .ok_or_else(|| DomainError::PageGateway("stale element reference".into()))?;
            if indicator.consumed {
                return Err(DomainError::PageGateway("stale element reference".into()));
            }
            indicator.consumed = true;
            let body = indicator.sub.body.clone();
            let reveals = indicator.sub.reveals.clone();
            state.open_bodies.push(body);
            state.open_indicators.extend(reveals.into_iter().map(|sub| LiveIndicator {
                sub,
                consumed: false,
            }));
            return Ok(());
        }

        if handle == "back" {
            if state.view != View::Message {
                return Err(DomainError::PageGateway("stale element reference".into()));
            }
            Self::back_to_list(&mut state);
            return Ok(());
        }

        Err(DomainError::PageGateway("unclickable element".into()))
    }

    async fn press_key(&self, key: char) -> Result<(), DomainError> {
        if key == selectors::BACK_SHORTCUT {
            Self::back_to_list(&mut self.state());
        }
        Ok(())
    }

    async fn history_back(&self) -> Result<(), DomainError> {
        Self::back_to_list(&mut self.state());
        Ok(())
    }
}
