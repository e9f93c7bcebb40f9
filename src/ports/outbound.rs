//! Outbound port. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{DomainError, ElementHandle};

/// Host page gateway. Reads and drives the live document of the webmail tab.
///
/// The page has exactly one visible state and the core serializes every
/// interaction, so implementations need no locking of their own. Handles
/// returned by [`find_all`](PageDriver::find_all) go stale on the next
/// navigation or re-render; callers re-enumerate instead of caching.
#[async_trait::async_trait]
pub trait PageDriver: Send + Sync {
    /// Current location of the tab.
    async fn current_url(&self) -> Result<String, DomainError>;

    /// Assign a new location from within the page. A hash-only change is
    /// handled by the host SPA as in-page navigation — never a full load,
    /// which would tear down the host state mid-aggregation.
    async fn assign_location(&self, url: &str) -> Result<(), DomainError>;

    /// All elements currently matching `css`, freshly enumerated.
    async fn find_all(&self, css: &str) -> Result<Vec<ElementHandle>, DomainError>;

    /// Visible text of an element. Errs on a stale handle.
    async fn text(&self, element: &ElementHandle) -> Result<String, DomainError>;

    /// Click an element. Errs on a stale handle.
    async fn click(&self, element: &ElementHandle) -> Result<(), DomainError>;

    /// Send a bare keyboard shortcut to the page.
    async fn press_key(&self, key: char) -> Result<(), DomainError>;

    /// Generic browser history navigation, one step back.
    async fn history_back(&self) -> Result<(), DomainError>;
}
