//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. Only `Navigation` and
//! `SearchTimeout` ever abort a whole aggregation; everything that happens
//! to a single list item is absorbed by the orchestrator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Host page gateway failure (transport error, dead session, stale
    /// element reference).
    #[error("page gateway error: {0}")]
    PageGateway(String),

    /// The host UI's addressing scheme could not be determined or the
    /// search could not be issued. Fatal; surfaced verbatim to the caller.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The result list never stabilized. Fatal; aborts the aggregation.
    #[error("search results did not load: {0}")]
    SearchTimeout(String),

    /// A render-wait predicate did not hold within its budget. The caller
    /// decides whether that is fatal.
    #[error("timed out waiting for {condition}")]
    WaitTimeout { condition: String },

    /// Failure while opening/expanding/extracting/returning for one list
    /// item. Recovered locally: logged, item skipped.
    #[error("item {index} failed: {reason}")]
    ItemProcessing { index: usize, reason: String },

    /// Caller-supplied range or configuration invalid.
    #[error("configuration error: {0}")]
    Config(String),
}
