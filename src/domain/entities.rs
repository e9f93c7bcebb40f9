//! Domain entities. Pure data structures for the aggregation core.
//!
//! No DOM/IO types here — those are mapped from adapters.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Sender filter for card-usage notification mails.
pub const NOTIFICATION_SENDER: &str = "contact@vpass.ne.jp";

/// Subject filter for card-usage notification mails.
pub const NOTIFICATION_SUBJECT: &str = "ご利用のお知らせ";

/// Sentinel date for a record whose usage date could not be extracted.
pub const UNKNOWN_DATE: &str = "日付不明";

/// Sentinel merchant for a record whose merchant could not be extracted.
pub const UNKNOWN_MERCHANT: &str = "店舗不明";

/// Caller-supplied calendar range, `start <= end` (checked at construction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::Config(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }
}

/// Opaque query string handed to the host UI's search surface. The sole
/// contract between the core and the host UI's query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    query: String,
}

impl SearchQuery {
    /// Build the card-notification query for `range`.
    ///
    /// The `before:` bound is the calendar day *after* `range.end` (the host
    /// search is end-exclusive), so the range is inclusive of the end date.
    pub fn card_notifications(range: &DateRange) -> Self {
        let after = range.start.format("%Y/%-m/%-d");
        let before = range
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(range.end)
            .format("%Y/%-m/%-d");
        Self {
            query: format!(
                "from:{} subject:{} after:{} before:{}",
                NOTIFICATION_SENDER, NOTIFICATION_SUBJECT, after, before
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }
}

/// Opaque handle to a live element in the host page.
///
/// Valid only until the next navigation or re-render; never cache one across
/// a wait — re-enumerate instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Adapter-scoped reference (e.g. a W3C element id).
    pub opaque_ref: String,
}

impl ElementHandle {
    pub fn new(opaque_ref: impl Into<String>) -> Self {
        Self {
            opaque_ref: opaque_ref.into(),
        }
    }
}

/// One extracted card transaction.
///
/// `amount` is the required field; date and merchant degrade to sentinels
/// instead of failing. Zero-amount candidates never become records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Zero-padded `YYYY/MM/DD`, or [`UNKNOWN_DATE`].
    pub date: String,
    /// Merchant name, or [`UNKNOWN_MERCHANT`].
    pub merchant: String,
    /// Amount in yen (smallest currency unit). Always positive.
    pub amount: u64,
}

/// Aggregated output: total, record count, and the itemized list sorted by
/// date descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub total_amount: u64,
    pub count: usize,
    pub details: Vec<TransactionRecord>,
}

impl AggregateResult {
    /// Result for a search that matched nothing.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_range_rejects_inverted_dates() {
        assert!(DateRange::new(date(2024, 3, 2), date(2024, 3, 1)).is_err());
        assert!(DateRange::new(date(2024, 3, 1), date(2024, 3, 1)).is_ok());
    }

    #[test]
    fn test_query_upper_bound_is_day_after_end() {
        let range = DateRange::new(date(2024, 3, 5), date(2024, 3, 10)).unwrap();
        let query = SearchQuery::card_notifications(&range);
        assert!(query.as_str().contains("after:2024/3/5"));
        assert!(query.as_str().contains("before:2024/3/11"));
    }

    #[test]
    fn test_query_rolls_over_month_end() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let query = SearchQuery::card_notifications(&range);
        assert!(query.as_str().contains("before:2024/2/1"));
    }

    #[test]
    fn test_query_rolls_over_year_end() {
        let range = DateRange::new(date(2024, 12, 1), date(2024, 12, 31)).unwrap();
        let query = SearchQuery::card_notifications(&range);
        assert!(query.as_str().contains("before:2025/1/1"));
    }

    #[test]
    fn test_query_rolls_over_leap_february() {
        let range = DateRange::new(date(2024, 2, 1), date(2024, 2, 28)).unwrap();
        let query = SearchQuery::card_notifications(&range);
        // 2024 is a leap year, so the day after Feb 28 is Feb 29.
        assert!(query.as_str().contains("before:2024/2/29"));
    }

    #[test]
    fn test_query_carries_fixed_filters() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        let query = SearchQuery::card_notifications(&range);
        assert!(query.as_str().starts_with(&format!(
            "from:{} subject:{}",
            NOTIFICATION_SENDER, NOTIFICATION_SUBJECT
        )));
    }

    #[test]
    fn test_aggregate_result_serializes_camel_case() {
        let result = AggregateResult {
            total_amount: 6000,
            count: 1,
            details: vec![TransactionRecord {
                date: "2024/01/15".into(),
                merchant: "Amazon.co.jp".into(),
                amount: 6000,
            }],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"totalAmount\":6000"));
        assert!(json.contains("\"count\":1"));
        assert!(json.contains("\"merchant\":\"Amazon.co.jp\""));
    }
}
