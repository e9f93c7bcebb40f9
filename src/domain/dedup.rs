//! Duplicate suppression for extracted records.
//!
//! Re-extracting a thread's messages after a retried expansion pass, or the
//! overlapping body selectors, can surface the same message body twice. Run
//! per item, before merging into the running total, so one thread's internal
//! duplicates are not conflated with cross-thread duplicates.

use std::collections::HashSet;

use crate::domain::entities::TransactionRecord;

/// Composite identity of a record. Two records with the same key are the
/// same underlying transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    date: String,
    amount: u64,
    merchant: String,
}

impl DedupKey {
    pub fn of(record: &TransactionRecord) -> Self {
        Self {
            date: record.date.clone(),
            amount: record.amount,
            merchant: record.merchant.clone(),
        }
    }
}

/// Keep the first occurrence of each key, in encounter order.
pub fn merge(records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    let mut seen: HashSet<DedupKey> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(DedupKey::of(record)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, merchant: &str, amount: u64) -> TransactionRecord {
        TransactionRecord {
            date: date.into(),
            merchant: merchant.into(),
            amount,
        }
    }

    #[test]
    fn test_exact_duplicate_dropped() {
        let merged = merge(vec![
            record("2024/03/05", "Amazon.co.jp", 12345),
            record("2024/03/05", "Amazon.co.jp", 12345),
            record("2024/03/05", "楽天市場", 12345),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].merchant, "Amazon.co.jp");
        assert_eq!(merged[1].merchant, "楽天市場");
    }

    #[test]
    fn test_same_amount_different_date_kept() {
        let merged = merge(vec![
            record("2024/03/05", "Amazon.co.jp", 500),
            record("2024/03/06", "Amazon.co.jp", 500),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_encounter_order_preserved() {
        let merged = merge(vec![
            record("2024/03/06", "B", 2),
            record("2024/03/05", "A", 1),
            record("2024/03/06", "B", 2),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].merchant, "B");
        assert_eq!(merged[1].merchant, "A");
    }

    #[test]
    fn test_empty_input() {
        assert!(merge(Vec::new()).is_empty());
    }
}
