//! Recurrence filtering of raw records

use crate::data::Record;

/// Keep records with `purchase_count >= threshold`, preserving input order
pub fn filter_records(records: &[Record], threshold: i64) -> Vec<Record> {
    let kept: Vec<Record> = records
        .iter()
        .filter(|record| record.purchase_count >= threshold)
        .cloned()
        .collect();

    log::info!(
        "Kept {} of {} records with purchase count >= {}",
        kept.len(),
        records.len(),
        threshold
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive_and_order_stable() {
        let records = vec![
            Record::new("V2", "P1", 20, 1.0),
            Record::new("V1", "P1", 19, 2.0),
            Record::new("V1", "P2", 30, 3.0),
        ];
        let kept = filter_records(&records, 20);
        assert_eq!(kept, vec![records[0].clone(), records[2].clone()]);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let records = vec![Record::new("V1", "P1", 1, 0.0)];
        assert!(filter_records(&records, 20).is_empty());
    }
}
