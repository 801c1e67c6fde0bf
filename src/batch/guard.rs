use rust_decimal::Decimal;

use crate::batch::entry::TransferEntry;
use crate::error::SubmissionError;

/// Decimal sum of every entry; unreadable amounts add nothing
pub fn total_amount(entries: &[TransferEntry]) -> Decimal {
    entries.iter().map(TransferEntry::amount_value).sum()
}

/// Decide whether a batch may be submitted against `available`.
///
/// Returns the batch total when it may.
pub fn check(entries: &[TransferEntry], available: Decimal) -> Result<Decimal, SubmissionError> {
    if entries.is_empty() {
        return Err(SubmissionError::EmptyBatch);
    }

    if let Some(entry) = entries.iter().find(|e| !e.has_recipient()) {
        return Err(SubmissionError::MissingRecipient {
            sequence: entry.sequence,
        });
    }

    let total = total_amount(entries);
    if total <= Decimal::ZERO {
        return Err(SubmissionError::NonPositiveTotal);
    }

    if total > available {
        return Err(SubmissionError::InsufficientBalance {
            required: total,
            available,
        });
    }

    Ok(total)
}

pub fn can_submit(entries: &[TransferEntry], available: Decimal) -> bool {
    check(entries, available).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn batch() -> Vec<TransferEntry> {
        vec![TransferEntry::new(1, "0xA", "10"), TransferEntry::new(2, "0xB", "5")]
    }

    #[test]
    fn test_total_ignores_blank_amounts() {
        let mut entries = batch();
        entries.push(TransferEntry::new(3, "0xC", ""));
        entries.push(TransferEntry::new(4, "0xD", "oops"));
        assert_eq!(total_amount(&entries), dec!(15));
    }

    #[test]
    fn test_accepts_when_total_equals_balance() {
        assert_eq!(check(&batch(), dec!(15)), Ok(dec!(15)));
        assert!(can_submit(&batch(), dec!(15)));
    }

    #[test]
    fn test_rejects_when_total_exceeds_balance() {
        assert_eq!(
            check(&batch(), dec!(14.99)),
            Err(SubmissionError::InsufficientBalance {
                required: dec!(15),
                available: dec!(14.99),
            })
        );
        assert!(!can_submit(&batch(), dec!(14.99)));
    }

    #[test]
    fn test_rejects_empty_batch() {
        assert_eq!(check(&[], dec!(100)), Err(SubmissionError::EmptyBatch));
    }

    #[test]
    fn test_rejects_missing_recipient() {
        let mut entries = batch();
        entries.push(TransferEntry::new(3, "  ", "1"));
        assert_eq!(
            check(&entries, dec!(100)),
            Err(SubmissionError::MissingRecipient { sequence: 3 })
        );
    }

    #[test]
    fn test_rejects_zero_total() {
        let entries = vec![TransferEntry::new(1, "0xA", ""), TransferEntry::new(2, "0xB", "0")];
        assert_eq!(check(&entries, dec!(100)), Err(SubmissionError::NonPositiveTotal));
    }
}
