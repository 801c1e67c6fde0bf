use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One recipient/amount pair of a batch.
///
/// The amount keeps the text the user typed so partially edited rows survive;
/// [`TransferEntry::amount_value`] gives the decimal the guard and the order
/// totals work with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEntry {
    pub sequence: u32,
    pub recipient: String,
    pub amount: String,
}

impl TransferEntry {
    pub fn new(sequence: u32, recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            sequence,
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    /// Row added by hand, to be filled in later
    pub fn blank(sequence: u32) -> Self {
        Self::new(sequence, "", "")
    }

    /// Empty or unreadable amounts count as zero
    pub fn amount_value(&self) -> Decimal {
        self.amount.trim().parse().unwrap_or(Decimal::ZERO)
    }

    pub fn has_recipient(&self) -> bool {
        !self.recipient.trim().is_empty()
    }
}

/// Editable column of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryField {
    Recipient,
    Amount,
}
