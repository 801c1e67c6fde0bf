//! Turns pasted or uploaded delimited text into transfer entries.
//!
//! The first line is always a header. Every other non-blank line must carry
//! at least `id, recipient, amount`; tokens are separated by commas or runs of
//! whitespace, and anything after the recipient is glued back together as the
//! amount. Import is best effort: short lines are skipped and reported, never
//! fatal.

use serde::Serialize;
use tracing::warn;

use crate::batch::entry::TransferEntry;

pub const CANONICAL_HEADER: &str = "id,address,amount";

/// A line the normalizer could not turn into an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based, header included
    pub line: usize,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedBatch {
    pub entries: Vec<TransferEntry>,
    pub skipped: Vec<SkippedLine>,
}

fn tokens(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn normalize(raw: &str) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, line) in raw.split('\n').enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts = tokens(line);
        if parts.len() < 3 {
            batch.skipped.push(SkippedLine {
                line: index + 1,
                content: line.to_string(),
            });
            continue;
        }

        let position = batch.entries.len() as u32 + 1;
        let sequence = parts[0].parse::<u32>().unwrap_or(position);
        let amount = parts[2..].join(" ").trim().to_string();

        batch.entries.push(TransferEntry::new(sequence, parts[1], amount));
    }

    if !batch.skipped.is_empty() {
        warn!(
            "Skipped {} malformed line(s) while importing batch (kept {})",
            batch.skipped.len(),
            batch.entries.len()
        );
    }

    batch
}

/// Canonical text form that [`normalize`] reads back unchanged
pub fn serialize(entries: &[TransferEntry]) -> String {
    let mut out = String::from(CANONICAL_HEADER);
    for entry in entries {
        out.push('\n');
        out.push_str(&format!("{},{},{}", entry.sequence, entry.recipient, entry.amount));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::guard::total_amount;
    use rust_decimal_macros::dec;

    #[test]
    fn test_header_is_discarded() {
        let batch = normalize("id,address,amount\n1,0xA,10\n2,0xB,5");
        assert_eq!(
            batch.entries,
            vec![TransferEntry::new(1, "0xA", "10"), TransferEntry::new(2, "0xB", "5")]
        );
        assert_eq!(total_amount(&batch.entries), dec!(15));
        assert!(batch.skipped.is_empty());
    }

    #[test]
    fn test_first_line_dropped_even_if_it_looks_like_data() {
        let batch = normalize("1,0xA,10\n2,0xB,5");
        assert_eq!(batch.entries, vec![TransferEntry::new(2, "0xB", "5")]);
    }

    #[test]
    fn test_whitespace_and_mixed_separators() {
        let batch = normalize("header\n1 0xA\t10\r\n2, 0xB, 7.25\r\n");
        assert_eq!(
            batch.entries,
            vec![TransferEntry::new(1, "0xA", "10"), TransferEntry::new(2, "0xB", "7.25")]
        );
    }

    #[test]
    fn test_trailing_tokens_join_into_amount() {
        let batch = normalize("h\n1,0xA,10,000");
        assert_eq!(batch.entries[0].amount, "10 000");
    }

    #[test]
    fn test_blank_lines_are_ignored_and_short_lines_reported() {
        let batch = normalize("h\n\n1,0xA,10\n   \n2,0xB\n3,0xC,1");
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(
            batch.skipped,
            vec![SkippedLine { line: 5, content: "2,0xB".to_string() }]
        );
    }

    #[test]
    fn test_unparseable_id_falls_back_to_position() {
        let batch = normalize("h\nfirst,0xA,1\nsecond,0xB,2");
        assert_eq!(batch.entries[0].sequence, 1);
        assert_eq!(batch.entries[1].sequence, 2);
    }

    #[test]
    fn test_serialize_reads_back() {
        let entries = vec![
            TransferEntry::new(1, "0xA", "10"),
            TransferEntry::new(2, "0xB", "0.5"),
            TransferEntry::new(7, "9yPq3k", "1000"),
        ];
        assert_eq!(normalize(&serialize(&entries)).entries, entries);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), NormalizedBatch::default());
        assert_eq!(normalize("id,address,amount"), NormalizedBatch::default());
    }
}
