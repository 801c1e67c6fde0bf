use serde::Serialize;

use crate::batch::entry::{EntryField, TransferEntry};
use crate::error::{AppError, AppResult};

/// Chain/token pair a batch is paid out in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub chain: String,
    pub token: String,
}

/// Batch being put together before submission
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchDraft {
    selection: Option<Selection>,
    entries: Vec<TransferEntry>,
}

impl BatchDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TransferEntry] {
        &self.entries
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Changing chain or token keeps the rows
    pub fn select(&mut self, chain: impl Into<String>, token: impl Into<String>) {
        self.selection = Some(Selection {
            chain: chain.into(),
            token: token.into(),
        });
    }

    pub fn replace_entries(&mut self, entries: Vec<TransferEntry>) {
        self.entries = entries;
    }

    /// Append an empty row numbered after the current last position
    pub fn add_row(&mut self) -> &TransferEntry {
        let sequence = self.entries.len() as u32 + 1;
        self.entries.push(TransferEntry::blank(sequence));
        &self.entries[self.entries.len() - 1]
    }

    /// Replace one field of the row at `index`; other rows keep their place
    pub fn update(&mut self, index: usize, field: EntryField, value: impl Into<String>) -> AppResult<&TransferEntry> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or_else(|| AppError::NotFound(format!("batch row {}", index)))?;

        match field {
            EntryField::Recipient => entry.recipient = value.into(),
            EntryField::Amount => entry.amount = value.into(),
        }

        Ok(entry)
    }

    /// Clear selection and rows after a batch went out
    pub fn reset(&mut self) {
        self.selection = None;
        self.entries.clear();
    }
}
