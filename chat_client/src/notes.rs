//! Session-owned notes, grouped by category.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotesError {
    #[error("Category must not be empty")]
    EmptyCategory,

    #[error("Note must not be empty")]
    EmptyNote,
}

#[derive(Debug, Default, Clone)]
pub struct NotesStore {
    categories: BTreeMap<String, Vec<String>>,
}

impl NotesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `note` under `category`, creating the category on first use.
    pub fn add(&mut self, category: &str, note: &str) -> Result<(), NotesError> {
        let category = category.trim();
        let note = note.trim();
        if category.is_empty() {
            return Err(NotesError::EmptyCategory);
        }
        if note.is_empty() {
            return Err(NotesError::EmptyNote);
        }
        self.categories
            .entry(category.to_string())
            .or_default()
            .push(note.to_string());
        Ok(())
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category.trim()).map(Vec::as_slice)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Number of notes across all categories.
    pub fn total(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Plain-text listing of one category, or of everything.
    pub fn render(&self, category: Option<&str>) -> String {
        if let Some(category) = category {
            return match self.get(category) {
                Some(notes) => format!("Notes in {}: {}", category.trim(), notes.join(" | ")),
                None => format!("No notes found in category: {}", category.trim()),
            };
        }

        if self.is_empty() {
            return "No notes found.".to_string();
        }
        let mut out = String::from("All notes by category:\n");
        for (category, notes) in &self.categories {
            out.push_str(category);
            out.push_str(":\n");
            for note in notes {
                out.push_str("- ");
                out.push_str(note);
                out.push('\n');
            }
        }
        out
    }
}
