use crate::error::{AppError, Result};

/// Message shown when the user submits an empty draft.
pub const EMPTY_NAME_MESSAGE: &str = "Please enter a name";

/// What submitting the draft will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormTarget {
    #[default]
    Add,
    Edit {
        id: i64,
    },
}

/// The name input field: the draft text plus whether it creates or edits.
#[derive(Debug, Default, Clone)]
pub struct Form {
    draft: String,
    target: FormTarget,
}

impl Form {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn target(&self) -> FormTarget {
        self.target
    }

    pub fn editing_id(&self) -> Option<i64> {
        match self.target {
            FormTarget::Edit { id } => Some(id),
            FormTarget::Add => None,
        }
    }

    /// Append a character, rejecting control input. Returns whether it was kept.
    pub fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            false
        } else {
            self.draft.push(ch);
            true
        }
    }

    pub fn backspace(&mut self) {
        self.draft.pop();
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Load an existing name for editing.
    pub fn begin_edit(&mut self, id: i64, name: &str) {
        self.draft = name.to_string();
        self.target = FormTarget::Edit { id };
    }

    /// Empty the draft and go back to adding.
    pub fn clear(&mut self) {
        self.draft.clear();
        self.target = FormTarget::Add;
    }

    /// The trimmed draft, or a validation error when nothing is left.
    pub fn validated(&self) -> Result<String> {
        let name = self.draft.trim();
        if name.is_empty() {
            Err(AppError::Validation(EMPTY_NAME_MESSAGE.to_string()))
        } else {
            Ok(name.to_string())
        }
    }

    pub fn char_count(&self) -> usize {
        self.draft.chars().count()
    }
}
