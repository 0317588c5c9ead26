use std::path::PathBuf;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::config::expand_home;
use crate::models::Record;

use super::helpers::input_tail;

/// What a path prompt is asking for.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum PromptPurpose {
    /// Destination folder for an export. Dismissing it declines permission.
    ExportFolder,
    /// Database file to import. Dismissing it picks nothing.
    ImportFile,
}

/// Text-entry popup standing in for the platform folder/file picker.
#[derive(Clone, Debug)]
pub(crate) struct PathPrompt {
    pub(crate) purpose: PromptPurpose,
    pub(crate) value: String,
    pub(crate) error: Option<String>,
}

impl PathPrompt {
    pub(crate) fn new(purpose: PromptPurpose) -> Self {
        Self {
            purpose,
            value: String::new(),
            error: None,
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        match self.purpose {
            PromptPurpose::ExportFolder => "Export Database: choose a folder",
            PromptPurpose::ImportFile => "Import Database: choose a file",
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self.purpose {
            PromptPurpose::ExportFolder => "Folder",
            PromptPurpose::ImportFile => "File",
        }
    }

    /// Append a character, ignoring control input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        self.error = None;
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    /// The entered path with `~` expanded, or `None` when nothing was typed.
    pub(crate) fn resolved(&self) -> Option<PathBuf> {
        if self.value.trim().is_empty() {
            None
        } else {
            Some(expand_home(&self.value))
        }
    }

    pub(crate) fn missing_value_message(&self) -> &'static str {
        match self.purpose {
            PromptPurpose::ExportFolder => "Enter a destination folder.",
            PromptPurpose::ImportFile => "Enter the database file to import.",
        }
    }

    /// The prompt line for a box `width` columns wide, and the cursor's column.
    pub(crate) fn build_line(&self, width: u16) -> (Line<'static>, u16) {
        let prefix = format!("{}: ", self.label());
        let prefix_width = u16::try_from(prefix.chars().count()).unwrap_or(u16::MAX);
        let (display, style, cursor) = if self.value.is_empty() {
            (
                "<required>".to_string(),
                Style::default().fg(Color::DarkGray),
                0,
            )
        } else {
            let (tail, cursor) = input_tail(&self.value, width.saturating_sub(prefix_width));
            (tail, Style::default().fg(Color::Yellow), cursor)
        };
        let line = Line::from(vec![Span::raw(prefix), Span::styled(display, style)]);
        (line, prefix_width.saturating_add(cursor))
    }
}

/// Pending delete awaiting a y/n answer.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl From<&Record> for ConfirmDelete {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
        }
    }
}
