use std::mem;

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::config::Platform;
use crate::controller::{Controller, FormTarget, Submitted, TransferReport};
use crate::error::{AppError, ErrorKind};
use crate::transfer::{ShareTarget, TransferKind};

use super::forms::{ConfirmDelete, PathPrompt, PromptPurpose};
use super::helpers::{button, centered_rect, fit_width, input_tail};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the bordered name input.
const INPUT_HEIGHT: u16 = 3;
/// Width reserved for the per-row edit/delete hints.
const ROW_HINT_WIDTH: usize = 22;

/// Startup progresses from `Loading` to `Ready` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

/// Which widget receives plain key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    List,
}

/// Modal overlays on top of the main screen.
enum Mode {
    Normal,
    ConfirmDelete(ConfirmDelete),
    Prompt(PathPrompt),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state for the single screen.
pub struct App {
    controller: Controller,
    platform: Platform,
    share: Box<dyn ShareTarget>,
    phase: Phase,
    focus: Focus,
    selected: usize,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(controller: Controller, platform: Platform, share: Box<dyn ShareTarget>) -> Self {
        Self {
            controller,
            platform,
            share,
            phase: Phase::Loading,
            focus: Focus::Input,
            selected: 0,
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Fetch the initial listing and switch to `Ready`. A failed listing is
    /// shown in the footer; the screen still becomes interactive so the user
    /// can import a working database.
    pub fn load(&mut self) {
        if self.phase == Phase::Ready {
            return;
        }
        match self.controller.refresh() {
            Ok(count) => self.set_status(format!("Loaded {count} names."), StatusKind::Info),
            Err(err) => self.report_error(&err),
        }
        self.phase = Phase::Ready;
    }

    /// Called once per event-loop tick to pick up finished transfers.
    pub fn tick(&mut self) {
        let Some(result) = self.controller.poll_transfer() else {
            return;
        };
        match result {
            Ok(TransferReport::Exported(path)) => {
                self.set_status(format!("Exported database to {}.", path.display()), StatusKind::Info)
            }
            Ok(TransferReport::Imported { count }) => {
                self.selected = 0;
                self.set_status(
                    format!("Imported database with {count} names."),
                    StatusKind::Info,
                );
            }
            Err(err) => {
                self.clamp_selection();
                self.report_error(&err);
            }
        }
    }

    /// Cancel and wait for any running transfer before the terminal goes away.
    pub fn shutdown(&mut self) {
        if !self.controller.cancel_transfer() {
            return;
        }
        if let Some(Err(err)) = self.controller.wait_transfer() {
            if err.kind() != ErrorKind::Cancelled {
                warn!(error = %err, "transfer failed during shutdown");
            }
        }
    }

    /// Process one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.phase == Phase::Loading {
            return matches!(code, KeyCode::Char('q'));
        }

        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Prompt(prompt) => self.handle_prompt(code, prompt),
        };
        exit
    }

    /// Control-key shortcuts that work regardless of focus.
    pub(crate) fn handle_ctrl(&mut self, code: KeyCode) {
        if self.phase == Phase::Loading || !matches!(self.mode, Mode::Normal) {
            return;
        }
        match code {
            KeyCode::Char('e') => self.mode = self.export_by_platform(),
            KeyCode::Char('o') => self.mode = self.open_prompt(PromptPurpose::ImportFile),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        if code == KeyCode::Esc && self.controller.cancel_transfer() {
            self.set_status("Cancelling transfer...", StatusKind::Info);
            return Mode::Normal;
        }

        match self.focus {
            Focus::Input => match code {
                KeyCode::Enter => self.submit(),
                KeyCode::Backspace => self.controller.form_mut().backspace(),
                KeyCode::Tab | KeyCode::BackTab => self.focus = Focus::List,
                KeyCode::Down => {
                    self.focus = Focus::List;
                }
                KeyCode::Esc => {
                    if self.controller.form().editing_id().is_some() {
                        self.controller.cancel_edit();
                        self.set_status("Edit cancelled.", StatusKind::Info);
                    }
                    self.focus = Focus::List;
                }
                KeyCode::Char(ch) => {
                    self.controller.form_mut().push_char(ch);
                }
                _ => {}
            },
            Focus::List => match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('a') => self.focus = Focus::Input,
                KeyCode::Up => self.move_selection(-1),
                KeyCode::Down => self.move_selection(1),
                KeyCode::PageUp => self.move_selection(-5),
                KeyCode::PageDown => self.move_selection(5),
                KeyCode::Home => self.selected = 0,
                KeyCode::End => {
                    self.selected = self.controller.records().len().saturating_sub(1)
                }
                KeyCode::Char('e') | KeyCode::Char('E') => self.request_edit(),
                KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                    return self.confirm_delete();
                }
                KeyCode::Char('x') => return self.export_by_platform(),
                KeyCode::Char('X') => return self.open_prompt(PromptPurpose::ExportFolder),
                KeyCode::Char('i') | KeyCode::Char('I') => {
                    return self.open_prompt(PromptPurpose::ImportFile);
                }
                _ => {}
            },
        }
        Mode::Normal
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.controller.delete(confirm.id) {
                    Ok(0) => self.set_status(
                        format!("\"{}\" was already gone.", confirm.name),
                        StatusKind::Error,
                    ),
                    Ok(_) => {
                        self.clamp_selection();
                        self.set_status(format!("Deleted \"{}\".", confirm.name), StatusKind::Info);
                    }
                    Err(err) => self.report_error(&err),
                }
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_prompt(&mut self, code: KeyCode, mut prompt: PathPrompt) -> Mode {
        match code {
            KeyCode::Esc => {
                match prompt.purpose {
                    PromptPurpose::ExportFolder => {
                        let err = self.controller.decline_export();
                        self.report_error(&err);
                    }
                    PromptPurpose::ImportFile => {
                        self.set_status("Import cancelled.", StatusKind::Info);
                    }
                }
                Mode::Normal
            }
            KeyCode::Enter => {
                let Some(path) = prompt.resolved() else {
                    prompt.error = Some(prompt.missing_value_message().to_string());
                    return Mode::Prompt(prompt);
                };
                let started = match prompt.purpose {
                    PromptPurpose::ExportFolder => self.controller.start_export(path),
                    PromptPurpose::ImportFile => self.controller.start_import(path),
                };
                match started {
                    Ok(()) => {
                        let verb = match prompt.purpose {
                            PromptPurpose::ExportFolder => "Exporting",
                            PromptPurpose::ImportFile => "Importing",
                        };
                        self.set_status(
                            format!("{verb} database... Esc to cancel."),
                            StatusKind::Info,
                        );
                        Mode::Normal
                    }
                    Err(err) => {
                        prompt.error = Some(err.user_message());
                        Mode::Prompt(prompt)
                    }
                }
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Mode::Prompt(prompt)
            }
            KeyCode::Char(ch) => {
                prompt.push_char(ch);
                Mode::Prompt(prompt)
            }
            _ => Mode::Prompt(prompt),
        }
    }

    fn submit(&mut self) {
        match self.controller.submit() {
            Ok(Submitted::Added(record)) => {
                self.selected = self.controller.records().len().saturating_sub(1);
                self.set_status(format!("Added \"{}\".", record.name), StatusKind::Info);
            }
            Ok(Submitted::Updated(record)) => {
                if let Some(idx) = self.controller.records().position(record.id) {
                    self.selected = idx;
                }
                self.set_status(format!("Updated \"{}\".", record.name), StatusKind::Info);
            }
            Err(err) => {
                self.clamp_selection();
                self.report_error(&err);
            }
        }
    }

    fn request_edit(&mut self) {
        let Some(record) = self.controller.records().at(self.selected).cloned() else {
            self.set_status("No name selected to edit.", StatusKind::Error);
            return;
        };
        match self.controller.request_edit(record.id) {
            Ok(()) => {
                self.focus = Focus::Input;
                self.clear_status();
            }
            Err(err) => self.report_error(&err),
        }
    }

    fn confirm_delete(&mut self) -> Mode {
        if let Some(op) = self.controller.pending() {
            self.report_error(&AppError::Busy(op));
            return Mode::Normal;
        }
        match self.controller.records().at(self.selected) {
            Some(record) => {
                let confirm = ConfirmDelete::from(record);
                self.clear_status();
                Mode::ConfirmDelete(confirm)
            }
            None => {
                self.set_status("No name selected to delete.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    /// Restricted platforms ask for a folder first; others hand the file to the OS.
    fn export_by_platform(&mut self) -> Mode {
        match self.platform {
            Platform::Restricted => self.open_prompt(PromptPurpose::ExportFolder),
            Platform::Unrestricted => {
                match self.controller.share_store(self.share.as_ref()) {
                    Ok(()) => self.set_status(
                        format!(
                            "Opened the folder containing {}.",
                            self.controller.store().path().display()
                        ),
                        StatusKind::Info,
                    ),
                    Err(err) => self.report_error(&err),
                }
                Mode::Normal
            }
        }
    }

    fn open_prompt(&mut self, purpose: PromptPurpose) -> Mode {
        if let Some(op) = self.controller.pending() {
            self.report_error(&AppError::Busy(op));
            return Mode::Normal;
        }
        self.clear_status();
        Mode::Prompt(PathPrompt::new(purpose))
    }

    fn move_selection(&mut self, offset: isize) {
        let len = self.controller.records().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.records().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn report_error(&mut self, err: &AppError) {
        let kind = match err.kind() {
            ErrorKind::Cancelled => StatusKind::Info,
            _ => StatusKind::Error,
        };
        self.set_status(err.user_message(), kind);
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        if self.phase == Phase::Loading {
            let loading = Paragraph::new("Loading...").alignment(Alignment::Center);
            frame.render_widget(loading, centered_rect(50, 20, area));
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_input(frame, chunks[0]);
        self.draw_buttons(frame, chunks[1]);
        self.draw_records(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);

        match &self.mode {
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Prompt(prompt) => self.draw_prompt(frame, area, prompt),
            Mode::Normal => {}
        }
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let form = self.controller.form();
        let title = match form.target() {
            FormTarget::Add => "Name".to_string(),
            FormTarget::Edit { id } => format!("Edit name #{id} (Enter to save, Esc to cancel)"),
        };
        let focused = self.focus == Focus::Input && matches!(self.mode, Mode::Normal);
        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        let (visible, cursor) = input_tail(form.draft(), inner.width);
        let content = if form.draft().is_empty() {
            Line::from(Span::styled("Name", Style::default().fg(Color::DarkGray)))
        } else {
            Line::from(visible)
        };
        frame.render_widget(Paragraph::new(content).block(block), area);

        if focused {
            frame.set_cursor_position((inner.x.saturating_add(cursor), inner.y));
        }
    }

    fn draw_buttons(&self, frame: &mut Frame, area: Rect) {
        let enabled = !self.controller.is_busy();
        let mut spans = button("Add Name", "Enter", enabled);
        spans.extend(button("Export Database", "x", enabled));
        spans.extend(button("Import Database", "i", enabled));
        if let Some(kind) = self.controller.transfer_kind() {
            let label = match kind {
                TransferKind::Export => "exporting...",
                TransferKind::Import => "importing...",
            };
            spans.push(Span::styled(label, Style::default().fg(Color::Yellow)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_records(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Names");
        let records = self.controller.records();
        if records.is_empty() {
            let message = Paragraph::new("No names yet. Type a name and press Enter.")
                .alignment(Alignment::Center)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let inner_width = block.inner(area).width as usize;
        let name_width = inner_width.saturating_sub(ROW_HINT_WIDTH + 2);
        let hint_style = Style::default().fg(Color::DarkGray);
        let items: Vec<ListItem> = records
            .iter()
            .map(|record| {
                ListItem::new(Line::from(vec![
                    Span::raw(fit_width(&record.name, name_width)),
                    Span::styled("  [e] Edit  [d] Delete", hint_style),
                ]))
            })
            .collect();

        let highlight = if self.focus == Focus::List {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight)
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let pairs: &[(&str, &str)] = match (&self.mode, self.focus) {
            (Mode::ConfirmDelete(_), _) => &[("[y]", " Delete   "), ("[n]", " Keep")],
            (Mode::Prompt(_), _) => &[("[Enter]", " Confirm   "), ("[Esc]", " Cancel")],
            (Mode::Normal, _) if self.controller.transfer_kind().is_some() => {
                &[("[Esc]", " Cancel transfer")]
            }
            (Mode::Normal, Focus::Input) => &[
                ("[Enter]", " Save   "),
                ("[Tab]", " List   "),
                ("[Ctrl+E]", " Export   "),
                ("[Ctrl+O]", " Import"),
            ],
            (Mode::Normal, Focus::List) => &[
                ("[↑↓]", " Select   "),
                ("[e]", " Edit   "),
                ("[d]", " Delete   "),
                ("[x/X]", " Export   "),
                ("[i]", " Import   "),
                ("[Tab]", " Type   "),
                ("[q]", " Quit"),
            ],
        };
        Line::from(
            pairs
                .iter()
                .flat_map(|(key, label)| {
                    [Span::styled(*key, key_style), Span::raw(*label)]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Name").borders(Borders::ALL);
        let lines = vec![
            Line::from(format!("Delete \"{}\"?", confirm.name)),
            Line::from(""),
            Line::from(Span::styled(
                "y to delete • n to keep",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, prompt: &PathPrompt) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(prompt.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let (prompt_line, cursor) = prompt.build_line(inner.width);
        let mut lines = vec![prompt_line, Line::from("")];
        if let Some(error) = &prompt.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            let hint = match prompt.purpose {
                PromptPurpose::ExportFolder => "Enter to grant access • Esc to deny",
                PromptPurpose::ImportFile => "Enter to import (replaces all names) • Esc to cancel",
            };
            lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let cursor = cursor.min(inner.width.saturating_sub(1));
        frame.set_cursor_position((inner.x.saturating_add(cursor), inner.y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::error::Result;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::Path;
    use tempfile::TempDir;

    struct NoShare;

    impl ShareTarget for NoShare {
        fn share(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn app(dir: &TempDir, platform: Platform) -> App {
        let store = Store::open(dir.path().join("SQLite").join("names.db")).unwrap();
        App::new(Controller::new(store), platform, Box::new(NoShare))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch));
        }
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn status_text(app: &App) -> Option<&str> {
        app.status.as_ref().map(|status| status.text.as_str())
    }

    #[test]
    fn loading_switches_to_ready_once() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        assert_eq!(app.phase(), Phase::Loading);
        assert!(screen_text(&app).contains("Loading..."));
        assert!(!app.handle_key(KeyCode::Char('a')));

        app.load();
        assert_eq!(app.phase(), Phase::Ready);
        assert!(screen_text(&app).contains("No names yet"));
    }

    #[test]
    fn typing_and_enter_adds_a_name() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();

        type_text(&mut app, "Ada");
        app.handle_key(KeyCode::Enter);

        assert_eq!(app.controller().records().len(), 1);
        assert!(app.controller().form().draft().is_empty());
        assert!(screen_text(&app).contains("Ada"));
    }

    #[test]
    fn empty_enter_shows_validation_message() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();
        app.handle_key(KeyCode::Enter);
        assert_eq!(status_text(&app), Some("Please enter a name"));
        assert!(app.controller().records().is_empty());
    }

    #[test]
    fn edit_from_list_updates_the_row() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();
        type_text(&mut app, "Grace");
        app.handle_key(KeyCode::Enter);

        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.controller().form().draft(), "Grace");
        type_text(&mut app, " Hopper");
        app.handle_key(KeyCode::Enter);

        let records = app.controller().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records.at(0).unwrap().name, "Grace Hopper");
    }

    #[test]
    fn delete_requires_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();
        type_text(&mut app, "Linus");
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Tab);

        app.handle_key(KeyCode::Char('d'));
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.controller().records().len(), 1);

        app.handle_key(KeyCode::Char('d'));
        app.handle_key(KeyCode::Char('y'));
        assert!(app.controller().records().is_empty());
    }

    #[test]
    fn dismissing_export_prompt_denies_permission() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Platform::Restricted);
        app.load();
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Char('x'));
        assert!(matches!(app.mode, Mode::Prompt(_)));
        app.handle_key(KeyCode::Esc);
        assert_eq!(status_text(&app), Some("Permission not granted"));
    }

    #[test]
    fn unrestricted_export_shares_directly() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();
        app.handle_ctrl(KeyCode::Char('e'));
        assert!(matches!(app.mode, Mode::Normal));
        assert!(status_text(&app).unwrap().starts_with("Opened the folder"));
    }

    #[test]
    fn folder_export_finishes_on_tick() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Char('X'));
        type_text(&mut app, dest.to_str().unwrap());
        app.handle_key(KeyCode::Enter);
        assert!(app.controller().is_busy());

        while app.controller().is_busy() {
            std::thread::sleep(std::time::Duration::from_millis(5));
            app.tick();
        }
        assert!(dest.join("names.db").exists());
        assert!(status_text(&app).unwrap().starts_with("Exported database"));
    }

    fn start_import(app: &mut App, source: &Path) {
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Char('i'));
        type_text(app, source.to_str().unwrap());
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.controller().transfer_kind(), Some(TransferKind::Import));
    }

    fn tick_until_idle(app: &mut App) {
        while app.controller().is_busy() {
            std::thread::sleep(std::time::Duration::from_millis(5));
            app.tick();
        }
    }

    fn leftover_files(dir: &TempDir) -> Vec<String> {
        std::fs::read_dir(dir.path().join("SQLite"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name != "names.db")
            .collect()
    }

    #[test]
    fn background_import_of_garbage_reports_database_error() {
        let dir = TempDir::new().unwrap();
        let garbage = dir.path().join("garbage.db");
        std::fs::write(&garbage, vec![b'x'; 4096]).unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();
        type_text(&mut app, "Ada");
        app.handle_key(KeyCode::Enter);

        start_import(&mut app, &garbage);
        tick_until_idle(&mut app);

        assert!(status_text(&app).unwrap().starts_with("Database error"));
        assert!(screen_text(&app).contains("Database error"));
        assert!(app.controller().records().is_empty());
        assert!(leftover_files(&dir).is_empty());
    }

    #[test]
    fn escape_cancels_a_running_import() {
        let dir = TempDir::new().unwrap();
        let big = dir.path().join("big.db");
        std::fs::write(&big, vec![b'x'; 16 * 1024 * 1024]).unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();
        type_text(&mut app, "Ada");
        app.handle_key(KeyCode::Enter);

        start_import(&mut app, &big);
        app.handle_key(KeyCode::Esc);
        assert_eq!(status_text(&app), Some("Cancelling transfer..."));
        tick_until_idle(&mut app);

        // The worker may have finished the copy before it saw the request.
        let status = status_text(&app).unwrap();
        if status == "Transfer cancelled." {
            let names: Vec<&str> =
                app.controller().records().iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, vec!["Ada"]);
            assert_eq!(app.controller().store().list_all().unwrap().len(), 1);
        } else {
            assert!(status.starts_with("Database error"), "unexpected status: {status}");
        }
        assert!(app.controller().transfer_kind().is_none());
        assert!(leftover_files(&dir).is_empty());
    }

    #[test]
    fn shutdown_stops_a_running_import() {
        let dir = TempDir::new().unwrap();
        let big = dir.path().join("big.db");
        std::fs::write(&big, vec![b'x'; 16 * 1024 * 1024]).unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();

        start_import(&mut app, &big);
        app.shutdown();

        assert!(!app.controller().is_busy());
        assert!(app.controller().transfer_kind().is_none());
        assert!(leftover_files(&dir).is_empty());
        app.shutdown();
    }

    #[test]
    fn very_long_draft_keeps_cursor_in_the_box() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();
        app.controller.form_mut().set_draft("a".repeat(65_535));

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();
        assert!(cursor.x < 79, "cursor escaped the input: {cursor:?}");
        assert!(screen_text(&app).contains(&"a".repeat(70)));
    }

    #[test]
    fn very_long_prompt_value_keeps_cursor_in_the_popup() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Platform::Unrestricted);
        app.load();
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Char('i'));
        if let Mode::Prompt(prompt) = &mut app.mode {
            prompt.value = "p".repeat(70_000);
        }

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();
        let popup = centered_rect(70, 30, Rect::new(0, 0, 80, 20));
        assert!(cursor.x < popup.x + popup.width - 1, "cursor escaped the popup: {cursor:?}");
    }
}
