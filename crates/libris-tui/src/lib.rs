// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use libris_app::{AppCommand, AppMode, AppState, Book, BookFormInput, BookId};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;

const FORM_FIELD_COUNT: usize = 5;
const FORM_FIELD_LABELS: [&str; FORM_FIELD_COUNT] =
    ["title", "author", "category", "read", "favorite"];

/// Persistence seam for the event loop. The loop never touches a database
/// directly; the binary supplies an implementation backed by the store.
pub trait AppRuntime {
    fn load_books(&mut self) -> Result<Vec<Book>>;
    fn add_book(&mut self, input: &BookFormInput) -> Result<BookId>;
    fn update_book(&mut self, book_id: BookId, input: &BookFormInput) -> Result<()>;
    fn delete_book(&mut self, book_id: BookId) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub show_id_column: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            show_id_column: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct FormUiState {
    draft: BookFormInput,
    field_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDelete {
    book_id: BookId,
    title: String,
}

/// Everything the renderer needs beyond [`AppState`]: the loaded rows, the
/// positional cursor into them, and the overlay states. Rows are addressed
/// by index into `books`; the list order is whatever the last reload
/// returned, so index and record stay in lockstep until the next reload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    books: Vec<Book>,
    cursor: usize,
    form: Option<FormUiState>,
    pending_delete: Option<PendingDelete>,
    help_visible: bool,
    show_id_column: bool,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        show_id_column: options.show_id_column,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_books(runtime, &mut view_data) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn refresh_books<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    view_data.books = runtime.load_books()?;
    if view_data.books.is_empty() {
        view_data.cursor = 0;
    } else {
        view_data.cursor = view_data.cursor.min(view_data.books.len() - 1);
    }
    Ok(())
}

fn cursor_book(view_data: &ViewData) -> Option<&Book> {
    view_data.books.get(view_data.cursor)
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.pending_delete.is_some() {
        handle_confirm_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match state.mode {
        AppMode::Browse => handle_browse_key(state, runtime, view_data, internal_tx, key),
        AppMode::Form => {
            handle_form_key(state, runtime, view_data, internal_tx, key);
            false
        }
    }
}

fn handle_browse_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('j') | KeyCode::Down, _) => {
            if view_data.cursor + 1 < view_data.books.len() {
                view_data.cursor += 1;
            }
        }
        (KeyCode::Char('k') | KeyCode::Up, _) => {
            view_data.cursor = view_data.cursor.saturating_sub(1);
        }
        (KeyCode::Char('g'), KeyModifiers::NONE) => {
            view_data.cursor = 0;
        }
        (KeyCode::Char('G'), _) => {
            view_data.cursor = view_data.books.len().saturating_sub(1);
        }
        (KeyCode::Enter, _) => {
            let Some(book) = cursor_book(view_data).cloned() else {
                emit_status(state, view_data, internal_tx, "no books to edit");
                return false;
            };
            state.dispatch(AppCommand::SelectBook(book.id));
            view_data.form = Some(FormUiState {
                draft: BookFormInput::from_book(&book),
                field_index: 0,
            });
            state.dispatch(AppCommand::OpenForm);
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            state.dispatch(AppCommand::ClearSelection);
            view_data.form = Some(FormUiState::default());
            state.dispatch(AppCommand::OpenForm);
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            let Some(book) = cursor_book(view_data).cloned() else {
                emit_status(state, view_data, internal_tx, "select a book first");
                return false;
            };
            view_data.pending_delete = Some(PendingDelete {
                book_id: book.id,
                title: book.title,
            });
        }
        (KeyCode::Char('c'), KeyModifiers::NONE) => {
            state.dispatch(AppCommand::ClearSelection);
            emit_status(state, view_data, internal_tx, "selection cleared");
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            state.dispatch(AppCommand::ClearSelection);
            match refresh_books(runtime, view_data) {
                Ok(()) => {
                    let count = view_data.books.len();
                    emit_status(state, view_data, internal_tx, format!("{count} books"));
                }
                Err(error) => {
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("load failed: {error}"),
                    );
                }
            }
        }
        (KeyCode::Char('?'), KeyModifiers::NONE) => {
            view_data.help_visible = true;
        }
        _ => {}
    }
    false
}

/// Only an explicit yes carries out the delete; any other key cancels.
fn handle_confirm_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(pending) = view_data.pending_delete.take() else {
        return;
    };

    if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
        emit_status(state, view_data, internal_tx, "delete canceled");
        return;
    }

    if let Err(error) = runtime.delete_book(pending.book_id) {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("delete failed: {error}"),
        );
        return;
    }

    state.dispatch(AppCommand::ClearSelection);
    if let Err(error) = refresh_books(runtime, view_data) {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("load failed: {error}"),
        );
        return;
    }
    emit_status(state, view_data, internal_tx, "book deleted");
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if view_data.form.is_none() {
        state.dispatch(AppCommand::CloseForm);
        return;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            view_data.form = None;
            state.dispatch(AppCommand::CloseForm);
            state.dispatch(AppCommand::ClearSelection);
            emit_status(state, view_data, internal_tx, "edit canceled");
        }
        (KeyCode::Char('r'), KeyModifiers::CONTROL) => {
            if let Some(form) = view_data.form.as_mut() {
                form.draft = BookFormInput::default();
                form.field_index = 0;
            }
            state.dispatch(AppCommand::ClearSelection);
            emit_status(state, view_data, internal_tx, "form cleared");
        }
        (KeyCode::Enter, _) => {
            submit_form(state, runtime, view_data, internal_tx);
        }
        _ => {
            if let Some(form) = view_data.form.as_mut() {
                edit_form_field(form, key);
            }
        }
    }
}

fn edit_form_field(form: &mut FormUiState, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Tab, _) => {
            form.field_index = (form.field_index + 1) % FORM_FIELD_COUNT;
        }
        (KeyCode::BackTab, _) => {
            form.field_index = (form.field_index + FORM_FIELD_COUNT - 1) % FORM_FIELD_COUNT;
        }
        (KeyCode::Backspace, _) => {
            if let Some(field) = text_field_mut(&mut form.draft, form.field_index) {
                field.pop();
            }
        }
        (KeyCode::Char(' '), KeyModifiers::NONE) if form.field_index >= 3 => {
            toggle_flag_field(&mut form.draft, form.field_index);
        }
        (KeyCode::Char(character), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
            if let Some(field) = text_field_mut(&mut form.draft, form.field_index) {
                field.push(character);
            }
        }
        _ => {}
    }
}

fn text_field_mut(draft: &mut BookFormInput, field_index: usize) -> Option<&mut String> {
    match field_index {
        0 => Some(&mut draft.title),
        1 => Some(&mut draft.author),
        2 => Some(&mut draft.category),
        _ => None,
    }
}

fn toggle_flag_field(draft: &mut BookFormInput, field_index: usize) {
    match field_index {
        3 => draft.is_read = !draft.is_read,
        4 => draft.is_favorite = !draft.is_favorite,
        _ => {}
    }
}

/// Submit routes on the selection: a selected id means update, none means
/// add. Either way a successful write reloads the list and resets the form.
fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(form) = view_data.form.clone() else {
        return;
    };

    if let Err(error) = form.draft.validate() {
        emit_status(state, view_data, internal_tx, error.to_string());
        return;
    }

    let outcome = match state.selected {
        Some(book_id) => runtime
            .update_book(book_id, &form.draft)
            .map(|()| "book updated"),
        None => runtime.add_book(&form.draft).map(|_| "book added"),
    };

    match outcome {
        Ok(message) => {
            view_data.form = None;
            state.dispatch(AppCommand::CloseForm);
            state.dispatch(AppCommand::ClearSelection);
            if let Err(error) = refresh_books(runtime, view_data) {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("load failed: {error}"),
                );
                return;
            }
            emit_status(state, view_data, internal_tx, message);
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("save failed: {error}"));
        }
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(view_data))
        .style(Style::default().fg(Color::White))
        .block(Block::default().title("libris").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    render_table(frame, layout[1], view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(form) = &view_data.form {
        let area = centered_rect(60, 55, frame.area());
        frame.render_widget(Clear, area);
        let title = if state.selected.is_some() {
            "edit book"
        } else {
            "add book"
        };
        let overlay = Paragraph::new(render_form_overlay_text(form))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(overlay, area);
    }

    if let Some(pending) = &view_data.pending_delete {
        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);
        let confirm = Paragraph::new(format!(
            "delete \"{}\"?\n\ny confirm | any other key cancel",
            pending.title
        ))
        .block(
            Block::default()
                .title("confirm delete")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(confirm, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 55, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn header_text(view_data: &ViewData) -> String {
    format!("{} books | newest first", view_data.books.len())
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let mut labels = vec!["title", "author", "category", "read", "fav", "added"];
    if view_data.show_id_column {
        labels.insert(0, "id");
    }
    let columns = labels.len();

    let header_cells = labels.into_iter().map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells);

    let rows = view_data.books.iter().enumerate().map(|(row_index, book)| {
        let mut values = vec![
            book.title.clone(),
            book.author.clone(),
            book.category.clone(),
            yes_no(book.is_read).to_owned(),
            yes_no(book.is_favorite).to_owned(),
            format_added(book.created_at),
        ];
        if view_data.show_id_column {
            values.insert(0, book.id.get().to_string());
        }

        let style = if row_index == view_data.cursor {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(values.into_iter().map(Cell::from)).style(style)
    });

    let widths = vec![Constraint::Min(6); columns];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title("books").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_form_overlay_text(form: &FormUiState) -> String {
    let values = [
        form.draft.title.clone(),
        form.draft.author.clone(),
        form.draft.category.clone(),
        yes_no(form.draft.is_read).to_owned(),
        yes_no(form.draft.is_favorite).to_owned(),
    ];

    let mut lines = Vec::with_capacity(FORM_FIELD_COUNT + 2);
    for (index, (label, value)) in FORM_FIELD_LABELS.iter().zip(values.iter()).enumerate() {
        let marker = if index == form.field_index { ">" } else { " " };
        lines.push(format!("{marker} {label:<9} {value}"));
    }
    lines.push(String::new());
    lines.push(
        "tab/shift+tab field | space toggle | ctrl+r clear | enter save | esc cancel".to_owned(),
    );
    lines.join("\n")
}

fn help_overlay_text() -> &'static str {
    "browse: j/k move | g/G first/last | enter edit | a add | d delete | c clear selection\n\
browse: r reload | ? help | q or ctrl+q quit\n\
form: tab/shift+tab field | type to edit | space toggle read/favorite\n\
form: ctrl+r clear form | enter save | esc cancel\n\
confirm: y delete | any other key cancel"
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let mode = match state.mode {
        AppMode::Browse => "BROWSE",
        AppMode::Form => {
            if state.selected.is_some() {
                "EDIT"
            } else {
                "ADD"
            }
        }
    };

    let default = if view_data.pending_delete.is_some() {
        "y confirm | any other key cancel".to_owned()
    } else {
        match state.mode {
            AppMode::Browse => "j/k | enter edit | a add | d del | r reload | ? help | q".to_owned(),
            AppMode::Form => {
                let field = FORM_FIELD_LABELS[view_data
                    .form
                    .as_ref()
                    .map(|form| form.field_index)
                    .unwrap_or(0)];
                format!("field: {field} | tab next | enter save | esc cancel")
            }
        }
    };

    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {default}"),
        None => format!("{mode} | {default}"),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn format_added(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
