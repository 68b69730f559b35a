// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::BookId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Browse,
    Form,
}

/// Transient UI state: the active mode, the currently selected record id (if
/// any), and the status line. The selection scopes Update and Delete; it is
/// dropped by Clear, by Reload, and after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub selected: Option<BookId>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Browse,
            selected: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    OpenForm,
    CloseForm,
    SelectBook(BookId),
    ClearSelection,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    SelectionChanged(Option<BookId>),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::OpenForm => {
                self.mode = AppMode::Form;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::CloseForm => {
                self.mode = AppMode::Browse;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::SelectBook(id) => {
                self.selected = Some(id);
                vec![AppEvent::SelectionChanged(self.selected)]
            }
            AppCommand::ClearSelection => {
                if self.selected.take().is_some() {
                    vec![AppEvent::SelectionChanged(None)]
                } else {
                    Vec::new()
                }
            }
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppMode, AppState};
    use crate::BookId;

    #[test]
    fn form_open_and_close() {
        let mut state = AppState::default();

        let opened = state.dispatch(AppCommand::OpenForm);
        assert_eq!(state.mode, AppMode::Form);
        assert_eq!(opened, vec![AppEvent::ModeChanged(AppMode::Form)]);

        let closed = state.dispatch(AppCommand::CloseForm);
        assert_eq!(state.mode, AppMode::Browse);
        assert_eq!(closed, vec![AppEvent::ModeChanged(AppMode::Browse)]);
    }

    #[test]
    fn selection_round_trip() {
        let mut state = AppState::default();

        let selected = state.dispatch(AppCommand::SelectBook(BookId::new(7)));
        assert_eq!(state.selected, Some(BookId::new(7)));
        assert_eq!(
            selected,
            vec![AppEvent::SelectionChanged(Some(BookId::new(7)))]
        );

        let cleared = state.dispatch(AppCommand::ClearSelection);
        assert_eq!(state.selected, None);
        assert_eq!(cleared, vec![AppEvent::SelectionChanged(None)]);
    }

    #[test]
    fn clearing_an_empty_selection_emits_nothing() {
        let mut state = AppState::default();
        assert!(state.dispatch(AppCommand::ClearSelection).is_empty());
    }

    #[test]
    fn status_set_and_clear() {
        let mut state = AppState::default();

        state.dispatch(AppCommand::SetStatus("book added".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("book added"));

        let events = state.dispatch(AppCommand::ClearStatus);
        assert_eq!(state.status_line, None);
        assert_eq!(events, vec![AppEvent::StatusCleared]);
    }
}
