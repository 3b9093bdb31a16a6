use crossterm::event::{KeyCode, KeyEvent};
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Rect};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::{
    error_paragraph, focus_block, output_title, split_form_output, stack_fields, text_paragraph,
    Field, RequestGuard, Ticket, View,
};
use crate::protocol::{
    ApiRequest, ApiResponse, NetworkSystem, TranslationRequest, TranslationResponse,
};
use crate::transport::TransportError;

pub const TRANSLATION_NOT_FOUND: &str = "Translation not found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Source,
    Target,
    Command,
}

impl Focus {
    const fn next(self) -> Self {
        match self {
            Self::Source => Self::Target,
            Self::Target => Self::Command,
            Self::Command => Self::Source,
        }
    }

    const fn previous(self) -> Self {
        match self {
            Self::Source => Self::Command,
            Self::Target => Self::Source,
            Self::Command => Self::Target,
        }
    }
}

pub struct TranslatorView {
    source_system: NetworkSystem,
    target_system: NetworkSystem,
    command: Field,
    focus: Focus,
    translated_command: String,
    error: Option<&'static str>,
    guard: RequestGuard,
}

impl Default for TranslatorView {
    fn default() -> Self {
        Self::new(NetworkSystem::Cisco, NetworkSystem::Arista)
    }
}

impl TranslatorView {
    /// Source and target may be equal; what that means is up to the backend.
    pub fn new(source_system: NetworkSystem, target_system: NetworkSystem) -> Self {
        Self {
            source_system,
            target_system,
            command: Field::new("Source Command"),
            focus: Focus::Command,
            translated_command: String::new(),
            error: None,
            guard: RequestGuard::default(),
        }
    }

    pub fn translated_command(&self) -> &str {
        &self.translated_command
    }

    pub const fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub fn request(&self) -> TranslationRequest {
        TranslationRequest {
            source_system: self.source_system,
            target_system: self.target_system,
            source_command: self.command.value().to_string(),
        }
    }

    pub fn apply_translation(
        &mut self,
        ticket: Ticket,
        result: Result<TranslationResponse, TransportError>,
    ) {
        if !self.guard.settle(ticket) {
            return;
        }
        match result {
            Ok(response) => {
                self.translated_command = response.translated_command;
                self.error = None;
            }
            Err(_) => {
                self.translated_command.clear();
                self.error = Some(TRANSLATION_NOT_FOUND);
            }
        }
    }

    fn selected_system(&mut self) -> Option<&mut NetworkSystem> {
        match self.focus {
            Focus::Source => Some(&mut self.source_system),
            Focus::Target => Some(&mut self.target_system),
            Focus::Command => None,
        }
    }

    fn render_selector<B: Backend>(
        f: &mut Frame<'_, B>,
        area: Rect,
        title: &str,
        system: NetworkSystem,
        focused: bool,
    ) {
        let paragraph = Paragraph::new(format!("< {system} >"))
            .block(focus_block(title.to_string(), focused))
            .alignment(Alignment::Left);
        f.render_widget(paragraph, area);
    }
}

impl View for TranslatorView {
    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Left => {
                if let Some(system) = self.selected_system() {
                    *system = system.previous();
                } else {
                    self.command.handle_key(key);
                }
            }
            KeyCode::Right | KeyCode::Char(' ') => {
                if let Some(system) = self.selected_system() {
                    *system = system.next();
                } else {
                    self.command.handle_key(key);
                }
            }
            _ => {
                if self.focus == Focus::Command {
                    self.command.handle_key(key);
                }
            }
        }
    }

    fn submit(&mut self) -> (Ticket, ApiRequest) {
        (self.guard.issue(), ApiRequest::Translate(self.request()))
    }

    fn apply(&mut self, ticket: Ticket, response: ApiResponse) {
        match response {
            ApiResponse::Translated(result) => self.apply_translation(ticket, result),
            other => tracing::debug!(?other, "translator ignored foreign response"),
        }
    }

    fn guard(&mut self) -> &mut RequestGuard {
        &mut self.guard
    }

    fn is_pending(&self) -> bool {
        self.guard.is_pending()
    }

    fn render<B: Backend>(&self, f: &mut Frame<'_, B>, area: Rect) {
        let (form, output) = split_form_output(area);
        let fields = stack_fields(form, 3);
        Self::render_selector(
            f,
            fields[0],
            "Source System",
            self.source_system,
            self.focus == Focus::Source,
        );
        Self::render_selector(
            f,
            fields[1],
            "Target System",
            self.target_system,
            self.focus == Focus::Target,
        );
        self.command.render(f, fields[2], self.focus == Focus::Command);

        let title = output_title("Translated Command", self.guard.progress());
        if let Some(error) = self.error {
            f.render_widget(error_paragraph(error, title), output);
        } else {
            f.render_widget(text_paragraph(self.translated_command.clone(), title), output);
        }
    }
}
