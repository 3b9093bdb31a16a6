pub mod classifier;
pub mod config_generator;
pub mod translator;
pub mod xml_formatter;

use std::fmt::Display;

use crossterm::event::{Event, KeyEvent};
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::protocol::{ApiRequest, ApiResponse};

/// Behaviour shared by every tool the shell can mount.
pub trait View {
    fn handle_key(&mut self, key: KeyEvent);

    /// Builds the request for the current form contents. No validation: an
    /// empty form is submitted as-is.
    fn submit(&mut self) -> (Ticket, ApiRequest);

    /// Applies a completed request. Completions whose ticket is not the latest
    /// one issued, or whose response belongs to another tool, are dropped.
    fn apply(&mut self, ticket: Ticket, response: ApiResponse);

    fn guard(&mut self) -> &mut RequestGuard;

    fn is_pending(&self) -> bool;

    fn render<B: Backend>(&self, f: &mut Frame<'_, B>, area: Rect);
}

/// Identifies one submission of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum RequestProgress {
    #[default]
    Waiting,
    S0,
    S1,
    S2,
    S3,
}

impl RequestProgress {
    const fn next_state(self) -> Self {
        match self {
            Self::Waiting | Self::S3 => Self::S0,
            Self::S0 => Self::S1,
            Self::S1 => Self::S2,
            Self::S2 => Self::S3,
        }
    }
}

impl Display for RequestProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, ""),
            Self::S0 => write!(f, "-"),
            Self::S1 => write!(f, "\\"),
            Self::S2 => write!(f, "|"),
            Self::S3 => write!(f, "/"),
        }
    }
}

/// Request-sequence guard: only the most recently issued ticket may settle.
#[derive(Debug, Default)]
pub struct RequestGuard {
    issued: u64,
    pending: Option<Ticket>,
    progress: RequestProgress,
}

impl RequestGuard {
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.pending = Some(ticket);
        self.progress = RequestProgress::S0;
        ticket
    }

    /// Returns whether `ticket` is the pending one; if so the guard goes idle.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            self.progress = RequestProgress::Waiting;
            true
        } else {
            tracing::debug!(?ticket, latest = self.issued, "dropping stale completion");
            false
        }
    }

    /// Forgets the pending request so its completion is ignored.
    pub fn cancel(&mut self) -> bool {
        self.progress = RequestProgress::Waiting;
        self.pending.take().is_some()
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn spin(&mut self) {
        if self.is_pending() {
            self.progress = self.progress.next_state();
        }
    }

    pub const fn progress(&self) -> RequestProgress {
        self.progress
    }
}

/// Single-line labelled text input.
pub struct Field {
    title: &'static str,
    input: Input,
}

impl Field {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            input: Input::default(),
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.input.handle_event(&Event::Key(key));
    }

    pub fn render<B: Backend>(&self, f: &mut Frame<'_, B>, area: Rect, focused: bool) {
        let width = area.width.max(3) - 3; // keep 2 for borders and 1 for cursor
        let scroll = self.input.visual_scroll(width as usize);
        let paragraph = Paragraph::new(self.input.value().to_string())
            .block(focus_block(self.title.to_string(), focused))
            .alignment(Alignment::Left)
            .scroll((0, u16::try_from(scroll).unwrap_or_default()));
        f.render_widget(paragraph, area);
        if focused {
            f.set_cursor(
                area.x
                    + u16::try_from(self.input.visual_cursor().max(scroll) - scroll)
                        .unwrap_or_default()
                    + 1,
                area.y + 1,
            );
        }
    }
}

pub(crate) fn focus_block<'t>(title: String, focused: bool) -> Block<'t> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

/// Left half holds the form, right half the result, like the browser layout
/// the backend was designed for.
pub(crate) fn split_form_output(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Stacks `n` single-line fields at the top of `area`; the last chunk is what
/// remains below them.
pub(crate) fn stack_fields(area: Rect, n: usize) -> Vec<Rect> {
    let mut constraints = vec![Constraint::Length(3); n];
    constraints.push(Constraint::Min(0));
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

pub(crate) fn output_title(title: &str, progress: RequestProgress) -> String {
    format!("{title} {progress}")
}

pub(crate) fn error_paragraph<'t>(error: &'static str, title: String) -> Paragraph<'t> {
    Paragraph::new(error)
        .style(
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true })
}

pub(crate) fn text_paragraph<'t>(text: String, title: String) -> Paragraph<'t> {
    Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
}
