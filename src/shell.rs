use crossterm::event::{KeyCode, KeyEvent};
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use serde::Deserialize;

use crate::protocol::{ApiRequest, ApiResponse, NetworkSystem};
use crate::transport::ApiClient;
use crate::views::classifier::ClassifierView;
use crate::views::config_generator::ConfigGeneratorView;
use crate::views::translator::TranslatorView;
use crate::views::xml_formatter::XmlFormatterView;
use crate::views::{Ticket, View};

#[derive(clap::ValueEnum, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    Classifier,
    Translator,
    ConfigGenerator,
    XmlFormatter,
}

impl Tool {
    pub const ALL: [Self; 4] = [
        Self::Classifier,
        Self::Translator,
        Self::ConfigGenerator,
        Self::XmlFormatter,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Classifier => "Error Classifier",
            Self::Translator => "Command Translator",
            Self::ConfigGenerator => "Config Generator",
            Self::XmlFormatter => "XML Formatter",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Classifier => 0,
            Self::Translator => 1,
            Self::ConfigGenerator => 2,
            Self::XmlFormatter => 3,
        }
    }

    /// F1 selects the first tool, F2 the second and so on.
    fn from_function_key(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }
}

/// The one mounted view. Its state lives exactly as long as it is mounted.
pub enum ActiveView {
    Classifier(ClassifierView),
    Translator(TranslatorView),
    ConfigGenerator(ConfigGeneratorView),
    XmlFormatter(XmlFormatterView),
}

macro_rules! on_view {
    ($view:expr, $v:ident => $body:expr) => {
        match $view {
            ActiveView::Classifier($v) => $body,
            ActiveView::Translator($v) => $body,
            ActiveView::ConfigGenerator($v) => $body,
            ActiveView::XmlFormatter($v) => $body,
        }
    };
}

/// A request the front end must send on behalf of the mounted view.
#[derive(Debug)]
pub struct Dispatch {
    pub mount: u64,
    pub ticket: Ticket,
    pub request: ApiRequest,
}

impl Dispatch {
    pub fn complete(self, response: ApiResponse) -> Completion {
        Completion {
            mount: self.mount,
            ticket: self.ticket,
            response,
        }
    }

    pub async fn send(self, client: &ApiClient) -> Completion {
        let Self {
            mount,
            ticket,
            request,
        } = self;
        Completion {
            mount,
            ticket,
            response: client.dispatch(request).await,
        }
    }
}

/// The answer to a [`Dispatch`], routed back to whichever view issued it.
#[derive(Debug)]
pub struct Completion {
    pub mount: u64,
    pub ticket: Ticket,
    pub response: ApiResponse,
}

#[derive(Debug)]
pub enum ShellAction {
    None,
    Submit(Dispatch),
    /// The pending request of the mounted view was abandoned.
    Cancelled,
    /// A different tool was mounted; every in-flight request is now orphaned.
    Switched,
}

#[derive(Clone, Copy)]
enum ShellControls {
    Idle,
    Processing,
}

fn create_controls_paragraph<'t>(state: ShellControls) -> Paragraph<'t> {
    let text = match state {
        ShellControls::Idle => {
            "<C-c>: Exit | F1-F4: Switch Tool | Tab: Next Field | Enter: Submit"
        }
        ShellControls::Processing => "<C-c>: Exit | Esc: Cancel | Enter: Resubmit",
    };
    Paragraph::new(text)
        .block(Block::default().borders(Borders::TOP))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
}

pub struct Shell {
    tool: Tool,
    view: ActiveView,
    mount: u64,
    source_system: NetworkSystem,
    target_system: NetworkSystem,
}

impl Shell {
    pub fn new(tool: Tool, source_system: NetworkSystem, target_system: NetworkSystem) -> Self {
        let mut shell = Self {
            tool,
            view: ActiveView::Classifier(ClassifierView::default()),
            mount: 0,
            source_system,
            target_system,
        };
        shell.view = shell.mount_view(tool);
        shell
    }

    pub const fn tool(&self) -> Tool {
        self.tool
    }

    pub const fn view(&self) -> &ActiveView {
        &self.view
    }

    fn mount_view(&self, tool: Tool) -> ActiveView {
        match tool {
            Tool::Classifier => ActiveView::Classifier(ClassifierView::default()),
            Tool::Translator => {
                ActiveView::Translator(TranslatorView::new(self.source_system, self.target_system))
            }
            Tool::ConfigGenerator => ActiveView::ConfigGenerator(ConfigGeneratorView::default()),
            Tool::XmlFormatter => ActiveView::XmlFormatter(XmlFormatterView::default()),
        }
    }

    /// Mounts `tool`, discarding the current view. Returns false when `tool`
    /// is already mounted.
    pub fn select(&mut self, tool: Tool) -> bool {
        if tool == self.tool {
            return false;
        }
        self.mount += 1;
        self.tool = tool;
        self.view = self.mount_view(tool);
        tracing::debug!(?tool, mount = self.mount, "mounted tool");
        true
    }

    pub fn submit(&mut self) -> Dispatch {
        let (ticket, request) = on_view!(&mut self.view, v => v.submit());
        Dispatch {
            mount: self.mount,
            ticket,
            request,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ShellAction {
        match key.code {
            KeyCode::F(n) => match Tool::from_function_key(n) {
                Some(tool) if self.select(tool) => ShellAction::Switched,
                _ => ShellAction::None,
            },
            KeyCode::Enter => ShellAction::Submit(self.submit()),
            KeyCode::Esc => {
                if on_view!(&mut self.view, v => v.guard().cancel()) {
                    ShellAction::Cancelled
                } else {
                    ShellAction::None
                }
            }
            _ => {
                on_view!(&mut self.view, v => v.handle_key(key));
                ShellAction::None
            }
        }
    }

    /// Applies a completion if the view that issued it is still mounted.
    pub fn complete(&mut self, completion: Completion) -> bool {
        if completion.mount != self.mount {
            tracing::debug!(
                mount = completion.mount,
                current = self.mount,
                "dropping completion for an unmounted view"
            );
            return false;
        }
        on_view!(&mut self.view, v => v.apply(completion.ticket, completion.response));
        true
    }

    pub fn is_pending(&self) -> bool {
        on_view!(&self.view, v => v.is_pending())
    }

    pub fn spin(&mut self) {
        on_view!(&mut self.view, v => v.guard().spin());
    }

    pub fn render<B: Backend>(&self, f: &mut Frame<'_, B>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(2),
            ])
            .split(f.size());

        let titles: Vec<String> = Tool::ALL
            .iter()
            .enumerate()
            .map(|(i, tool)| format!("F{} {}", i + 1, tool.title()))
            .collect();
        let tabs = Tabs::new(titles.into_iter().map(ratatui::text::Spans::from).collect())
            .block(Block::default().borders(Borders::ALL).title("netassist"))
            .select(self.tool.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, chunks[0]);

        on_view!(&self.view, v => v.render(f, chunks[1]));

        let controls = if self.is_pending() {
            ShellControls::Processing
        } else {
            ShellControls::Idle
        };
        f.render_widget(create_controls_paragraph(controls), chunks[2]);
    }
}
