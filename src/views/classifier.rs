use crossterm::event::KeyEvent;
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, List, ListItem};
use ratatui::Frame;

use super::{
    error_paragraph, output_title, split_form_output, stack_fields, Field, RequestGuard, Ticket,
    View,
};
use crate::protocol::{ApiRequest, ApiResponse, ClassificationRequest, ClassificationResponse};
use crate::transport::TransportError;

pub const FETCH_FAILED: &str = "An error occurred while fetching data from the API.";

pub struct ClassifierView {
    message: Field,
    recommendations: Vec<String>,
    error: Option<&'static str>,
    guard: RequestGuard,
}

impl Default for ClassifierView {
    fn default() -> Self {
        Self {
            message: Field::new("Input Error Message"),
            recommendations: Vec::new(),
            error: None,
            guard: RequestGuard::default(),
        }
    }
}

impl ClassifierView {
    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub const fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub fn request(&self) -> ClassificationRequest {
        ClassificationRequest {
            error_message: self.message.value().to_string(),
        }
    }

    pub fn apply_classification(
        &mut self,
        ticket: Ticket,
        result: Result<ClassificationResponse, TransportError>,
    ) {
        if !self.guard.settle(ticket) {
            return;
        }
        match result {
            Ok(response) => {
                self.recommendations = response.recommendations;
                self.error = None;
            }
            Err(_) => {
                self.recommendations.clear();
                self.error = Some(FETCH_FAILED);
            }
        }
    }
}

impl View for ClassifierView {
    fn handle_key(&mut self, key: KeyEvent) {
        self.message.handle_key(key);
    }

    fn submit(&mut self) -> (Ticket, ApiRequest) {
        (self.guard.issue(), ApiRequest::Classify(self.request()))
    }

    fn apply(&mut self, ticket: Ticket, response: ApiResponse) {
        match response {
            ApiResponse::Classified(result) => self.apply_classification(ticket, result),
            other => tracing::debug!(?other, "classifier ignored foreign response"),
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
        let fields = stack_fields(form, 1);
        self.message.render(f, fields[0], true);

        let title = output_title("Recommendations", self.guard.progress());
        if let Some(error) = self.error {
            f.render_widget(error_paragraph(error, title), output);
        } else {
            let items: Vec<ListItem> = self
                .recommendations
                .iter()
                .map(|rec| ListItem::new(format!("• {rec}")))
                .collect();
            let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(list, output);
        }
    }
}
