use crossterm::event::KeyEvent;
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::Frame;

use super::{
    error_paragraph, output_title, split_form_output, stack_fields, text_paragraph, Field,
    RequestGuard, Ticket, View,
};
use crate::protocol::{ApiRequest, ApiResponse, XmlRequest, XmlResponse};
use crate::transport::TransportError;

pub const FORMATTING_FAILED: &str = "XML formatting failed.";

pub struct XmlFormatterView {
    command: Field,
    xml_command: String,
    error: Option<&'static str>,
    guard: RequestGuard,
}

impl Default for XmlFormatterView {
    fn default() -> Self {
        Self {
            command: Field::new("Command"),
            xml_command: String::new(),
            error: None,
            guard: RequestGuard::default(),
        }
    }
}

impl XmlFormatterView {
    pub fn xml_command(&self) -> &str {
        &self.xml_command
    }

    pub const fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub fn request(&self) -> XmlRequest {
        XmlRequest {
            command: self.command.value().to_string(),
        }
    }

    pub fn apply_xml(&mut self, ticket: Ticket, result: Result<XmlResponse, TransportError>) {
        if !self.guard.settle(ticket) {
            return;
        }
        match result {
            Ok(response) => {
                self.xml_command = response.xml_command;
                self.error = None;
            }
            Err(_) => {
                self.xml_command.clear();
                self.error = Some(FORMATTING_FAILED);
            }
        }
    }
}

impl View for XmlFormatterView {
    fn handle_key(&mut self, key: KeyEvent) {
        self.command.handle_key(key);
    }

    fn submit(&mut self) -> (Ticket, ApiRequest) {
        (self.guard.issue(), ApiRequest::FormatXml(self.request()))
    }

    fn apply(&mut self, ticket: Ticket, response: ApiResponse) {
        match response {
            ApiResponse::XmlFormatted(result) => self.apply_xml(ticket, result),
            other => tracing::debug!(?other, "xml formatter ignored foreign response"),
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
        self.command.render(f, fields[0], true);

        let title = output_title("XML", self.guard.progress());
        if let Some(error) = self.error {
            f.render_widget(error_paragraph(error, title), output);
        } else {
            f.render_widget(text_paragraph(self.xml_command.clone(), title), output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{XmlFormatterView, FORMATTING_FAILED};
    use crate::protocol::{ApiResponse, ClassificationResponse, XmlResponse};
    use crate::views::tests::{render_lines, type_text};
    use crate::views::View;

    #[test]
    fn shows_formatted_xml() {
        let mut view = XmlFormatterView::default();
        type_text(&mut view, "show version");
        assert_eq!(view.request().command, "show version");

        let (ticket, _) = view.submit();
        view.apply(
            ticket,
            ApiResponse::XmlFormatted(Ok(XmlResponse {
                xml_command: "<show><version/></show>".to_string(),
            })),
        );
        assert_eq!(view.xml_command(), "<show><version/></show>");
        let lines = render_lines(&view, 80, 8);
        assert!(lines.iter().any(|l| l.contains("<show><version/></show>")));
        assert!(!lines.iter().any(|l| l.contains(FORMATTING_FAILED)));
    }

    #[test]
    fn foreign_response_leaves_request_pending() {
        let mut view = XmlFormatterView::default();
        let (ticket, _) = view.submit();
        view.apply(
            ticket,
            ApiResponse::Classified(Ok(ClassificationResponse {
                recommendations: vec!["nope".to_string()],
            })),
        );
        assert!(view.guard().is_pending());
        assert_eq!(view.xml_command(), "");
    }
}
