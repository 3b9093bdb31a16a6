use crossterm::event::{KeyCode, KeyEvent};
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::Frame;

use super::{
    error_paragraph, output_title, split_form_output, stack_fields, text_paragraph, Field,
    RequestGuard, Ticket, View,
};
use crate::protocol::{ApiRequest, ApiResponse, ConfigRequest, ConfigResponse};
use crate::transport::TransportError;

pub const GENERATION_FAILED: &str = "Configuration could not be generated.";

const INTERFACE: usize = 0;
const IP_ADDRESS: usize = 1;
const SUBNET_MASK: usize = 2;

pub struct ConfigGeneratorView {
    fields: [Field; 3],
    focus: usize,
    configuration: String,
    error: Option<&'static str>,
    guard: RequestGuard,
}

impl Default for ConfigGeneratorView {
    fn default() -> Self {
        Self {
            fields: [
                Field::new("Interface"),
                Field::new("IP Address"),
                Field::new("Subnet Mask"),
            ],
            focus: INTERFACE,
            configuration: String::new(),
            error: None,
            guard: RequestGuard::default(),
        }
    }
}

impl ConfigGeneratorView {
    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub const fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub fn request(&self) -> ConfigRequest {
        ConfigRequest {
            interface: self.fields[INTERFACE].value().to_string(),
            ip_address: self.fields[IP_ADDRESS].value().to_string(),
            subnet_mask: self.fields[SUBNET_MASK].value().to_string(),
        }
    }

    pub fn apply_configuration(
        &mut self,
        ticket: Ticket,
        result: Result<ConfigResponse, TransportError>,
    ) {
        if !self.guard.settle(ticket) {
            return;
        }
        match result {
            Ok(response) => {
                self.configuration = response.configuration;
                self.error = None;
            }
            Err(_) => {
                self.configuration.clear();
                self.error = Some(GENERATION_FAILED);
            }
        }
    }
}

impl View for ConfigGeneratorView {
    fn handle_key(&mut self, key: KeyEvent) {
        let count = self.fields.len();
        match key.code {
            KeyCode::Tab => self.focus = (self.focus + 1) % count,
            KeyCode::BackTab => self.focus = (self.focus + count - 1) % count,
            _ => self.fields[self.focus].handle_key(key),
        }
    }

    fn submit(&mut self) -> (Ticket, ApiRequest) {
        (self.guard.issue(), ApiRequest::GenerateConfig(self.request()))
    }

    fn apply(&mut self, ticket: Ticket, response: ApiResponse) {
        match response {
            ApiResponse::ConfigGenerated(result) => self.apply_configuration(ticket, result),
            other => tracing::debug!(?other, "config generator ignored foreign response"),
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
        let chunks = stack_fields(form, self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            field.render(f, chunks[i], i == self.focus);
        }

        let title = output_title("Configuration", self.guard.progress());
        if let Some(error) = self.error {
            f.render_widget(error_paragraph(error, title), output);
        } else {
            f.render_widget(text_paragraph(self.configuration.clone(), title), output);
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::{ConfigGeneratorView, GENERATION_FAILED};
    use crate::protocol::{ApiResponse, ConfigResponse};
    use crate::transport::TransportError;
    use crate::views::tests::{key, type_text};
    use crate::views::View;

    #[test]
    fn tab_walks_the_fields() {
        let mut view = ConfigGeneratorView::default();
        type_text(&mut view, "Ethernet1");
        key(&mut view, KeyCode::Tab);
        type_text(&mut view, "10.0.0.1");
        key(&mut view, KeyCode::Tab);
        type_text(&mut view, "255.255.255.0");
        key(&mut view, KeyCode::Tab);
        type_text(&mut view, "/1");

        let request = view.request();
        assert_eq!(request.interface, "Ethernet1/1");
        assert_eq!(request.ip_address, "10.0.0.1");
        assert_eq!(request.subnet_mask, "255.255.255.0");
    }

    #[test]
    fn backtab_wraps_to_last_field() {
        let mut view = ConfigGeneratorView::default();
        key(&mut view, KeyCode::BackTab);
        type_text(&mut view, "/24");
        assert_eq!(view.request().subnet_mask, "/24");
    }

    #[test]
    fn result_and_failure() {
        let mut view = ConfigGeneratorView::default();
        let (ticket, _) = view.submit();
        view.apply(
            ticket,
            ApiResponse::ConfigGenerated(Ok(ConfigResponse {
                configuration: "interface Ethernet1\n ip address 10.0.0.1/24".to_string(),
            })),
        );
        assert!(view.configuration().starts_with("interface Ethernet1"));

        let (ticket, _) = view.submit();
        view.apply(
            ticket,
            ApiResponse::ConfigGenerated(Err(TransportError::InvalidUrl {
                url: String::new(),
                reason: "unreachable".to_string(),
            })),
        );
        assert_eq!(view.configuration(), "");
        assert_eq!(view.error(), Some(GENERATION_FAILED));
    }
}
