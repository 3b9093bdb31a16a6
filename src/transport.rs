use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::protocol::{
    ApiRequest, ApiResponse, ClassificationRequest, ClassificationResponse, ConfigRequest,
    ConfigResponse, TranslationRequest, TranslationResponse, XmlRequest, XmlResponse,
    CLASSIFY_ERROR_PATH, FORMAT_XML_PATH, GENERATE_CONFIG_PATH, TRANSLATE_COMMAND_PATH,
};

/// Every way a backend call can fail. Views collapse all of these into one
/// message; the variants only exist so the cause can be logged.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid backend url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("could not build the http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {path} failed: {source}")]
    Network {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} answered with status {status}")]
    Status {
        path: &'static str,
        status: StatusCode,
    },
    #[error("could not decode the response of {path}: {source}")]
    Decode {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url).map_err(|err| TransportError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a base url".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = ClientBuilder::new()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an endpoint path against the base url, keeping any path prefix
    /// the base url carries (`http://host/api` + `/classify_error`).
    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }

    /// POSTs `body` as JSON to `path` and decodes the JSON answer.
    pub async fn post_json<B, R>(&self, path: &'static str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        tracing::debug!(%url, "sending backend request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| TransportError::Network { path, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { path, status });
        }

        response
            .json::<R>()
            .await
            .map_err(|source| TransportError::Decode { path, source })
    }

    pub async fn classify_error(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResponse, TransportError> {
        self.post_json(CLASSIFY_ERROR_PATH, request).await
    }

    pub async fn translate_command(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResponse, TransportError> {
        self.post_json(TRANSLATE_COMMAND_PATH, request).await
    }

    pub async fn generate_config(
        &self,
        request: &ConfigRequest,
    ) -> Result<ConfigResponse, TransportError> {
        self.post_json(GENERATE_CONFIG_PATH, request).await
    }

    pub async fn format_xml(&self, request: &XmlRequest) -> Result<XmlResponse, TransportError> {
        self.post_json(FORMAT_XML_PATH, request).await
    }

    /// Sends whichever request a view produced and wraps the answer so it can
    /// travel back to that view.
    pub async fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        let response = match request {
            ApiRequest::Classify(request) => {
                ApiResponse::Classified(self.classify_error(&request).await)
            }
            ApiRequest::Translate(request) => {
                ApiResponse::Translated(self.translate_command(&request).await)
            }
            ApiRequest::GenerateConfig(request) => {
                ApiResponse::ConfigGenerated(self.generate_config(&request).await)
            }
            ApiRequest::FormatXml(request) => {
                ApiResponse::XmlFormatted(self.format_xml(&request).await)
            }
        };
        if let Some(err) = response.error() {
            tracing::warn!(%err, "backend request failed");
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ApiClient, TransportError};

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = ApiClient::new("http://127.0.0.1:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint("/classify_error"),
            "http://127.0.0.1:5000/api/classify_error"
        );
    }

    #[test]
    fn endpoint_on_bare_host() {
        let client = ApiClient::new("http://127.0.0.1:5000", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint("/format_xml"),
            "http://127.0.0.1:5000/format_xml"
        );
    }

    #[test]
    fn rejects_unparsable_base_url() {
        let result = ApiClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }

    #[test]
    fn rejects_non_base_url() {
        let result = ApiClient::new("mailto:noc@example.com", Duration::from_secs(1));
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }
}
