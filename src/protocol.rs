use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::transport::TransportError;

pub const CLASSIFY_ERROR_PATH: &str = "/classify_error";
pub const TRANSLATE_COMMAND_PATH: &str = "/translate_command";
pub const GENERATE_CONFIG_PATH: &str = "/generate_config";
pub const FORMAT_XML_PATH: &str = "/format_xml";

/// Network operating systems the translator knows about. Serialized with the
/// exact names the backend expects.
#[derive(Serialize, Deserialize, clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSystem {
    #[value(name = "cisco")]
    Cisco,
    #[value(name = "arista")]
    Arista,
}

impl NetworkSystem {
    pub const ALL: [Self; 2] = [Self::Cisco, Self::Arista];

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Cisco => Self::Arista,
            Self::Arista => Self::Cisco,
        }
    }

    #[must_use]
    pub fn previous(self) -> Self {
        // two systems, so stepping back is stepping forward
        self.next()
    }
}

impl Display for NetworkSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cisco => write!(f, "Cisco"),
            Self::Arista => write!(f, "Arista"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub error_message: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResponse {
    pub recommendations: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub source_system: NetworkSystem,
    pub target_system: NetworkSystem,
    pub source_command: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TranslationResponse {
    pub translated_command: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ConfigRequest {
    pub interface: String,
    pub ip_address: String,
    pub subnet_mask: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConfigResponse {
    pub configuration: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct XmlRequest {
    pub command: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct XmlResponse {
    pub xml_command: String,
}

/// A request for any of the backend tools, as produced by a view on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Classify(ClassificationRequest),
    Translate(TranslationRequest),
    GenerateConfig(ConfigRequest),
    FormatXml(XmlRequest),
}

#[derive(Debug)]
pub enum ApiResponse {
    Classified(Result<ClassificationResponse, TransportError>),
    Translated(Result<TranslationResponse, TransportError>),
    ConfigGenerated(Result<ConfigResponse, TransportError>),
    XmlFormatted(Result<XmlResponse, TransportError>),
}

impl ApiResponse {
    pub fn error(&self) -> Option<&TransportError> {
        match self {
            Self::Classified(result) => result.as_ref().err(),
            Self::Translated(result) => result.as_ref().err(),
            Self::ConfigGenerated(result) => result.as_ref().err(),
            Self::XmlFormatted(result) => result.as_ref().err(),
        }
    }
}
