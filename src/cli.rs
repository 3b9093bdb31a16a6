use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lazy_static::lazy_static;
use regex::Regex;

use crate::config::{Config, Overrides};
use crate::error::Error;
use crate::logging;
use crate::protocol::{
    ApiRequest, ApiResponse, ClassificationRequest, ConfigRequest, NetworkSystem,
    TranslationRequest, XmlRequest,
};
use crate::shell::{Shell, Tool};
use crate::transport::{ApiClient, TransportError};
use crate::ui::NetassistUI;
use crate::views::classifier::FETCH_FAILED;
use crate::views::config_generator::GENERATION_FAILED;
use crate::views::translator::TRANSLATION_NOT_FOUND;
use crate::views::xml_formatter::FORMATTING_FAILED;

#[derive(Parser, Clone)]
#[command(name = "netassist", author, version, about, long_about = None)]
pub struct NetassistArgs {
    /// YAML configuration file (defaults to ./netassist.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base url of the backend
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<NetassistCommand>,
}

impl NetassistArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            timeout_secs: self.timeout_secs,
            log_file: self.log_file.clone(),
        }
    }
}

#[derive(Subcommand, Clone)]
pub enum NetassistCommand {
    /// Interactive shell with every tool (the default)
    Tui(TuiArgs),
    /// Ask the backend for troubleshooting steps for an error message
    Classify(ClassifyArgs),
    /// Translate a CLI command between network vendors
    Translate(TranslateArgs),
    /// Generate an interface configuration
    GenerateConfig(GenerateConfigArgs),
    /// Convert a command to its XML form
    FormatXml(FormatXmlArgs),
}

#[derive(clap::Args, Clone, Default)]
pub struct TuiArgs {
    /// Tool shown first (defaults to the configured one, else the classifier)
    #[arg(long, value_enum)]
    tool: Option<Tool>,
}

#[derive(clap::Args, Clone)]
pub struct OutputArgs {
    /// Print only the contents of fenced code blocks, if the answer has any
    #[arg(long)]
    code_only: bool,

    /// Write the result to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Clone)]
pub struct ClassifyArgs {
    error_message: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args, Clone)]
pub struct TranslateArgs {
    #[arg(long = "from", value_enum)]
    source_system: Option<NetworkSystem>,

    #[arg(long = "to", value_enum)]
    target_system: Option<NetworkSystem>,

    source_command: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args, Clone)]
pub struct GenerateConfigArgs {
    #[arg(long)]
    interface: String,

    #[arg(long)]
    ip_address: String,

    #[arg(long)]
    subnet_mask: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args, Clone)]
pub struct FormatXmlArgs {
    command: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[allow(clippy::missing_errors_doc)]
pub async fn run() -> Result<(), Error> {
    let args = NetassistArgs::parse();
    let config = Config::load(args.config.as_deref(), args.overrides())?;
    let client = ApiClient::new(&config.api_url, config.timeout)?;

    let command = args
        .command
        .unwrap_or_else(|| NetassistCommand::Tui(TuiArgs::default()));
    match command {
        NetassistCommand::Tui(tui_args) => {
            if let Some(log_file) = &config.log_file {
                logging::init_file(log_file)?;
            }
            let tool = tui_args.tool.unwrap_or(config.default_tool);
            tracing::info!(api_url = %client.base_url(), ?tool, "starting interactive shell");
            let shell = Shell::new(
                tool,
                config.default_source_system,
                config.default_target_system,
            );
            let mut ui = NetassistUI::new(shell, client)?;
            ui.run().await?;
        }
        NetassistCommand::Classify(classify_args) => {
            init_one_shot_logging(&config)?;
            let request = ApiRequest::Classify(ClassificationRequest {
                error_message: classify_args.error_message,
            });
            one_shot(&client, request, &classify_args.output).await?;
        }
        NetassistCommand::Translate(translate_args) => {
            init_one_shot_logging(&config)?;
            let request = ApiRequest::Translate(TranslationRequest {
                source_system: translate_args
                    .source_system
                    .unwrap_or(config.default_source_system),
                target_system: translate_args
                    .target_system
                    .unwrap_or(config.default_target_system),
                source_command: translate_args.source_command,
            });
            one_shot(&client, request, &translate_args.output).await?;
        }
        NetassistCommand::GenerateConfig(config_args) => {
            init_one_shot_logging(&config)?;
            let request = ApiRequest::GenerateConfig(ConfigRequest {
                interface: config_args.interface,
                ip_address: config_args.ip_address,
                subnet_mask: config_args.subnet_mask,
            });
            one_shot(&client, request, &config_args.output).await?;
        }
        NetassistCommand::FormatXml(xml_args) => {
            init_one_shot_logging(&config)?;
            let request = ApiRequest::FormatXml(XmlRequest {
                command: xml_args.command,
            });
            one_shot(&client, request, &xml_args.output).await?;
        }
    }
    Ok(())
}

fn init_one_shot_logging(config: &Config) -> Result<(), Error> {
    match &config.log_file {
        Some(log_file) => logging::init_file(log_file),
        None => logging::init_stderr(),
    }
}

fn failed(message: &'static str) -> impl FnOnce(TransportError) -> Error {
    move |source| Error::Request { message, source }
}

/// Turns a backend answer into the text a one-shot command prints, or the
/// fixed message of the matching tool.
fn response_text(response: ApiResponse) -> Result<String, Error> {
    match response {
        ApiResponse::Classified(result) => result
            .map(|response| response.recommendations.join("\n"))
            .map_err(failed(FETCH_FAILED)),
        ApiResponse::Translated(result) => result
            .map(|response| response.translated_command)
            .map_err(failed(TRANSLATION_NOT_FOUND)),
        ApiResponse::ConfigGenerated(result) => result
            .map(|response| response.configuration)
            .map_err(failed(GENERATION_FAILED)),
        ApiResponse::XmlFormatted(result) => result
            .map(|response| response.xml_command)
            .map_err(failed(FORMATTING_FAILED)),
    }
}

async fn one_shot(
    client: &ApiClient,
    request: ApiRequest,
    output: &OutputArgs,
) -> Result<(), Error> {
    let text = response_text(client.dispatch(request).await)?;
    let text = if output.code_only {
        code_only(&text)
    } else {
        text
    };
    match &output.output {
        Some(file) => fs::write(file, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

/// The backend tends to wrap commands in markdown fences. Returns the fenced
/// contents, or the whole text when there are none.
fn code_only(text: &str) -> String {
    let code_blocks = extract_code_blocks(text);
    if code_blocks.is_empty() {
        text.to_string()
    } else {
        code_blocks.join("\n")
    }
}

fn extract_code_blocks(text: &str) -> Vec<String> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"(?s)```(?:\w+)?\n(.*?)\n```")
            .expect("The regex expression should be valid");
    }

    RE.captures_iter(text)
        .filter_map(|capture| capture.get(1))
        .map(|code_block| code_block.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use axum::http::StatusCode as HttpStatus;
    use axum::routing::post;
    use axum::{Json, Router};
    use clap::Parser;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::{
        code_only, extract_code_blocks, one_shot, response_text, NetassistArgs, NetassistCommand,
        OutputArgs,
    };
    use crate::error::Error;
    use crate::protocol::{
        ApiRequest, ApiResponse, ClassificationRequest, ClassificationResponse, NetworkSystem,
        TranslationRequest,
    };
    use crate::shell::Tool;
    use crate::transport::{ApiClient, TransportError};
    use crate::views::classifier::FETCH_FAILED;
    use crate::views::translator::TRANSLATION_NOT_FOUND;

    async fn translate(Json(_): Json<Value>) -> Json<Value> {
        Json(json!({
            "translated_command": "Use this:\n```eos\nshow ip interface brief\n```\n",
        }))
    }

    async fn classify(Json(_): Json<Value>) -> (HttpStatus, Json<Value>) {
        (
            HttpStatus::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to process API response"})),
        )
    }

    async fn backend() -> ApiClient {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let app = Router::new()
            .route("/translate_command", post(translate))
            .route("/classify_error", post(classify));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        ApiClient::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap()
    }

    fn translation() -> ApiRequest {
        ApiRequest::Translate(TranslationRequest {
            source_system: NetworkSystem::Cisco,
            target_system: NetworkSystem::Arista,
            source_command: "show ip int brief".to_string(),
        })
    }

    #[test]
    fn code_blocks_regex() {
        let arista = "interface Ethernet1
   no switchport
   ip address 10.0.0.1/24";
        let untagged = "show ip interface brief";
        let text = format!(
            "
Here is the configuration:
```eos
{arista}
```

and to verify it:
```
{untagged}
```
That is all."
        );
        let blocks = extract_code_blocks(&text);
        assert_eq!(blocks, vec![arista.to_string(), untagged.to_string()]);
    }

    #[test]
    fn code_only_falls_back_to_whole_answer() {
        assert_eq!(code_only("show vlan brief"), "show vlan brief");
        assert_eq!(code_only("Try:\n```\nshow vlan\n```\n"), "show vlan");
    }

    #[test]
    fn recommendations_print_one_per_line() {
        let text = response_text(ApiResponse::Classified(Ok(ClassificationResponse {
            recommendations: vec!["Check interface".to_string(), "Restart service".to_string()],
        })))
        .unwrap();
        assert_eq!(text, "Check interface\nRestart service");
    }

    #[test]
    fn failure_carries_the_tool_message() {
        let err = response_text(ApiResponse::Translated(Err(TransportError::Status {
            path: "/translate_command",
            status: StatusCode::NOT_FOUND,
        })))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Request {
                message: TRANSLATION_NOT_FOUND,
                ..
            }
        ));
        assert!(err.to_string().starts_with(TRANSLATION_NOT_FOUND));
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let args = NetassistArgs::parse_from(["netassist", "--api-url", "http://noc:5000"]);
        assert!(args.command.is_none());
        assert_eq!(args.overrides().api_url.as_deref(), Some("http://noc:5000"));
    }

    #[test]
    fn parses_translate_and_tui() {
        let args = NetassistArgs::parse_from([
            "netassist",
            "translate",
            "--from",
            "arista",
            "--to",
            "cisco",
            "show interfaces status",
            "--code-only",
        ]);
        let Some(NetassistCommand::Translate(translate)) = args.command else {
            panic!("expected translate");
        };
        assert_eq!(translate.source_system, Some(NetworkSystem::Arista));
        assert_eq!(translate.target_system, Some(NetworkSystem::Cisco));
        assert_eq!(translate.source_command, "show interfaces status");
        assert!(translate.output.code_only);

        let args = NetassistArgs::parse_from(["netassist", "tui", "--tool", "xml-formatter"]);
        let Some(NetassistCommand::Tui(tui)) = args.command else {
            panic!("expected tui");
        };
        assert_eq!(tui.tool, Some(Tool::XmlFormatter));
    }

    #[tokio::test]
    async fn one_shot_writes_answer_to_output_file() {
        let client = backend().await;
        let dir = tempfile::tempdir().unwrap();

        let whole = dir.path().join("whole.txt");
        let output = OutputArgs {
            code_only: false,
            output: Some(whole.clone()),
        };
        one_shot(&client, translation(), &output).await.unwrap();
        assert_eq!(
            fs::read_to_string(&whole).unwrap(),
            "Use this:\n```eos\nshow ip interface brief\n```\n"
        );

        let code: PathBuf = dir.path().join("code.txt");
        let output = OutputArgs {
            code_only: true,
            output: Some(code.clone()),
        };
        one_shot(&client, translation(), &output).await.unwrap();
        assert_eq!(fs::read_to_string(&code).unwrap(), "show ip interface brief");
    }

    #[tokio::test]
    async fn one_shot_failure_is_the_tool_message() {
        let client = backend().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recommendations.txt");
        let output = OutputArgs {
            code_only: false,
            output: Some(path.clone()),
        };
        let request = ApiRequest::Classify(ClassificationRequest {
            error_message: "%BGP-5-ADJCHANGE: neighbor 10.0.0.2 Down".to_string(),
        });
        let err = one_shot(&client, request, &output).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Request {
                message: FETCH_FAILED,
                source: TransportError::Status { status, .. },
            } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(!path.exists());
    }
}
