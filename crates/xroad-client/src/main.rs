//! `xroad` - command-line access to X-Road services.

use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use tracing::{error, info};

use xroad_client::{connect, ClientConfig, Protocol, SoapClient};
use xroad_core::resolve_wsdl_url;
use xroad_wsdl::SchemaPatcher;

#[derive(Parser)]
#[command(name = "xroad")]
#[command(version, about = "Call X-Road (Trembita) services through a Security Server", long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, env = "XROAD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved service-description URL
    WsdlUrl,
    /// Fetch and patch the service description, print the patched file path
    PatchWsdl,
    /// Print the input and output description of the configured service
    Describe,
    /// Call the configured service with key=value arguments and print the JSON reply
    Call {
        /// Arguments as key=value; values that parse as JSON keep their type
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            process::exit(1);
        }
    };

    if let Err(e) = xroad_telemetry::init_logging(&config.logging) {
        eprintln!("Failed to initialise logging: {e}");
    }

    if let Err(e) = run(cli.command, &config).await {
        error!(error = %e, "command failed");
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    Ok(config.with_env_overrides())
}

async fn run(command: Command, config: &ClientConfig) -> anyhow::Result<()> {
    config.validate()?;

    match command {
        Command::WsdlUrl => {
            let service = config.service_identity()?;
            println!("{}", resolve_wsdl_url(&config.security_server.url, &service)?);
        }
        Command::PatchWsdl => {
            let service = config.service_identity()?;
            let name = service
                .service_code()
                .ok_or_else(|| anyhow!("service path has no service code"))?
                .to_string();
            let url = resolve_wsdl_url(&config.security_server.url, &service)?;
            let http = reqwest::Client::builder()
                .timeout(config.security_server.timeout)
                .build()?;
            let path = SchemaPatcher::new(http).fetch_and_patch(&url, &name).await?;
            info!(path = %path.display(), "patched service description written");
            println!("{}", path.display());
        }
        Command::Describe => {
            if config.client.protocol != Protocol::Soap {
                bail!("describe needs a SOAP service");
            }
            let client = SoapClient::connect(config).await?;
            let description = json!({
                "operation": client.operation(),
                "input": client.describe_input()?,
                "output": client.describe_output()?,
            });
            println!("{}", serde_json::to_string_pretty(&description)?);
        }
        Command::Call { args } => {
            let client = connect(config).await?;
            let reply = client.request(parse_args(&args)?).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
    }

    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut map = Map::new();
    for arg in args {
        let (key, raw) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("argument {arg:?} is not key=value"))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(map)
}
