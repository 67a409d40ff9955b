//! stockchat CLI: terminal chat client for the stock data query service

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stockchat_engine::{
    init_file_logging, upload_csv, Config, Dispatcher, HttpQueryClient, ERROR_MESSAGE,
};

/// Ask natural-language questions about stock data
#[derive(Parser)]
#[command(name = "stockchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Backend base URL (overrides config and environment)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Backend port (applied after the URL is resolved)
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat TUI (default when no command specified)
    Tui,

    /// Ask a single question and print the answer
    Ask {
        /// The question to send
        query: String,

        /// Print the conversation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload a CSV file of daily stock data
    Upload {
        /// Path to the CSV file
        path: PathBuf,
    },

    /// Print the resolved configuration
    Config,
}

const DEFAULT_CONFIG_PATH: &str = ".stockchat/config.json";

fn main() {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        None | Some(Commands::Tui) => {
            start_logging(&config);
            run_async(stockchat_tui::run_tui(&config));
        }
        Some(Commands::Ask { query, json }) => {
            start_logging(&config);
            run_async(cmd_ask(&config, &query, json));
        }
        Some(Commands::Upload { path }) => {
            start_logging(&config);
            run_async(cmd_upload(&config, &path));
        }
        Some(Commands::Config) => {
            cmd_config(&config);
        }
    }
}

/// Load the config file, then apply the command-line overrides.
fn resolve_config(cli: &Cli) -> Result<Config, stockchat_engine::ConfigError> {
    let mut config = Config::resolve(&cli.config)?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url.clone());
    }
    if let Some(port) = cli.port {
        config = config.with_port(port)?;
    }
    // Surface a malformed URL before any command runs
    config.base_url()?;
    Ok(config)
}

fn start_logging(config: &Config) {
    if let Err(e) = init_file_logging(&config.log_file, &config.log_level) {
        eprintln!("Warning: logging disabled: {e}");
    }
}

fn run_async<F>(future: F)
where
    F: std::future::Future<Output = Result<(), Box<dyn std::error::Error>>>,
{
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(future) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn cmd_ask(
    config: &Config,
    query: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = HttpQueryClient::from_config(config)?;
    let mut dispatcher = Dispatcher::new();

    if !dispatcher.submit(&client, query).await {
        return Err("query is empty".into());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(dispatcher.conversation())?);
    } else if let Some(reply) = dispatcher.conversation().last() {
        println!("{}", reply.content);
    }

    let failed = dispatcher
        .conversation()
        .last()
        .is_some_and(|m| !m.is_user && m.content == ERROR_MESSAGE);
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_upload(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = config.upload_endpoint()?;
    println!("Uploading {} to {endpoint}", path.display());

    let report = upload_csv(&endpoint, path).await?;
    println!("Status: {}", report.status);
    println!("{}", report.message);
    Ok(())
}

fn cmd_config(config: &Config) {
    match serde_json::to_string_pretty(config) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_tui() {
        let cli = Cli::try_parse_from(["stockchat"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_ask_with_global_flags() {
        let cli = Cli::try_parse_from([
            "stockchat",
            "ask",
            "What was AAPL's close?",
            "--json",
            "--port",
            "6000",
        ])
        .unwrap();

        assert_eq!(cli.port, Some(6000));
        match cli.command {
            Some(Commands::Ask { query, json }) => {
                assert_eq!(query, "What was AAPL's close?");
                assert!(json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_resolve_config_applies_overrides() {
        let dir = std::env::temp_dir().join("stockchat-cli-missing-config");
        let cli = Cli::try_parse_from([
            "stockchat",
            "--config",
            dir.join("config.json").to_str().unwrap(),
            "--api-url",
            "http://example.com:5001",
            "--port",
            "8080",
            "config",
        ])
        .unwrap();

        let config = resolve_config(&cli).unwrap();
        assert_eq!(
            config.query_endpoint().unwrap().as_str(),
            "http://example.com:8080/api/query"
        );
    }

    #[test]
    fn test_resolve_config_rejects_bad_url() {
        let cli = Cli::try_parse_from(["stockchat", "--api-url", "not a url", "config"]).unwrap();
        assert!(resolve_config(&cli).is_err());
    }
}
