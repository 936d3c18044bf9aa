//! Toolhub command-line entry point.
//!
//! Serves the builtin catalog over stdin/stdout, or runs one-shot catalog
//! queries. Only the core's discovery tools have handlers here; tool servers
//! embed the library and register their own.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use toolhub_core::protocol::methods;
use toolhub_core::server::LineServer;
use toolhub_core::{Config, Dispatcher, Environment, RequestEnvelope, ToolRegistry};

#[derive(Debug, Parser)]
#[command(name = "toolhub", version, about = "Tool routing and validation core")]
struct Cli {
    /// JSON configuration file. Environment overrides still apply.
    #[arg(long, global = true, env = "TOOLHUB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve JSON-RPC envelopes, one per line, on stdin/stdout.
    Serve,
    /// List exported tool definitions.
    List {
        /// Include deferred tools.
        #[arg(long)]
        all: bool,
    },
    /// Keyword search over the catalog.
    Search {
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Resolve a raw tool name or alias.
    Resolve { name: String },
    /// Call a tool once.
    Call {
        name: String,
        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Print the configuration JSON schema.
    ConfigSchema,
}

fn load_config(path: Option<&PathBuf>) -> toolhub_core::Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    toolhub_core::observability::init_tracing_with(&config.observability);

    if let Command::ConfigSchema = cli.command {
        return print_json(&Config::json_schema());
    }

    let registry = Arc::new(ToolRegistry::builtin()?);
    let mut builder = Dispatcher::builder(registry, &config)?;
    builder
        .with_environment(Environment::detect())
        .register_discovery_handlers()?;
    let dispatcher = Arc::new(builder.build());

    let request = match cli.command {
        Command::Serve => {
            let server = LineServer::new(dispatcher);
            let cancel = server.cancel_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            server.serve(stdin, tokio::io::stdout()).await?;
            return Ok(());
        }
        Command::ConfigSchema => return Ok(()),
        Command::List { all } => {
            RequestEnvelope::new(1, methods::TOOLS_LIST, Some(json!({ "all": all })))
        }
        Command::Search {
            query,
            category,
            limit,
        } => RequestEnvelope::new(
            1,
            methods::TOOLS_SEARCH,
            Some(json!({ "query": query, "category": category, "limit": limit })),
        ),
        Command::Resolve { name } => {
            RequestEnvelope::tool_call(1, "resolve_tool_name", json!({ "name": name }))
        }
        Command::Call { name, args } => {
            let arguments: Value = serde_json::from_str(&args)?;
            RequestEnvelope::tool_call(1, &name, arguments)
        }
    };

    let response = dispatcher.handle_request(request).await;
    print_json(&serde_json::to_value(&response)?)?;
    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
