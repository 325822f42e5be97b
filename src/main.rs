//! Chat completion invoker
//!
//! Sends a chat completion request to an OpenAI-compatible endpoint and
//! prints the JSON it returns. An identical warm-up request can be fired
//! beforehand without waiting for it.

mod core;
mod models;

use crate::core::client::ChatCompletionInvoker;
use crate::core::config::Config;
use crate::core::detached::spawn_detached;
use crate::core::invoker::{Invoke, InvokeError};
use crate::core::logging::init_logging;
use crate::core::retry::invoke_with_retry;
use crate::models::openai::{ChatCompletionRequest, CompletionBody};
use std::sync::Arc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // Check for --help flag
    if std::env::args().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return;
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level);

    let invoker: Arc<dyn Invoke> = match ChatCompletionInvoker::from_config(&config) {
        Ok(invoker) => Arc::new(invoker),
        Err(e) => {
            error!("Failed to create client: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Sending {} to {} (max_tokens: {})",
        config.model,
        invoker.endpoint(),
        config.max_tokens
    );

    if config.warm_up {
        spawn_detached(invoker.clone(), config.payload());
    }

    match run(invoker.as_ref(), &config.payload(), config.max_retries).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{}", pretty),
            Err(e) => {
                error!("Failed to format response: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            match e.status() {
                Some(status) => error!("Request failed with status {}: {}", status, e),
                None => error!("Request failed: {}", e),
            }
            std::process::exit(1);
        }
    }
}

/// Awaited call: send, parse the body as JSON and log it
async fn run(
    invoker: &dyn Invoke,
    payload: &ChatCompletionRequest,
    max_retries: u32,
) -> Result<serde_json::Value, InvokeError> {
    let response = invoke_with_retry(invoker, payload, max_retries).await?;
    debug!(
        "[{}] status {}, content type {}",
        response.request_id,
        response.status,
        response.content_type.as_deref().unwrap_or("none")
    );

    let value = response.json()?;
    info!("Response: {}", value);

    if let Some(content) = CompletionBody::from_value(value.clone()).first_content() {
        info!("Reply: {}", content);
    }

    Ok(value)
}

/// Print help message
fn print_help() {
    println!("Chat Completion Invoker v0.1.0");
    println!();
    println!("Usage: chat-invoker [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -h, --help    Display this help message");
    println!();
    println!("Environment variables:");
    println!("  CONFIG_PATH - Path to the TOML configuration (default: config.toml)");
    println!("  OPENAI_API_KEY - Bearer token, overrides api.api_key");
    println!("  OPENAI_BASE_URL - API base URL, overrides api.base_url");
    println!("  RUST_LOG - Log filter, overrides logging.level");
    println!();
    println!("A .env file in the working directory is loaded if present.");
    println!();
    println!("Configuration (all optional except the API key):");
    println!("  [api] base_url, api_key, timeout_secs (default: 60)");
    println!("  [request] model (default: gpt-4o-mini), max_tokens (default: 5),");
    println!("            warm_up (default: true), max_retries (default: 0),");
    println!("            [[request.messages]] role/content (default: user \"Hello\")");
    println!("  [logging] level (default: info)");
}
