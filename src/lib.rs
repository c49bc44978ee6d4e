pub mod agent;
pub mod cli;
pub mod client;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod relay;
pub mod server;

use agent::ChatAgentFactory;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Chat API Key Set: {}", !args.chat_api_key.is_empty());
    info!("History Store Type: {}", args.history_type);
    info!("History Namespace: {}", args.history_namespace);
    info!("Max Model Tokens: {}", args.max_model_tokens);
    info!("Max Response Tokens: {}", args.max_response_tokens);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let factory = Arc::new(ChatAgentFactory::from_args(&args)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, factory, args);
    server.run().await?;

    Ok(())
}
