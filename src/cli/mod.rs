use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the relay server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Reply sent back when a request arrives with an empty message.
    #[arg(long, env = "EMPTY_MESSAGE_REPLY", default_value = "Please type something")]
    pub empty_message_reply: String,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (openai, ollama, groq, xai, deepseek)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openai")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gpt-3.5-turbo, gpt-4o, llama3)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// System message placed at the head of every prompt. Uses a built-in persona when unset.
    #[arg(long, env = "SYSTEM_MESSAGE")]
    pub system_message: Option<String>,

    /// Context window of the completion model, in tokens.
    #[arg(long, env = "MAX_MODEL_TOKENS", default_value = "4096")]
    pub max_model_tokens: usize,

    /// Tokens reserved for the model's reply.
    #[arg(long, env = "MAX_RESPONSE_TOKENS", default_value = "1000")]
    pub max_response_tokens: usize,

    /// Sampling temperature passed to the provider.
    #[arg(long, env = "TEMPERATURE", default_value = "0.8")]
    pub temperature: f32,

    // --- History Store Args ---
    /// Message store type (redis, memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "redis")]
    pub history_type: String,

    /// Message store connection URL (e.g., redis://localhost:6379)
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub redis_url: String,

    /// Namespace prepended to every message key.
    #[arg(long, env = "HISTORY_NAMESPACE", default_value = "chatgpt-demo")]
    pub history_namespace: String,

    /// Time-to-live (TTL) in seconds for stored messages. 0 means no TTL.
    #[arg(long, env = "HISTORY_TTL", default_value = "0")]
    pub history_ttl: u64,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

/// Arguments for the terminal chat front end.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal chat front end for chat-relay", long_about = None)]
pub struct ClientArgs {
    /// Base URL of the relay server.
    #[arg(long, env = "RELAY_URL", default_value = "http://127.0.0.1:3000")]
    pub relay_url: String,

    /// File holding the durable client cache (transcript and conversation ids).
    #[arg(long, env = "CLIENT_STORAGE_PATH", default_value = ".chat-relay/storage.json")]
    pub storage_path: String,

    /// Request timeout in seconds. 0 means wait indefinitely.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "0")]
    pub request_timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults_match_documented_values() {
        let args = Args::try_parse_from(["chat-relay"]).unwrap();
        assert_eq!(args.server_addr, "127.0.0.1:3000");
        assert_eq!(args.history_type, "redis");
        assert_eq!(args.history_namespace, "chatgpt-demo");
        assert_eq!(args.max_model_tokens, 4096);
        assert_eq!(args.history_ttl, 0);
        assert!(!args.enable_tls);
    }

    #[test]
    fn client_flags_override_defaults() {
        let args = ClientArgs::try_parse_from([
            "chat",
            "--relay-url",
            "http://relay.local:8080",
            "--request-timeout-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(args.relay_url, "http://relay.local:8080");
        assert_eq!(args.request_timeout_secs, 30);
    }
}
