use crate::cli::Args;
use crate::error::RelayError;
use crate::history::{ MessageStore, StoreBackend };
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::llm::{ LlmConfig, LlmType };
use crate::models::chat::{ CompletionReply, Continuation };
use crate::models::message::{ PromptMessage, Role, StoredMessage };

use async_trait::async_trait;
use chrono::Utc;
use log::{ debug, info, warn };
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_SYSTEM_MESSAGE: &str =
    "You are a helpful assistant. Answer as concisely as possible.";

/// Fixed per-message overhead added to the character estimate.
const TOKENS_PER_MESSAGE: usize = 4;

/// The conversational-completion collaborator seen by the relay.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn send_message(
        &self,
        text: &str,
        continuation: Option<Continuation>
    ) -> Result<CompletionReply, RelayError>;
}

/// Builds a fresh completion service for every relay call.
#[async_trait]
pub trait CompletionServiceFactory: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn CompletionService>, RelayError>;
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub system_message: String,
    pub max_model_tokens: usize,
    pub max_response_tokens: usize,
}

impl AgentConfig {
    /// Tokens available for the system message, history and the new message.
    pub fn prompt_budget(&self) -> usize {
        self.max_model_tokens.saturating_sub(self.max_response_tokens)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            max_model_tokens: 4096,
            max_response_tokens: 1000,
        }
    }
}

/// Rough token count: a quarter of the characters plus a fixed overhead.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4) + TOKENS_PER_MESSAGE
}

/// Threads messages into conversations on top of a chat client and a
/// message store.
#[derive(Clone)]
pub struct ChatAgent {
    chat_client: Arc<dyn ChatClient>,
    message_store: Arc<dyn MessageStore>,
    config: AgentConfig,
}

impl ChatAgent {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        message_store: Arc<dyn MessageStore>,
        config: AgentConfig
    ) -> Self {
        Self { chat_client, message_store, config }
    }

    /// System message, the ancestors of `parent_id` that fit the budget
    /// (oldest first), then `text`.
    async fn build_prompt(
        &self,
        text: &str,
        parent_id: Option<&str>
    ) -> Result<Vec<PromptMessage>, RelayError> {
        let system = PromptMessage::new(Role::System, self.config.system_message.clone());
        let user = PromptMessage::new(Role::User, text);
        let mut used = estimate_tokens(&system.content) + estimate_tokens(&user.content);
        let budget = self.config.prompt_budget();

        let mut history = Vec::new();
        let mut next_id = parent_id.map(str::to_string);
        while let Some(id) = next_id {
            let stored = self.message_store
                .get(&id).await
                .map_err(|e| RelayError::Store(e.to_string()))?;
            let Some(stored) = stored else {
                debug!("Message chain ends at missing message {}", id);
                break;
            };
            let cost = estimate_tokens(&stored.text);
            if used + cost > budget {
                debug!("Prompt budget of {} tokens reached, truncating history", budget);
                break;
            }
            used += cost;
            next_id = stored.parent_message_id.clone();
            history.push(PromptMessage::from(&stored));
        }
        history.reverse();

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(system);
        messages.extend(history);
        messages.push(user);
        Ok(messages)
    }
}

#[async_trait]
impl CompletionService for ChatAgent {
    async fn send_message(
        &self,
        text: &str,
        continuation: Option<Continuation>
    ) -> Result<CompletionReply, RelayError> {
        let (conversation_id, parent_id) = match continuation {
            Some(c) => (c.conversation_id, Some(c.parent_message_id)),
            None => (Uuid::new_v4().to_string(), None),
        };

        let messages = self.build_prompt(text, parent_id.as_deref()).await?;
        debug!(
            "Sending {} messages to {} for conversation {}",
            messages.len(),
            self.chat_client.get_model(),
            conversation_id
        );
        let completion = self.chat_client
            .complete(&messages).await
            .map_err(|e| RelayError::Completion(e.to_string()))?;

        let reply_text = completion.response.trim().to_string();
        if reply_text.is_empty() {
            return Err(RelayError::Completion("provider returned an empty reply".into()));
        }

        let now = Utc::now().timestamp();
        let user_message = StoredMessage {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            text: text.to_string(),
            conversation_id: conversation_id.clone(),
            parent_message_id: parent_id,
            timestamp: now,
        };
        let assistant_message = StoredMessage {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            text: reply_text.clone(),
            conversation_id: conversation_id.clone(),
            parent_message_id: Some(user_message.id.clone()),
            timestamp: now,
        };
        for msg in [&user_message, &assistant_message] {
            self.message_store
                .put(msg).await
                .map_err(|e| RelayError::Store(e.to_string()))?;
        }

        Ok(CompletionReply {
            text: reply_text,
            id: assistant_message.id,
            conversation_id,
        })
    }
}

/// Opens a store connection and a provider client on every `connect`.
pub struct ChatAgentFactory {
    backend: StoreBackend,
    llm_config: LlmConfig,
    agent_config: AgentConfig,
}

impl ChatAgentFactory {
    pub fn new(backend: StoreBackend, llm_config: LlmConfig, agent_config: AgentConfig) -> Self {
        Self { backend, llm_config, agent_config }
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let backend = crate::history::initialize_store_backend(args)?;
        let llm_type = args.chat_llm_type
            .parse::<LlmType>()
            .map_err(|e| format!("Invalid chat LLM type: {}", e))?;
        let api_key = Some(args.chat_api_key.clone()).filter(|k| !k.is_empty());
        let llm_config = LlmConfig {
            llm_type,
            api_key,
            completion_model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
            temperature: args.temperature,
            max_response_tokens: u32::try_from(args.max_response_tokens).ok(),
        };
        if args.max_response_tokens >= args.max_model_tokens {
            warn!(
                "MAX_RESPONSE_TOKENS ({}) leaves no room for the prompt within MAX_MODEL_TOKENS ({})",
                args.max_response_tokens,
                args.max_model_tokens
            );
        }
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}",
            llm_config.llm_type,
            llm_config.completion_model.as_deref().unwrap_or("adapter default"),
            llm_config.base_url.as_deref().unwrap_or("adapter default")
        );
        let agent_config = AgentConfig {
            system_message: args.system_message
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string()),
            max_model_tokens: args.max_model_tokens,
            max_response_tokens: args.max_response_tokens,
        };
        Ok(Self::new(backend, llm_config, agent_config))
    }
}

#[async_trait]
impl CompletionServiceFactory for ChatAgentFactory {
    async fn connect(&self) -> Result<Arc<dyn CompletionService>, RelayError> {
        let store = self.backend
            .open().await
            .map_err(|e| RelayError::Store(e.to_string()))?;
        let client = new_chat_client(&self.llm_config)
            .map_err(|e| RelayError::Configuration(e.to_string()))?;
        debug!(
            "Chat client {} at {}",
            client.get_model(),
            client.get_base_url().unwrap_or_else(|| "provider default".to_string())
        );
        Ok(Arc::new(ChatAgent::new(client, store, self.agent_config.clone())))
    }
}
