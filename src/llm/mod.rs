pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    OpenAI,
    Ollama,
    Groq,
    XAI,
    DeepSeek,
}

impl LlmType {
    /// Default chat endpoint for providers speaking the OpenAI wire format.
    pub fn default_chat_url(&self) -> Option<&'static str> {
        match self {
            LlmType::OpenAI => Some("https://api.openai.com/v1/chat/completions"),
            LlmType::Groq => Some("https://api.groq.com/openai/v1/chat/completions"),
            LlmType::XAI => Some("https://api.x.ai/v1/chat/completions"),
            LlmType::DeepSeek => Some("https://api.deepseek.com/chat/completions"),
            LlmType::Ollama => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmType::OpenAI => "gpt-3.5-turbo",
            LlmType::Ollama => "llama3",
            LlmType::Groq => "llama-3.1-8b-instant",
            LlmType::XAI => "grok-2-latest",
            LlmType::DeepSeek => "deepseek-chat",
        }
    }
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmType::OpenAI => "openai",
            LlmType::Ollama => "ollama",
            LlmType::Groq => "groq",
            LlmType::XAI => "xai",
            LlmType::DeepSeek => "deepseek",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseLlmTypeError {
    message: String,
}

impl fmt::Display for ParseLlmTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseLlmTypeError {}
impl FromStr for LlmType {
    type Err = ParseLlmTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmType::OpenAI),
            "ollama" => Ok(LlmType::Ollama),
            "groq" => Ok(LlmType::Groq),
            "xai" => Ok(LlmType::XAI),
            "deepseek" => Ok(LlmType::DeepSeek),
            _ =>
                Err(ParseLlmTypeError {
                    message: format!("Invalid LLM type: '{}'", s),
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_response_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::OpenAI,
            api_key: None,
            completion_model: None,
            base_url: None,
            temperature: 0.8,
            max_response_tokens: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names_case_insensitively() {
        assert_eq!("OpenAI".parse::<LlmType>().unwrap(), LlmType::OpenAI);
        assert_eq!(" ollama ".parse::<LlmType>().unwrap(), LlmType::Ollama);
        assert_eq!("xai".parse::<LlmType>().unwrap(), LlmType::XAI);
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = "palm".parse::<LlmType>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid LLM type: 'palm'");
    }

    #[test]
    fn only_ollama_lacks_openai_compatible_endpoint() {
        assert!(LlmType::Ollama.default_chat_url().is_none());
        assert!(LlmType::Groq.default_chat_url().unwrap().ends_with("/chat/completions"));
    }
}
