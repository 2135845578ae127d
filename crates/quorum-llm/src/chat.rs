//! Chat completion payloads
//!
//! Every collaborator sends one system prompt and one user turn, so a
//! request is built from exactly that pair.

use serde::{Deserialize, Serialize};

/// Author of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions
    System,
    /// End-user text
    User,
}

/// One chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author
    pub role: Role,
    /// Text
    pub content: String,
}

impl Message {
    /// Instruction turn
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single-shot completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model override; `None` uses the provider default
    pub model: Option<String>,
    /// Conversation sent to the model
    pub messages: Vec<Message>,
    /// Completion token limit
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Request made of `system` instructions and one `user` turn
    #[must_use]
    pub fn prompt(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: None,
            messages: vec![Message::system(system), Message::user(user)],
            max_tokens: None,
            temperature: None,
        }
    }

    /// Request with a lone user turn and no instructions
    #[must_use]
    pub fn user_only(user: impl Into<String>) -> Self {
        Self {
            model: None,
            messages: vec![Message::user(user)],
            max_tokens: None,
            temperature: None,
        }
    }

    /// Use `model` instead of the provider default
    #[must_use]
    pub fn model(mut self, model: Option<String>) -> Self {
        self.model = model.filter(|m| !m.trim().is_empty());
        self
    }

    /// Set temperature and token limit together
    #[must_use]
    pub fn sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Text of the first turn with `role`
    #[must_use]
    pub fn turn(&self, role: Role) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt side
    pub prompt_tokens: u32,
    /// Completion side
    pub completion_tokens: u32,
    /// Sum of both
    pub total_tokens: u32,
}

/// Model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Reply text, possibly empty
    pub content: String,
    /// Model that produced it
    pub model: String,
    /// Token accounting, when reported
    pub usage: Option<TokenUsage>,
    /// Why generation stopped, when reported
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_pairs_system_and_user() {
        let request = CompletionRequest::prompt("classify", "Is it sunny?").sampling(Some(0.0), Some(16));

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.turn(Role::System), Some("classify"));
        assert_eq!(request.turn(Role::User), Some("Is it sunny?"));
        assert_eq!(request.max_tokens, Some(16));
        assert_eq!(request.temperature, Some(0.0));
        assert!(request.model.is_none());
    }

    #[test]
    fn test_blank_model_means_default() {
        let request = CompletionRequest::user_only("ok?").model(Some("  ".to_string()));
        assert!(request.model.is_none());
        assert!(request.turn(Role::System).is_none());

        let request = request.model(Some("gpt-4o".to_string()));
        assert_eq!(request.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }
}
