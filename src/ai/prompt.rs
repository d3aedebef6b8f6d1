use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MODEL;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const SUMMARY_MAX_TOKENS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged message; also the unit of a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ModelParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Chat(Vec<ChatMessage>),
    Generate { prompt: String },
    Summarize { text: String },
    Translate { text: String, target_language: String },
    AnswerQuestion { context: String, question: String },
    FindRelevant { query: String, candidates: Vec<String> },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Chat(_) => "chat",
            Intent::Generate { .. } => "generate",
            Intent::Summarize { .. } => "summarize",
            Intent::Translate { .. } => "translate",
            Intent::AnswerQuestion { .. } => "answer_question",
            Intent::FindRelevant { .. } => "find_relevant",
        }
    }
}

/// An intent plus model settings. Rendering is pure; sending it yields exactly one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub intent: Intent,
    pub params: ModelParams,
}

impl PromptRequest {
    pub fn new(intent: Intent, params: ModelParams) -> Self {
        Self { intent, params }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        match &self.intent {
            Intent::Chat(messages) => messages.clone(),
            Intent::Generate { prompt } => vec![ChatMessage::user(prompt.clone())],
            Intent::Summarize { text } => vec![ChatMessage::user(summarize_prompt(text))],
            Intent::Translate { text, target_language } => {
                vec![ChatMessage::user(translate_prompt(text, target_language))]
            }
            Intent::AnswerQuestion { context, question } => {
                vec![ChatMessage::user(answer_prompt(context, question))]
            }
            Intent::FindRelevant { query, candidates } => {
                vec![ChatMessage::user(find_relevant_prompt(query, candidates))]
            }
        }
    }
}

pub fn summarize_prompt(text: &str) -> String {
    format!("Please summarize the following text:\n\n{}", text)
}

pub fn translate_prompt(text: &str, target_language: &str) -> String {
    format!("Translate the following text to {}:\n\n{}", target_language, text)
}

pub fn answer_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on the following context, please answer the question.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Answer:",
        context, question
    )
}

pub fn find_relevant_prompt(query: &str, candidates: &[String]) -> String {
    format!(
        "Given the following resources, identify which ones are most relevant to the query.\n\n\
         Resources:\n{}\n\n\
         Query: {}\n\n\
         Please list the most relevant resources (one per line):",
        candidates.join("\n"),
        query
    )
}

/// Splits a ranking reply into trimmed, non-blank lines. Lines are not checked against the candidates.
pub fn parse_ranked_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
