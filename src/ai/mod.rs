pub mod error;
pub mod llm;
pub mod prompt;
pub mod transport;

pub use error::DispatchError;
pub use llm::{LlmClient, FALLBACK_REPLY};
pub use prompt::{ChatMessage, Intent, ModelParams, PromptRequest, Role};
pub use transport::{ChatTransport, CompletionRequest, CompletionResponse, HttpTransport};
