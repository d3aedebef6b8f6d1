//! Lectern: ingest lecture material, extract its text and ask a hosted
//! chat-completion model to summarize, translate, answer questions about it
//! or rank it against a query.

pub mod ai;
pub mod cli;
pub mod config;
pub mod core;
pub mod file;
pub mod health;

pub use crate::ai::{DispatchError, LlmClient};
pub use crate::config::Settings;
pub use crate::core::{Resource, Session, SessionError, SourceKind};
pub use crate::file::{FileFormat, FileProcessor, ResourceStore};
