use anyhow::{anyhow, Result};
use std::path::PathBuf;

pub const DEFAULT_PURGE_HOURS: u64 = 24;

#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    Upload { path: PathBuf },
    Fetch { url: String },
    Video { url: String },
    Post { title: String, body: String },
    List,
    Delete { reference: String },
    Extract { reference: String },
    Summarize { reference: String },
    Translate { reference: String, language: Option<String> },
    Ask { question: String },
    Find { query: String },
    History,
    Purge { hours: u64 },
    Help,
    Exit,
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(line: &str) -> Result<Command> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        if verb.is_empty() {
            return Err(anyhow!("Empty command"));
        }

        let required = |what: &str| -> Result<String> {
            if rest.is_empty() {
                Err(anyhow!("Usage: {} <{}>", verb, what))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match verb.to_lowercase().as_str() {
            "upload" => Command::Upload { path: PathBuf::from(required("path")?) },
            "fetch" => Command::Fetch { url: required("url")? },
            "video" => Command::Video { url: required("url")? },
            "post" => {
                let (title, body) = rest
                    .split_once('|')
                    .map(|(t, b)| (t.trim(), b.trim()))
                    .filter(|(t, _)| !t.is_empty())
                    .ok_or_else(|| anyhow!("Usage: post <title> | <body>"))?;
                Command::Post { title: title.to_string(), body: body.to_string() }
            }
            "list" | "ls" => Command::List,
            "delete" | "rm" => Command::Delete { reference: required("ref")? },
            "extract" => Command::Extract { reference: required("ref")? },
            "summarize" => Command::Summarize { reference: required("ref")? },
            "translate" => {
                let args = required("ref")?;
                let (reference, language) = match args.split_once(char::is_whitespace) {
                    Some((reference, language)) => {
                        (reference.to_string(), Some(language.trim().to_string()))
                    }
                    None => (args.clone(), None),
                };
                Command::Translate { reference, language }
            }
            "ask" => Command::Ask { question: required("question")? },
            "find" => Command::Find { query: required("query")? },
            "history" => Command::History,
            "purge" => {
                let hours = if rest.is_empty() {
                    DEFAULT_PURGE_HOURS
                } else {
                    rest.parse().map_err(|_| anyhow!("Invalid number of hours: {}", rest))?
                };
                Command::Purge { hours }
            }
            "help" | "?" => Command::Help,
            "exit" | "quit" => Command::Exit,
            _ => return Err(anyhow!("Unknown command: {} (type 'help')", verb)),
        };

        Ok(command)
    }
}
