use std::io::{self, Write};
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::parser::{Command, CommandParser};
use crate::core::{Resource, Session};

const HELP: &str = "\
Commands:
  upload <path>                 add a local file (pdf, txt, docx, mp3, wav, mp4)
  fetch <url>                   download a document from a URL
  video <url>                   download a video with the configured downloader
  post <title> | <body>         save pasted course text
  list                          show resources
  delete <ref>                  remove a resource and its file
  extract <ref>                 print a resource's text
  summarize <ref>               summarize a resource
  translate <ref> [language]    translate the start of a resource
  ask <question>                chat, using your first resources as context
  find <query>                  rank resources by relevance
  history                       show the conversation
  purge [hours]                 delete stored files older than <hours>
  exit
<ref> is a number from `list` or a resource id.";

pub enum Flow {
    Continue(String),
    Exit,
}

pub async fn run(mut session: Session) -> Result<()> {
    println!("Welcome to Lectern");
    if let Err(e) = session.llm() {
        println!("⚠️ {}", e);
    }
    println!("Type 'help' for commands or 'exit' to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(input) = lines.next_line().await? else { break };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let command = match CommandParser::parse(input) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match execute(&mut session, command).await {
            Ok(Flow::Continue(output)) => println!("{}", output),
            Ok(Flow::Exit) => break,
            Err(e) => println!("❌ {}", e),
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn describe(resource: &Resource) -> String {
    format!(
        "{} ({:.2} MB, {}) [{}]",
        resource.name,
        resource.size_mb,
        resource.source.label(),
        resource.id
    )
}

/// Runs one console command against the session. Errors are user-facing messages.
pub async fn execute(session: &mut Session, command: Command) -> Result<Flow> {
    debug!(?command, "console command");
    let output = match command {
        Command::Upload { path } => {
            let resource = session.upload_path(&path)?;
            format!("✅ {} uploaded successfully!", describe(resource))
        }
        Command::Fetch { url } => {
            let resource = session.add_from_url(&url).await?;
            format!("✅ {} added", describe(resource))
        }
        Command::Video { url } => {
            let resource = session.add_video(&url).await?;
            format!("✅ {} added", describe(resource))
        }
        Command::Post { title, body } => {
            let resource = session.add_course_post(&title, &body)?;
            format!("✅ {} added", describe(resource))
        }
        Command::List => {
            if session.resources().is_empty() {
                "📤 No resources yet. Upload something first!".to_string()
            } else {
                session
                    .resources()
                    .iter()
                    .enumerate()
                    .map(|(i, r)| format!("{:>3}. {}", i + 1, describe(r)))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Delete { reference } => {
            let id = session.resolve(&reference)?;
            let removed = session.remove(id)?;
            format!("Deleted {}", removed.name)
        }
        Command::Extract { reference } => {
            let id = session.resolve(&reference)?;
            let text = session.extract(id)?;
            if text.is_empty() {
                "No text could be extracted from this resource.".to_string()
            } else {
                text
            }
        }
        Command::Summarize { reference } => {
            let id = session.resolve(&reference)?;
            format!("Summary:\n{}", session.summarize(id).await?)
        }
        Command::Translate { reference, language } => {
            let id = session.resolve(&reference)?;
            let language = language.unwrap_or_else(|| session.settings().default_language.clone());
            let translated = session.translate(id, Some(&language)).await?;
            format!("Translation ({}):\n{}", language, translated)
        }
        Command::Ask { question } => session.ask(&question).await?,
        Command::Find { .. } if session.resources().is_empty() => {
            "📤 Upload resources first, then search them.".to_string()
        }
        Command::Find { query } => {
            let relevant = session.find_relevant(&query).await?;
            if relevant.is_empty() {
                "No matching resources found".to_string()
            } else {
                let lines: Vec<String> = relevant.iter().map(|r| format!("- {}", r)).collect();
                format!("📌 Relevant Resources:\n{}", lines.join("\n"))
            }
        }
        Command::History => {
            if session.transcript().is_empty() {
                "No conversation yet.".to_string()
            } else {
                session
                    .transcript()
                    .iter()
                    .map(|m| format!("[{}] {}", m.role.as_str(), m.content))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Purge { hours } => {
            let removed = session.purge_older_than(hours);
            format!("Removed {} file(s) older than {} hour(s)", removed, hours)
        }
        Command::Help => HELP.to_string(),
        Command::Exit => return Ok(Flow::Exit),
    };
    Ok(Flow::Continue(output))
}
