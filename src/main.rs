use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use lectern::cli;
use lectern::config::Settings;
use lectern::core::session::{truncate_chars, TRANSLATE_CONTEXT_CHARS};
use lectern::file::{FileProcessor, ResourceStore, RESOURCES_SUBFOLDER};
use lectern::health;
use lectern::{LlmClient, Session};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive console (default)
    Console,
    /// Check critical files, folders and the API credential
    Health,
    /// Report configured environment variables without revealing secrets
    VerifyEnv,
    /// Write a sanitized copy of .env for publishing
    EnvExample {
        #[arg(long, default_value = ".env")]
        input: PathBuf,
        #[arg(long, default_value = ".env.example")]
        output: PathBuf,
    },
    /// Summarize a local pdf or txt file
    Summarize { path: PathBuf },
    /// Translate the start of a local pdf or txt file
    Translate {
        path: PathBuf,
        #[arg(long, short)]
        language: Option<String>,
    },
    /// Delete stored resources older than the given age
    Purge {
        #[arg(long, default_value_t = 24)]
        hours: u64,
    },
}

fn extract_or_exit(path: &Path) -> String {
    let text = FileProcessor::extract_text(path);
    if text.is_empty() {
        eprintln!("No text could be extracted from {}", path.display());
        std::process::exit(1);
    }
    text
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG can come from it; the subscriber before Settings
    // so configuration warnings are not lost.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lectern=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env();

    let cli = Cli::parse();
    let workdir = std::env::current_dir()?;

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Console => {
            let session = Session::new(settings)?;
            cli::console::run(session).await?;
        }
        Commands::Health => {
            let report = health::health_check(&settings, &workdir);
            for failure in report.failures() {
                println!("❌ {}", failure.message);
            }
            if report.passed() {
                println!("✅ Health check passed");
            } else {
                println!("❌ Health check failed");
            }
            std::process::exit(report.exit_code());
        }
        Commands::VerifyEnv => {
            let report = health::verify_env(|key| dotenvy::var(key).ok(), &workdir);
            println!("{}", report);
            std::process::exit(report.exit_code());
        }
        Commands::EnvExample { input, output } => {
            let contents = std::fs::read_to_string(&input)
                .map_err(|e| anyhow::anyhow!("{} file not found: {}", input.display(), e))?;
            std::fs::write(&output, health::sanitize_env_example(&contents))?;
            println!("✅ Updated {}", output.display());
            println!("⚠️ Please review {} to ensure no sensitive data was included", output.display());
        }
        Commands::Summarize { path } => {
            let llm = LlmClient::from_settings(&settings)?;
            let text = extract_or_exit(&path);
            println!("{}", llm.summarize(&text, None).await);
        }
        Commands::Translate { path, language } => {
            let llm = LlmClient::from_settings(&settings)?;
            let text = extract_or_exit(&path);
            let language = language.unwrap_or_else(|| settings.default_language.clone());
            let excerpt = truncate_chars(&text, TRANSLATE_CONTEXT_CHARS);
            println!("{}", llm.translate(excerpt, &language).await);
        }
        Commands::Purge { hours } => {
            let folder = settings.upload_folder.join(RESOURCES_SUBFOLDER);
            let removed = ResourceStore::purge_older_than(&folder, hours);
            println!("Removed {} file(s) from {}", removed, folder.display());
        }
    }

    Ok(())
}
