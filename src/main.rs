//! Tagnotes CLI
//!
//! Inspect and manage stored notes, or chat with a model through the note hooks.

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tagnotes::commands::NoteCommand;
use tagnotes::{
    ChatGenerator, FileNoteStore, Generator, Intercept, NotesConfig, Notebook, TagNotes,
};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SYSTEM_PREFIX: &str = "You are a helpful assistant. Answer the human's latest message.";

/// Tagnotes - topic-indexed memory for conversational agents
#[derive(Parser, Debug)]
#[command(name = "tagnotes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding note files
    #[arg(long, global = true)]
    notes_dir: Option<PathBuf>,

    /// Maximum note length in words
    #[arg(long, global = true)]
    max_note_length: Option<usize>,

    /// Verbose output: debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available tags
    Tags,
    /// Show the note stored for a tag
    Show {
        #[arg(trailing_var_arg = true, required = true)]
        tag: Vec<String>,
    },
    /// Delete every stored note
    Clear,
    /// Chat on stdin/stdout with notes extracted and injected each turn
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli).await?;

    match cli.command {
        Command::Tags => run_note_command(&config, NoteCommand::ShowTags, "").await,
        Command::Show { ref tag } => {
            run_note_command(&config, NoteCommand::ShowNote, &tag.join(" ")).await
        }
        Command::Clear => run_note_command(&config, NoteCommand::ClearNotes, "").await,
        Command::Chat => run_chat(config).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn load_config(cli: &Cli) -> anyhow::Result<NotesConfig> {
    let path = cli.config.clone().or_else(NotesConfig::default_path);
    let mut config = match path {
        Some(path) => {
            info!("Config: {:?}", path);
            NotesConfig::load(&path).await?
        }
        None => NotesConfig::default(),
    };

    if let Some(dir) = &cli.notes_dir {
        config = config.with_notes_dir(dir.clone());
    }
    if let Some(words) = cli.max_note_length {
        config = config.with_max_note_length(words);
    }

    Ok(config.validate()?)
}

async fn run_note_command(
    config: &NotesConfig,
    command: NoteCommand,
    args: &str,
) -> anyhow::Result<()> {
    let store = FileNoteStore::new(&config.notes_dir).await;
    let notebook = Notebook::new(Arc::new(store));
    println!("{}", command.execute(args, &notebook).await);
    Ok(())
}

async fn run_chat(config: NotesConfig) -> anyhow::Result<()> {
    let generator: Arc<dyn Generator> = Arc::new(ChatGenerator::new(&config.llm)?);
    let notes = TagNotes::new(config, generator.clone()).await;

    let (input_tx, mut input_rx) = mpsc::channel::<String>(32);
    let (output_tx, mut output_rx) = mpsc::channel::<String>(32);

    // Spawn blocking thread to read from stdin
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if input_tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("Error reading stdin: {}", e);
                    break;
                }
            }
        }
    });

    // Spawn task to write to stdout
    let writer = tokio::spawn(async move {
        while let Some(msg) = output_rx.recv().await {
            if let Err(e) = writeln!(io::stdout(), "{}", msg) {
                error!("Error writing stdout: {}", e);
                break;
            }
            let _ = io::stdout().flush();
        }
    });

    let mut history = String::new();
    while let Some(line) = input_rx.recv().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if notes.before_read(&line, &output_tx).await == Intercept::Consumed {
            continue;
        }

        history.push_str(&format!("Human: {}\n", line));
        let prefix = notes.prompt_prefix(SYSTEM_PREFIX, &history).await;
        let prompt = format!("{}\n\n{}AI:", prefix, history);

        let reply = match generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Reply generation failed: {}", e);
                output_tx.send(format!("(no reply: {})", e)).await?;
                continue;
            }
        };

        notes.before_send(&history).await;
        output_tx.send(reply.clone()).await?;
        history.push_str(&format!("AI: {}\n", reply));
    }

    drop(output_tx);
    let _ = writer.await;
    Ok(())
}
