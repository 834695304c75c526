//! Slash commands answered directly, bypassing the agent
//!
//! - `/show_tags` = list stored tags
//! - `/show_note <tag>` = print one note
//! - `/clear_notes` = delete every note

use crate::notes::Notebook;
use std::fmt;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteCommand {
    /// List available tags
    ShowTags,
    /// Show the note stored for a tag
    ShowNote,
    /// Delete all notes
    ClearNotes,
}

impl NoteCommand {
    pub fn all() -> &'static [NoteCommand] {
        &[
            NoteCommand::ShowTags,
            NoteCommand::ShowNote,
            NoteCommand::ClearNotes,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            NoteCommand::ShowTags => "show_tags",
            NoteCommand::ShowNote => "show_note",
            NoteCommand::ClearNotes => "clear_notes",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            NoteCommand::ShowTags => "list available tags",
            NoteCommand::ShowNote => "show the note for a tag",
            NoteCommand::ClearNotes => "delete all notes",
        }
    }

    pub fn takes_args(&self) -> bool {
        matches!(self, NoteCommand::ShowNote)
    }

    /// `/show_note [tag]` style usage line
    pub fn usage(&self) -> String {
        if self.takes_args() {
            format!("{} [tag_name]", self)
        } else {
            self.to_string()
        }
    }

    pub fn parse(name: &str) -> Option<NoteCommand> {
        let name = name.to_lowercase();
        Self::all().iter().find(|cmd| cmd.name() == name).copied()
    }

    /// Run the command and render the reply text.
    pub async fn execute(&self, args: &str, notebook: &Notebook) -> String {
        match self {
            NoteCommand::ShowTags => {
                let tags = notebook.list_available_tags().await;
                if tags.is_empty() {
                    "🏷️ No tags available yet.".to_string()
                } else {
                    let lines: Vec<String> = tags.iter().map(|t| format!("• {}", t)).collect();
                    format!("🏷️ Available tags ({}):\n{}", tags.len(), lines.join("\n"))
                }
            }
            NoteCommand::ShowNote => {
                let tag = args.trim().to_lowercase();
                if tag.is_empty() {
                    return format!("❓ Usage: {}", self.usage());
                }
                match notebook.contextual_note(&tag).await {
                    Some(note) => format!("📝 Note for '{}':\n\n{}", tag, note),
                    None => format!("❌ No note found for '{}'", tag),
                }
            }
            NoteCommand::ClearNotes => match notebook.clear_all().await {
                Ok(removed) => format!("🗑️ All notes have been deleted ({} removed).", removed),
                Err(e) => {
                    error!("Failed to clear notes: {}", e);
                    format!("❌ Error deleting notes: {}", e)
                }
            },
        }
    }
}

impl fmt::Display for NoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// A recognised command plus its argument text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: NoteCommand,
    pub args: String,
}

/// Recognise one of the note commands. Anything else, including other slash
/// commands, is left for the host.
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim().strip_prefix('/')?;
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    NoteCommand::parse(name).map(|command| ParsedCommand {
        command,
        args: args.to_string(),
    })
}

/// One-line help listing every command
pub fn help_line() -> String {
    NoteCommand::all()
        .iter()
        .map(|cmd| cmd.usage())
        .collect::<Vec<_>>()
        .join(", ")
}
