use super::{build_assistant, open_files, print_edit_summary, save_documents};
use anyhow::Result;
use console::style;
use quill_core::config::constants::sentinels::PROMPT_MARKER;
use quill_core::{ConsoleResponse, EditorSurface, FileConfigStore, MemoryEditor, TurnOutcome};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Interactive console: each line typed is appended to the `*AI*` document
/// and handled the way the editor console handles it.
pub async fn handle_chat_command(store: Arc<FileConfigStore>, files: &[PathBuf]) -> Result<()> {
    let assistant = build_assistant(store.clone())?;
    let mut editor = MemoryEditor::new().disk_backed();
    open_files(&mut editor, files)?;

    println!(
        "{} {}",
        style("Config:").dim(),
        style(store.path().display()).dim()
    );
    if !files.is_empty() {
        println!(
            "{}",
            style("Reference open files with @name; type 'exit' to quit").dim()
        );
    }

    let console = assistant.open_console(&mut editor);
    print!("{}", editor.full_text());
    io::stdout().flush()?;

    let stdin = io::stdin();
    loop {
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }

        editor.switch_to(console);
        let end = editor.len();
        editor.insert(end, line);
        let shown = editor.len();

        let response = assistant.handle_console_input(&mut editor).await;
        editor.switch_to(console);
        let added = transcript_since(&editor, shown);
        match response {
            Ok(ConsoleResponse::Empty) => print!("{PROMPT_MARKER}"),
            Ok(ConsoleResponse::Turn(TurnOutcome::Completed(reply))) => {
                print!("{}", added.strip_prefix('\n').unwrap_or(&added));
                if !reply.edits.is_empty() || reply.malformed > 0 {
                    println!();
                    print_edit_summary(&reply);
                    save_documents(&mut editor)?;
                    print!("{PROMPT_MARKER}");
                }
            }
            Ok(_) | Err(_) => print!("{}", added.strip_prefix('\n').unwrap_or(&added)),
        }
        io::stdout().flush()?;
    }

    save_documents(&mut editor)?;
    Ok(())
}

/// Console text written after offset `shown`; the whole buffer when the
/// turn rewrote the transcript below that point
fn transcript_since(editor: &dyn EditorSurface, shown: usize) -> String {
    match editor.len().checked_sub(shown) {
        Some(added) => editor.text(shown, added),
        None => editor.full_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_since_returns_appended_text() {
        let editor = MemoryEditor::with_text("> hello\nanswer\n\n> ");
        assert_eq!(transcript_since(&editor, 7), "\nanswer\n\n> ");
        assert_eq!(transcript_since(&editor, editor.len()), "");
    }

    #[test]
    fn transcript_since_survives_a_shrunken_console() {
        let mut editor = MemoryEditor::with_text("// header\n\n> rewrite everything");
        let shown = editor.len();
        editor.delete(0, shown);
        editor.insert(0, "X\n\n> ");
        assert_eq!(transcript_since(&editor, shown), "X\n\n> ");
    }
}
