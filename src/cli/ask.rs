use super::{build_assistant, open_files, print_edit_summary, save_documents};
use anyhow::{Context, Result, bail};
use console::style;
use quill_core::{
    AssistantError, EditorSurface, FileConfigStore, InvocationMode, MemoryEditor, TurnOutcome,
};
use std::path::Path;
use std::sync::Arc;

/// Run one instruction.
///
/// With `--selection` the selected range of `--file` is replaced by the
/// reply. Otherwise the reply is printed, and any edit blocks it carries are
/// applied and saved.
pub async fn handle_ask_command(
    store: Arc<FileConfigStore>,
    instruction: &str,
    file: Option<&Path>,
    selection: Option<&str>,
) -> Result<()> {
    let assistant = build_assistant(store)?;
    let mut editor = MemoryEditor::new().disk_backed();
    if let Some(file) = file {
        open_files(&mut editor, &[file])?;
    }

    let outcome = match selection {
        Some(range) => {
            let (start, end) = parse_selection(range)?;
            editor.set_selection(start, end);
            assistant.complete(&mut editor).await
        }
        None => {
            if instruction.trim().is_empty() {
                bail!("No instruction provided. Use: quill ask \"Your instruction here\"");
            }
            let console = quill_core::DocumentId::console();
            editor.new_document(console.as_str());
            assistant
                .execute(&mut editor, instruction, None, InvocationMode::Console)
                .await
                .map(Some)
        }
    };

    let outcome = match outcome {
        Ok(Some(outcome)) => outcome,
        Ok(None) => bail!("Nothing selected"),
        Err(err @ (AssistantError::MissingApiKey(_) | AssistantError::NoActiveServer(_))) => {
            return Err(err).context("Run `quill chat` and use /server or /key to configure");
        }
        Err(err) => return Err(err.into()),
    };

    match outcome {
        TurnOutcome::Completed(reply) => {
            if selection.is_none() {
                println!("{}", reply.display.trim());
            }
            print_edit_summary(&reply);
            save_documents(&mut editor)?;
            Ok(())
        }
        TurnOutcome::ProviderError(message) => {
            eprintln!("{} {message}", style("Error:").red().bold());
            bail!("Request failed")
        }
    }
}

fn parse_selection(range: &str) -> Result<(usize, usize)> {
    let (start, end) = range
        .split_once(':')
        .with_context(|| format!("Selection must look like start:end, got '{range}'"))?;
    let start: usize = start.trim().parse().context("Invalid selection start")?;
    let end: usize = end.trim().parse().context("Invalid selection end")?;
    if start >= end {
        bail!("Selection is empty: {range}");
    }
    Ok((start, end))
}
