//! Command-line front end
//!
//! The CLI hosts the assistant over a disk-backed in-memory editor: files
//! named on the command line are opened as documents, and documents touched
//! by edits are written back when a turn finishes.

pub mod ask;
pub mod chat;
pub mod config;

use anyhow::{Context, Result};
use console::style;
use quill_core::{
    Assistant, ConfigStore, EditorSurface, FileConfigStore, MemoryEditor, ProcessedReply,
    ReqwestTransport,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub fn config_store(path: Option<&Path>) -> Arc<FileConfigStore> {
    let store = match path {
        Some(path) => FileConfigStore::new(path),
        None => FileConfigStore::from_env_or_default(),
    };
    Arc::new(store)
}

/// Assistant over `store` with an HTTP transport configured from it
pub fn build_assistant(store: Arc<FileConfigStore>) -> Result<Assistant> {
    let config = store.load();
    debug!(
        path = %store.path().display(),
        server = %config.active_server,
        agent = %config.active_agent,
        "configuration loaded"
    );
    let mut transport = ReqwestTransport::new(Duration::from_secs(config.request_timeout_secs))
        .context("Failed to initialize HTTP transport")?;
    if config.dump_payloads {
        if let Some(dir) = store.private_dir() {
            transport = transport.with_payload_dump(dir);
        }
    }
    Ok(Assistant::new(store, Arc::new(transport)))
}

/// Open each file as a document; missing files start empty
pub fn open_files(editor: &mut MemoryEditor, files: &[impl AsRef<Path>]) -> Result<()> {
    for file in files {
        let path = file.as_ref();
        let path = path
            .to_str()
            .with_context(|| format!("Path is not valid UTF-8: {}", path.display()))?;
        if editor.open(path).is_none() {
            if !editor.write_file(path, "") {
                anyhow::bail!("Cannot open or create {path}");
            }
            editor
                .open(path)
                .with_context(|| format!("Cannot open {path}"))?;
        }
    }
    Ok(())
}

/// Write modified documents back to disk and report what was saved
pub fn save_documents(editor: &mut MemoryEditor) -> Result<()> {
    let saved = editor.save_all()?;
    if saved > 0 {
        println!(
            "{}",
            style(format!("Saved {saved} document(s)")).green()
        );
    }
    Ok(())
}

/// One-line summary of the edits in a reply
pub fn print_edit_summary(reply: &ProcessedReply) {
    for report in &reply.edits {
        println!(
            "{} {} ({})",
            style("edit").cyan().bold(),
            report.path,
            report.outcome
        );
    }
    if reply.malformed > 0 {
        println!(
            "{}",
            style(format!("{} malformed edit block(s) left in the reply", reply.malformed)).yellow()
        );
    }
}
