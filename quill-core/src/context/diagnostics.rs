//! Language-server diagnostics for the active document

use crate::editor::{DocumentInfo, EditorSurface};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PublishDiagnostics {
    params: Option<DiagnosticParams>,
}

#[derive(Debug, Deserialize)]
struct DiagnosticParams {
    #[serde(default)]
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Deserialize)]
struct Diagnostic {
    range: Range,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Range {
    start: Position,
}

#[derive(Debug, Deserialize)]
struct Position {
    line: u64,
}

/// LSP `languageId` for a path, by extension
pub fn language_id(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "rs" => "rust",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => "cpp",
        "cs" => "csharp",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "json" => "json",
        "toml" => "toml",
        "md" => "markdown",
        _ => "plaintext",
    }
}

/// `file://` URI for a storage path
pub fn file_uri(path: &str) -> String {
    let path = path.replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

/// Render a raw `publishDiagnostics` notification; `None` when there is
/// nothing to report or the JSON does not parse
pub fn render_diagnostics(raw: &str) -> Option<String> {
    let notification: PublishDiagnostics = match serde_json::from_str(raw) {
        Ok(notification) => notification,
        Err(err) => {
            debug!(error = %err, "ignoring malformed diagnostics");
            return None;
        }
    };
    let diagnostics = notification.params?.diagnostics;
    if diagnostics.is_empty() {
        return None;
    }

    let mut out = String::from("LSP DIAGNOSTICS:\n");
    for diagnostic in diagnostics {
        out.push_str(&format!(
            "- Line {}: {}\n",
            diagnostic.range.start.line.saturating_add(1),
            diagnostic.message
        ));
    }
    out.push('\n');
    Some(out)
}

/// Announce the active document to the language server and render its
/// current diagnostics
pub fn active_diagnostics(editor: &mut dyn EditorSurface, document: &DocumentInfo) -> String {
    let Some(path) = document.path.as_deref().filter(|path| !path.is_empty()) else {
        return String::new();
    };
    if document.is_console() {
        return String::new();
    }

    let text = editor.full_text();
    editor.lsp_notify(
        "textDocument/didOpen",
        &json!({
            "textDocument": {
                "uri": file_uri(path),
                "languageId": language_id(path),
                "version": 1,
                "text": text
            }
        }),
    );

    editor
        .lsp_diagnostics()
        .and_then(|raw| render_diagnostics(&raw))
        .unwrap_or_default()
}
