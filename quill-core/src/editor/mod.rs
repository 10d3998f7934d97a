//! Editing surface abstraction
//!
//! The assistant never owns text. Everything it reads or changes goes through
//! an [`EditorSurface`]: the set of open documents, the active one, byte
//! offset reads and writes, the caret, the status line, one-line input
//! requests and the language-server hooks. [`MemoryEditor`] implements the
//! trait for tests and for the terminal front end.

pub mod memory;

pub use memory::MemoryEditor;

use crate::config::constants::sentinels;
use crate::conversation::DocumentId;
use serde_json::Value;

/// Name and storage path of an open document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub name: String,
    pub path: Option<String>,
}

impl DocumentInfo {
    /// Conversation identity: the storage path, the scratch name for
    /// `*name*` buffers, or `untitled`
    pub fn id(&self) -> DocumentId {
        match self.path.as_deref().filter(|path| !path.is_empty()) {
            Some(path) => DocumentId::new(path),
            None if is_scratch_name(&self.name) => DocumentId::new(self.name.clone()),
            None => DocumentId::untitled(),
        }
    }

    /// Final path component, or the buffer name
    pub fn file_name(&self) -> &str {
        self.path
            .as_deref()
            .and_then(|path| path.rsplit(['/', '\\']).next())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn is_console(&self) -> bool {
        self.path.is_none() && self.name == sentinels::CONSOLE
    }
}

fn is_scratch_name(name: &str) -> bool {
    name.len() > 2 && name.starts_with('*') && name.ends_with('*')
}

/// Host editor operations used by the assistant.
///
/// Offsets and lengths are in bytes of the active document. Implementations
/// clamp out-of-range values instead of failing.
pub trait EditorSurface {
    fn documents(&self) -> Vec<DocumentInfo>;

    fn active_index(&self) -> usize;

    /// Make document `index` active; false when out of range
    fn switch_to(&mut self, index: usize) -> bool;

    /// Byte length of the active document
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn text(&self, start: usize, len: usize) -> String;

    fn insert(&mut self, offset: usize, text: &str);

    fn delete(&mut self, start: usize, len: usize);

    fn caret(&self) -> usize;

    fn set_caret(&mut self, offset: usize);

    /// Other end of the selection, if a selection is active
    fn selection_anchor(&self) -> Option<usize>;

    /// Open a file from storage and make it active
    fn open(&mut self, path: &str) -> Option<usize>;

    /// Create an empty, pathless document and make it active
    fn new_document(&mut self, name: &str) -> usize;

    /// Write `contents` to storage at `path`
    fn write_file(&mut self, path: &str, contents: &str) -> bool;

    fn set_status(&mut self, message: &str);

    /// Prompt the user for one line; the host calls `callback` with the answer
    fn request_input(&mut self, label: &str, callback: &str);

    /// Send a language-server notification
    fn lsp_notify(&mut self, method: &str, params: &Value);

    /// Latest `publishDiagnostics` notification as raw JSON
    fn lsp_diagnostics(&self) -> Option<String>;

    fn active_document(&self) -> Option<DocumentInfo> {
        self.documents().into_iter().nth(self.active_index())
    }

    fn full_text(&self) -> String {
        self.text(0, self.len())
    }

    /// Ordered `(start, end)` of the selection when it is non-empty
    fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.selection_anchor()?;
        let caret = self.caret();
        (anchor != caret).then(|| (anchor.min(caret), anchor.max(caret)))
    }

    /// Index of the open document stored at `path`
    fn find_document(&self, path: &str) -> Option<usize> {
        self.documents()
            .iter()
            .position(|doc| doc.path.as_deref() == Some(path))
    }
}

/// Run `f` with document `index` active, then restore the previous one
pub fn with_document<R>(
    editor: &mut dyn EditorSurface,
    index: usize,
    f: impl FnOnce(&mut dyn EditorSurface) -> R,
) -> R {
    let previous = editor.active_index();
    editor.switch_to(index);
    let result = f(editor);
    editor.switch_to(previous);
    result
}
