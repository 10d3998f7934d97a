use super::{DocumentInfo, EditorSurface};
use crate::config::constants::sentinels;
use crate::utils::floor_char_boundary;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
struct Buffer {
    name: String,
    path: Option<String>,
    text: String,
    caret: usize,
    anchor: Option<usize>,
    dirty: bool,
}

impl Buffer {
    fn new(name: impl Into<String>, path: Option<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path,
            text: text.into(),
            caret: 0,
            anchor: None,
            dirty: false,
        }
    }

    fn clamp(&self, offset: usize) -> usize {
        floor_char_boundary(&self.text, offset)
    }
}

/// Where `open` and `write_file` read and write
#[derive(Debug, Clone)]
enum Storage {
    Virtual(BTreeMap<String, String>),
    Disk,
}

/// In-memory editor with virtual or disk-backed storage
#[derive(Debug, Clone)]
pub struct MemoryEditor {
    buffers: Vec<Buffer>,
    active: usize,
    storage: Storage,
    statuses: Vec<String>,
    pending_input: Option<(String, String)>,
    notifications: Vec<(String, Value)>,
    diagnostics: Option<String>,
}

impl Default for MemoryEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEditor {
    /// One empty untitled document and an empty virtual file system
    pub fn new() -> Self {
        Self::with_text("")
    }

    /// One untitled document holding `text`, caret at the end
    pub fn with_text(text: &str) -> Self {
        let mut buffer = Buffer::new(sentinels::UNTITLED, None, text);
        buffer.caret = text.len();
        Self {
            buffers: vec![buffer],
            active: 0,
            storage: Storage::Virtual(BTreeMap::new()),
            statuses: Vec::new(),
            pending_input: None,
            notifications: Vec::new(),
            diagnostics: None,
        }
    }

    /// Read and write files on the real file system
    pub fn disk_backed(mut self) -> Self {
        self.storage = Storage::Disk;
        self
    }

    /// Add an open document and make it active
    pub fn add_document(&mut self, name: &str, path: Option<&str>, text: &str) -> usize {
        self.buffers
            .push(Buffer::new(name, path.map(str::to_string), text));
        self.active = self.buffers.len() - 1;
        self.active
    }

    /// Seed the virtual file system
    pub fn add_file(&mut self, path: &str, contents: &str) {
        if let Storage::Virtual(files) = &mut self.storage {
            files.insert(path.to_string(), contents.to_string());
        }
    }

    /// Contents of a stored file
    pub fn file(&self, path: &str) -> Option<String> {
        match &self.storage {
            Storage::Virtual(files) => files.get(path).cloned(),
            Storage::Disk => fs::read_to_string(path).ok(),
        }
    }

    pub fn document_text(&self, index: usize) -> Option<&str> {
        self.buffers.get(index).map(|buffer| buffer.text.as_str())
    }

    pub fn is_dirty(&self, index: usize) -> bool {
        self.buffers.get(index).is_some_and(|buffer| buffer.dirty)
    }

    /// Select from `anchor` to `caret` in the active document
    pub fn set_selection(&mut self, anchor: usize, caret: usize) {
        let buffer = &mut self.buffers[self.active];
        buffer.anchor = Some(buffer.clamp(anchor));
        buffer.caret = buffer.clamp(caret);
    }

    /// Latest status line message
    pub fn status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }

    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    /// Outstanding `(label, callback)` input request, if any
    pub fn take_input_request(&mut self) -> Option<(String, String)> {
        self.pending_input.take()
    }

    pub fn notifications(&self) -> &[(String, Value)] {
        &self.notifications
    }

    /// Diagnostics snapshot returned by `lsp_diagnostics`
    pub fn set_diagnostics(&mut self, raw: impl Into<String>) {
        self.diagnostics = Some(raw.into());
    }

    /// Write every modified document with a path back to storage
    pub fn save_all(&mut self) -> Result<usize> {
        let mut saved = 0;
        for index in 0..self.buffers.len() {
            let Some(path) = self.buffers[index].path.clone() else {
                continue;
            };
            if !self.buffers[index].dirty {
                continue;
            }
            let text = self.buffers[index].text.clone();
            match &mut self.storage {
                Storage::Virtual(files) => {
                    files.insert(path.clone(), text);
                }
                Storage::Disk => {
                    fs::write(&path, text)
                        .with_context(|| format!("Failed to save document: {path}"))?;
                }
            }
            self.buffers[index].dirty = false;
            debug!(path = %path, "document saved");
            saved += 1;
        }
        Ok(saved)
    }

    fn active_buffer(&self) -> &Buffer {
        &self.buffers[self.active]
    }

    fn active_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffers[self.active]
    }
}

impl EditorSurface for MemoryEditor {
    fn documents(&self) -> Vec<DocumentInfo> {
        self.buffers
            .iter()
            .map(|buffer| DocumentInfo {
                name: buffer.name.clone(),
                path: buffer.path.clone(),
            })
            .collect()
    }

    fn active_index(&self) -> usize {
        self.active
    }

    fn switch_to(&mut self, index: usize) -> bool {
        if index < self.buffers.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.active_buffer().text.len()
    }

    fn text(&self, start: usize, len: usize) -> String {
        let buffer = self.active_buffer();
        let start = buffer.clamp(start);
        let end = buffer.clamp(start.saturating_add(len));
        buffer.text[start..end].to_string()
    }

    fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let buffer = self.active_buffer_mut();
        let offset = buffer.clamp(offset);
        buffer.text.insert_str(offset, text);
        if buffer.caret >= offset {
            buffer.caret += text.len();
        }
        buffer.anchor = None;
        buffer.dirty = true;
    }

    fn delete(&mut self, start: usize, len: usize) {
        let buffer = self.active_buffer_mut();
        let start = buffer.clamp(start);
        let end = buffer.clamp(start.saturating_add(len));
        if start == end {
            return;
        }
        buffer.text.replace_range(start..end, "");
        if buffer.caret > end {
            buffer.caret -= end - start;
        } else if buffer.caret > start {
            buffer.caret = start;
        }
        buffer.anchor = None;
        buffer.dirty = true;
    }

    fn caret(&self) -> usize {
        self.active_buffer().caret
    }

    fn set_caret(&mut self, offset: usize) {
        let buffer = self.active_buffer_mut();
        buffer.caret = buffer.clamp(offset);
        buffer.anchor = None;
    }

    fn selection_anchor(&self) -> Option<usize> {
        self.active_buffer().anchor
    }

    fn open(&mut self, path: &str) -> Option<usize> {
        if let Some(index) = self.find_document(path) {
            self.active = index;
            return Some(index);
        }
        let contents = self.file(path)?;
        let name = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path)
            .to_string();
        Some(self.add_document(&name, Some(path), &contents))
    }

    fn new_document(&mut self, name: &str) -> usize {
        self.add_document(name, None, "")
    }

    fn write_file(&mut self, path: &str, contents: &str) -> bool {
        match &mut self.storage {
            Storage::Virtual(files) => {
                files.insert(path.to_string(), contents.to_string());
                true
            }
            Storage::Disk => {
                let parent_ok = Path::new(path)
                    .parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .is_none_or(|parent| fs::create_dir_all(parent).is_ok());
                parent_ok && fs::write(path, contents).is_ok()
            }
        }
    }

    fn set_status(&mut self, message: &str) {
        self.statuses.push(message.to_string());
    }

    fn request_input(&mut self, label: &str, callback: &str) {
        self.pending_input = Some((label.to_string(), callback.to_string()));
    }

    fn lsp_notify(&mut self, method: &str, params: &Value) {
        self.notifications.push((method.to_string(), params.clone()));
    }

    fn lsp_diagnostics(&self) -> Option<String> {
        self.diagnostics.clone()
    }
}
