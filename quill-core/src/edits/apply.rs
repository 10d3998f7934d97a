use super::guard::AccessPolicy;
use super::parser::EditBlock;
use crate::config::constants::sentinels;
use crate::editor::EditorSurface;
use std::fmt;
use tracing::{debug, warn};

/// What happened to one edit block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Target outside the allowed project root
    Refused,
    /// Target could not be opened or created
    Failed,
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApplyOutcome::Applied => "applied",
            ApplyOutcome::Refused => "refused",
            ApplyOutcome::Failed => "failed",
        })
    }
}

/// Replace `block.length` bytes at `block.start` in the block's target.
///
/// The target is resolved in order: the `active` sentinel, an open document
/// with that path, the file opened from storage, or a newly created empty
/// file. Offsets are clamped to the document. The previously active
/// document is active again on return.
pub fn apply_edit(
    editor: &mut dyn EditorSurface,
    policy: &AccessPolicy,
    block: &EditBlock,
) -> ApplyOutcome {
    let active_path = editor.active_document().and_then(|doc| doc.path);
    if !policy.is_allowed(&block.path, active_path.as_deref()) {
        warn!(path = %block.path, root = ?policy.root(), "edit outside project root refused");
        return ApplyOutcome::Refused;
    }

    let previous = editor.active_index();
    let Some(target) = resolve_target(editor, &block.path, previous) else {
        editor.switch_to(previous);
        warn!(path = %block.path, "edit target could not be opened or created");
        return ApplyOutcome::Failed;
    };

    editor.switch_to(target);
    let len = editor.len();
    let start = block.start.min(len);
    let length = block.length.min(len - start);
    editor.delete(start, length);
    editor.insert(start, &block.text);
    editor.switch_to(previous);

    debug!(
        path = %block.path,
        start,
        deleted = length,
        inserted = block.text.len(),
        "edit applied"
    );
    ApplyOutcome::Applied
}

fn resolve_target(editor: &mut dyn EditorSurface, path: &str, active: usize) -> Option<usize> {
    if path == sentinels::ACTIVE {
        return Some(active);
    }
    if let Some(index) = editor.find_document(path) {
        return Some(index);
    }
    if let Some(index) = editor.open(path) {
        return Some(index);
    }
    if editor.write_file(path, "") {
        debug!(path, "created file for edit");
        return editor.open(path);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MemoryEditor;

    fn block(path: &str, start: usize, length: usize, text: &str) -> EditBlock {
        EditBlock {
            path: path.to_string(),
            start,
            length,
            text: text.to_string(),
        }
    }

    #[test]
    fn replaces_range_in_active_document() {
        let mut editor = MemoryEditor::with_text("world!");
        let outcome = apply_edit(
            &mut editor,
            &AccessPolicy::unrestricted(),
            &block("active", 0, 5, "HELLO"),
        );
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(editor.full_text(), "HELLO!");
    }

    #[test]
    fn start_beyond_length_appends() {
        let mut editor = MemoryEditor::with_text("abc");
        apply_edit(
            &mut editor,
            &AccessPolicy::unrestricted(),
            &block("active", 100, 7, "!"),
        );
        assert_eq!(editor.full_text(), "abc!");
    }

    #[test]
    fn length_is_clamped_to_remaining_text() {
        let mut editor = MemoryEditor::with_text("abcdef");
        apply_edit(
            &mut editor,
            &AccessPolicy::unrestricted(),
            &block("active", 4, 100, "XY"),
        );
        assert_eq!(editor.full_text(), "abcdXY");
    }

    #[test]
    fn edits_open_document_and_restores_active() {
        let mut editor = MemoryEditor::with_text("console");
        editor.add_document("lib.rs", Some("/p/lib.rs"), "fn a() {}");
        editor.switch_to(0);

        let outcome = apply_edit(
            &mut editor,
            &AccessPolicy::unrestricted(),
            &block("/p/lib.rs", 3, 1, "b"),
        );
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(editor.active_index(), 0);
        assert_eq!(editor.document_text(1), Some("fn b() {}"));
    }

    #[test]
    fn opens_file_from_storage() {
        let mut editor = MemoryEditor::with_text("");
        editor.add_file("/p/main.rs", "fn main() {}");
        apply_edit(
            &mut editor,
            &AccessPolicy::unrestricted(),
            &block("/p/main.rs", 0, 0, "// top\n"),
        );
        assert_eq!(editor.active_index(), 0);
        assert_eq!(editor.document_text(1), Some("// top\nfn main() {}"));
    }

    #[test]
    fn creates_missing_file_inside_root() {
        let mut editor = MemoryEditor::with_text("");
        let policy = AccessPolicy::new(Some("/p"), None);
        let outcome = apply_edit(&mut editor, &policy, &block("/p/new.rs", 5, 5, "fresh"));
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(editor.file("/p/new.rs"), Some(String::new()));
        assert_eq!(editor.document_text(1), Some("fresh"));
    }

    #[test]
    fn refuses_outside_root_without_touching_anything() {
        let mut editor = MemoryEditor::with_text("keep");
        editor.add_file("C:/other/file.txt", "original");
        let policy = AccessPolicy::new(Some("C:/proj/"), None);
        let outcome = apply_edit(
            &mut editor,
            &policy,
            &block("C:/other/file.txt", 0, 8, "pwned"),
        );
        assert_eq!(outcome, ApplyOutcome::Refused);
        assert_eq!(editor.file("C:/other/file.txt"), Some("original".to_string()));
        assert_eq!(editor.documents().len(), 1);
    }
}
