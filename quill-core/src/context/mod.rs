//! Auxiliary context attached to the newest instruction
//!
//! The block is assembled in a fixed order: mentioned files, then
//! diagnostics and project hints, then the text around the selection.
//! Assembly only reads; the active document and caret are unchanged
//! afterwards.

pub mod diagnostics;
pub mod mentions;
pub mod project;

use crate::config::AssistantConfig;
use crate::editor::EditorSurface;
use crate::utils::{head_chars, tail_chars};

/// Text immediately before and after a selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surrounding {
    pub before: String,
    pub after: String,
}

impl Surrounding {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

pub struct ContextAssembler<'a> {
    config: &'a AssistantConfig,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(config: &'a AssistantConfig) -> Self {
        Self { config }
    }

    pub fn assemble(
        &self,
        editor: &mut dyn EditorSurface,
        instruction: &str,
        surrounding: Option<&Surrounding>,
    ) -> String {
        let active = editor.active_index();
        let caret = editor.caret();

        let mut out = mentions::mentioned_files(editor, instruction);

        if let Some(document) = editor.active_document() {
            out.push_str(&diagnostics::active_diagnostics(editor, &document));
        }
        if let Some(root) = self.config.allowed_root() {
            out.push_str(&project::project_hint(root));
        }
        if let Some(surrounding) = surrounding.filter(|s| !s.is_empty()) {
            out.push_str(&self.surrounding_text(surrounding));
        }

        if editor.active_index() != active {
            editor.switch_to(active);
        }
        if editor.caret() != caret {
            editor.set_caret(caret);
        }
        out
    }

    fn surrounding_text(&self, surrounding: &Surrounding) -> String {
        format!(
            "CONTEXT BEFORE:\n{}\nCONTEXT AFTER:\n{}\n\n",
            tail_chars(&surrounding.before, self.config.context_before),
            head_chars(&surrounding.after, self.config.context_after)
        )
    }
}
