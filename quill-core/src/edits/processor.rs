use super::apply::{ApplyOutcome, apply_edit};
use super::guard::AccessPolicy;
use super::parser::{Segment, scan};
use crate::config::constants::sentinels;
use crate::editor::EditorSurface;
use tracing::{info, warn};

/// Where the reply text goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// Appended to the console transcript, followed by a fresh prompt
    Console,
    /// Replaces `replace` in the active document, or is inserted at the caret
    Editor { replace: Option<(usize, usize)> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditReport {
    pub path: String,
    pub outcome: ApplyOutcome,
}

/// Result of applying and displaying one reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessedReply {
    /// Reply text with every edit block replaced by its acknowledgment
    pub display: String,
    pub edits: Vec<EditReport>,
    pub malformed: usize,
}

impl ProcessedReply {
    pub fn count(&self, outcome: ApplyOutcome) -> usize {
        self.edits
            .iter()
            .filter(|report| report.outcome == outcome)
            .count()
    }

    /// Status line text for the turn
    pub fn status_summary(&self) -> String {
        if self.edits.is_empty() && self.malformed == 0 {
            return "AI: Done".to_string();
        }
        let mut parts = vec![format!("{} applied", self.count(ApplyOutcome::Applied))];
        for outcome in [ApplyOutcome::Refused, ApplyOutcome::Failed] {
            let count = self.count(outcome);
            if count > 0 {
                parts.push(format!("{count} {outcome}"));
            }
        }
        if self.malformed > 0 {
            parts.push(format!("{} malformed", self.malformed));
        }
        format!("AI: edits {}", parts.join(", "))
    }
}

/// Applies edit blocks from a reply and writes the remaining text back
pub struct ResponseProcessor<'a> {
    policy: &'a AccessPolicy,
}

impl<'a> ResponseProcessor<'a> {
    pub fn new(policy: &'a AccessPolicy) -> Self {
        Self { policy }
    }

    /// Apply every well-formed block, then display the rest according to `mode`
    pub fn process(
        &self,
        editor: &mut dyn EditorSurface,
        reply: &str,
        mode: InvocationMode,
    ) -> ProcessedReply {
        let processed = self.apply_blocks(editor, reply);
        display(editor, &processed.display, mode);
        processed
    }

    /// Apply blocks without displaying anything
    pub fn apply_blocks(&self, editor: &mut dyn EditorSurface, reply: &str) -> ProcessedReply {
        let mut processed = ProcessedReply::default();

        for segment in scan(reply) {
            match segment {
                Segment::Prose(text) => processed.display.push_str(text),
                Segment::Block { block, .. } => {
                    let outcome = apply_edit(editor, self.policy, &block);
                    processed
                        .display
                        .push_str(&format!("[Applied update to {}]", block.path));
                    processed.edits.push(EditReport {
                        path: block.path,
                        outcome,
                    });
                }
                Segment::Malformed { raw, reason } => {
                    warn!(%reason, block = raw, "malformed edit block left in reply");
                    processed.malformed += 1;
                    processed.display.push_str(raw);
                }
            }
        }

        if !processed.edits.is_empty() {
            info!(
                applied = processed.count(ApplyOutcome::Applied),
                refused = processed.count(ApplyOutcome::Refused),
                failed = processed.count(ApplyOutcome::Failed),
                "edit blocks processed"
            );
        }
        processed
    }
}

/// Write reply text into the active document
pub fn display(editor: &mut dyn EditorSurface, text: &str, mode: InvocationMode) {
    match mode {
        InvocationMode::Console => {
            let end = editor.len();
            editor.insert(end, &format!("{text}\n\n{}", sentinels::PROMPT_MARKER));
            let end = editor.len();
            editor.set_caret(end);
        }
        InvocationMode::Editor { replace } => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return;
            }
            match replace {
                Some((start, end)) => {
                    editor.delete(start, end.saturating_sub(start));
                    editor.insert(start, trimmed);
                }
                None => {
                    let caret = editor.caret();
                    editor.insert(caret, trimmed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MemoryEditor;

    #[test]
    fn reply_without_blocks_is_inserted_trimmed() {
        let mut editor = MemoryEditor::with_text("");
        let policy = AccessPolicy::unrestricted();
        let processed = ResponseProcessor::new(&policy).process(
            &mut editor,
            "\n  // hello  \n",
            InvocationMode::Editor { replace: None },
        );
        assert_eq!(editor.full_text(), "// hello");
        assert!(processed.edits.is_empty());
        assert_eq!(processed.status_summary(), "AI: Done");
    }

    #[test]
    fn active_block_is_applied_and_acknowledged() {
        let mut editor = MemoryEditor::with_text("world!");
        let policy = AccessPolicy::unrestricted();
        let processed = ResponseProcessor::new(&policy).process(
            &mut editor,
            "@@@REPLACE active 0 5@@@\nHELLO\n@@@END@@@\nDone.",
            InvocationMode::Editor { replace: None },
        );
        assert_eq!(processed.display, "[Applied update to active]\nDone.");
        assert!(editor.full_text().starts_with("HELLO!"));
        assert_eq!(processed.count(ApplyOutcome::Applied), 1);
    }

    #[test]
    fn refused_block_still_acknowledged() {
        let mut editor = MemoryEditor::with_text("");
        editor.add_file("C:/other/file.txt", "original");
        editor.switch_to(0);
        let policy = AccessPolicy::new(Some("C:/proj/"), None);
        let processed = ResponseProcessor::new(&policy).apply_blocks(
            &mut editor,
            "@@@REPLACE C:/other/file.txt 0 0@@@\nx\n@@@END@@@",
        );
        assert_eq!(processed.display, "[Applied update to C:/other/file.txt]");
        assert_eq!(processed.count(ApplyOutcome::Refused), 1);
        assert_eq!(processed.status_summary(), "AI: edits 0 applied, 1 refused");
        assert_eq!(editor.file("C:/other/file.txt"), Some("original".to_string()));
    }

    #[test]
    fn malformed_blocks_stay_in_display() {
        let mut editor = MemoryEditor::with_text("");
        let policy = AccessPolicy::unrestricted();
        let reply = "@@@REPLACE active x y@@@\nbody\n@@@END@@@";
        let processed = ResponseProcessor::new(&policy).apply_blocks(&mut editor, reply);
        assert_eq!(processed.display, reply);
        assert_eq!(processed.malformed, 1);
        assert!(editor.full_text().is_empty());
    }

    #[test]
    fn console_mode_appends_prompt_and_moves_caret() {
        let mut editor = MemoryEditor::with_text("> question\n");
        display(&mut editor, "answer", InvocationMode::Console);
        assert_eq!(editor.full_text(), "> question\nanswer\n\n> ");
        assert_eq!(editor.caret(), editor.len());
    }

    #[test]
    fn editor_mode_replaces_selection() {
        let mut editor = MemoryEditor::with_text("let x = old;");
        display(
            &mut editor,
            " new ",
            InvocationMode::Editor {
                replace: Some((8, 11)),
            },
        );
        assert_eq!(editor.full_text(), "let x = new;");
    }

    #[test]
    fn editor_mode_ignores_blank_text() {
        let mut editor = MemoryEditor::with_text("keep");
        display(
            &mut editor,
            "  \n ",
            InvocationMode::Editor {
                replace: Some((0, 4)),
            },
        );
        assert_eq!(editor.full_text(), "keep");
    }
}
