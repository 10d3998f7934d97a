//! `@file` mentions in instructions

use crate::config::constants::context::{MENTION_EXCERPT_LIMIT, TRUNCATION_MARKER};
use crate::editor::{DocumentInfo, EditorSurface, with_document};
use crate::utils::truncate_with_marker;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error};

const MENTION_PATTERN: &str = r"@([^\s@]+)";

static MENTION: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(MENTION_PATTERN));

fn mention_pattern() -> Option<&'static Regex> {
    match MENTION.as_ref() {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            error!(pattern = MENTION_PATTERN, error = %err, "mention pattern does not compile");
            None
        }
    }
}

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '"', '\''];

/// Mention tokens in order of appearance, trailing punctuation removed
pub fn mention_tokens(instruction: &str) -> Vec<&str> {
    let Some(pattern) = mention_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(instruction)
        .filter_map(|captures| captures.get(1))
        .map(|token| token.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Index of the document a mention refers to: exact file name first, then
/// any path containing the token
pub fn resolve_mention(documents: &[DocumentInfo], token: &str) -> Option<usize> {
    documents
        .iter()
        .position(|doc| doc.file_name() == token)
        .or_else(|| {
            documents.iter().position(|doc| {
                doc.path
                    .as_deref()
                    .is_some_and(|path| path.replace('\\', "/").contains(token))
            })
        })
}

/// Excerpts of every mentioned open document, each at most
/// `MENTION_EXCERPT_LIMIT` characters
pub fn mentioned_files(editor: &mut dyn EditorSurface, instruction: &str) -> String {
    let tokens = mention_tokens(instruction);
    if tokens.is_empty() {
        return String::new();
    }

    let documents = editor.documents();
    let mut seen = Vec::new();
    let mut out = String::new();

    for token in tokens {
        let Some(index) = resolve_mention(&documents, token) else {
            debug!(token, "mention did not match an open document");
            continue;
        };
        if seen.contains(&index) {
            continue;
        }
        seen.push(index);

        let text = with_document(editor, index, |ed| ed.full_text());
        let excerpt = truncate_with_marker(&text, MENTION_EXCERPT_LIMIT, TRUNCATION_MARKER);
        let doc = &documents[index];
        let label = doc.path.as_deref().unwrap_or(&doc.name);
        out.push_str(&format!("FILE: {label}\n{excerpt}\n\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MemoryEditor;

    #[test]
    fn mention_pattern_compiles() {
        assert!(MENTION.is_ok(), "{:?}", MENTION.as_ref().err());
        assert!(mention_pattern().is_some_and(|pattern| pattern.is_match("see @a.rs")));
    }

    #[test]
    fn tokens_strip_trailing_punctuation() {
        assert_eq!(
            mention_tokens("compare @main.rs, @src/lib.rs and @util.rs."),
            ["main.rs", "src/lib.rs", "util.rs"]
        );
        assert!(mention_tokens("email me at nobody").is_empty());
    }

    #[test]
    fn exact_name_beats_path_substring() {
        let docs = vec![
            DocumentInfo {
                name: "old_main.rs".to_string(),
                path: Some("/p/old_main.rs".to_string()),
            },
            DocumentInfo {
                name: "main.rs".to_string(),
                path: Some("/p/src/main.rs".to_string()),
            },
        ];
        assert_eq!(resolve_mention(&docs, "main.rs"), Some(1));
        assert_eq!(resolve_mention(&docs, "src/"), Some(1));
        assert_eq!(resolve_mention(&docs, "old"), Some(0));
        assert_eq!(resolve_mention(&docs, "absent"), None);
    }

    #[test]
    fn duplicates_are_suppressed_and_active_restored() {
        let mut editor = MemoryEditor::with_text("console");
        editor.add_document("a.rs", Some("/p/a.rs"), "fn a() {}");
        editor.switch_to(0);
        editor.set_caret(3);

        let out = mentioned_files(&mut editor, "look at @a.rs and @/p/a.rs");
        assert_eq!(out, "FILE: /p/a.rs\nfn a() {}\n\n");
        assert_eq!(editor.active_index(), 0);
        assert_eq!(editor.caret(), 3);
    }

    #[test]
    fn long_documents_are_truncated_with_marker() {
        let mut editor = MemoryEditor::with_text("");
        let long = "x".repeat(MENTION_EXCERPT_LIMIT + 5);
        editor.add_document("big.txt", Some("/p/big.txt"), &long);
        editor.switch_to(0);

        let out = mentioned_files(&mut editor, "@big.txt");
        assert!(out.contains(TRUNCATION_MARKER));
        assert!(out.len() < long.len() + 40);
    }
}
