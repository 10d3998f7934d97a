//! Text helpers shared by the context assembler, the editor surface and error display

/// Largest char boundary in `text` that is `<= index`
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut boundary = index;
    while !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    boundary
}

/// First `limit` characters of `text`
pub fn head_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Last `limit` characters of `text`
pub fn tail_chars(text: &str, limit: usize) -> &str {
    if limit == 0 {
        return "";
    }
    match text.char_indices().rev().nth(limit - 1) {
        Some((offset, _)) => &text[offset..],
        None => text,
    }
}

/// `text` capped at `limit` characters, with `marker` appended when cut
pub fn truncate_with_marker(text: &str, limit: usize, marker: &str) -> String {
    let head = head_chars(text, limit);
    if head.len() == text.len() {
        text.to_string()
    } else {
        format!("{head}{marker}")
    }
}

/// Normalize a path for prefix comparison: forward slashes, lowercase
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}
