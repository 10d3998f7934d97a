//! Scanner for edit blocks embedded in model replies
//!
//! ```text
//! @@@REPLACE <path> <startOffset> <length>@@@
//! <replacement text, possibly multi-line>
//! @@@END@@@
//! ```
//!
//! The scanner splits a reply into segments whose raw text, concatenated,
//! reproduces the reply exactly. Blocks that start like an edit but do not
//! follow the grammar come back as [`Segment::Malformed`] and are left in
//! the displayed text.

use std::fmt;

const BLOCK_OPEN: &str = "@@@REPLACE ";
const HEADER_CLOSE: &str = "@@@";
const BLOCK_END: &str = "\n@@@END@@@";

/// One parsed replace directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBlock {
    /// Storage path, a relative path, or `active`
    pub path: String,
    /// Byte offset where the replacement starts
    pub start: usize,
    /// Number of bytes replaced
    pub length: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// No `@@@` closing the header on its line
    UnclosedHeader,
    /// Path, start or length missing or not numeric
    InvalidHeader,
    /// Text follows the header's closing `@@@`
    TrailingHeaderText,
    /// No `@@@END@@@` line after the header
    Unterminated,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MalformedReason::UnclosedHeader => "header is not closed with @@@",
            MalformedReason::InvalidHeader => "header needs <path> <start> <length>",
            MalformedReason::TrailingHeaderText => "unexpected text after header",
            MalformedReason::Unterminated => "missing @@@END@@@",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Prose(&'a str),
    Block { block: EditBlock, raw: &'a str },
    Malformed { raw: &'a str, reason: MalformedReason },
}

impl<'a> Segment<'a> {
    /// Source text this segment was scanned from
    pub fn raw(&self) -> &'a str {
        match self {
            Segment::Prose(raw) => raw,
            Segment::Block { raw, .. } | Segment::Malformed { raw, .. } => raw,
        }
    }
}

/// Split a reply into prose, edit blocks and malformed block attempts
pub fn scan(reply: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < reply.len() {
        let Some(found) = reply[pos..].find(BLOCK_OPEN) else {
            segments.push(Segment::Prose(&reply[pos..]));
            break;
        };
        let open = pos + found;
        if open > pos {
            segments.push(Segment::Prose(&reply[pos..open]));
        }

        let (segment, next) = scan_block(reply, open);
        segments.push(segment);
        pos = next;
    }

    segments
}

/// Scan one block starting at `open`; returns the segment and the offset after it
fn scan_block(reply: &str, open: usize) -> (Segment<'_>, usize) {
    let header_start = open + BLOCK_OPEN.len();
    let line_end = reply[header_start..]
        .find('\n')
        .map_or(reply.len(), |offset| header_start + offset);
    let line = &reply[header_start..line_end];

    let malformed = |reason, end: usize| {
        (
            Segment::Malformed {
                raw: &reply[open..end],
                reason,
            },
            end,
        )
    };

    let Some(close) = line.find(HEADER_CLOSE) else {
        return malformed(MalformedReason::UnclosedHeader, line_end);
    };
    if !line[close + HEADER_CLOSE.len()..].trim().is_empty() {
        return malformed(MalformedReason::TrailingHeaderText, line_end);
    }
    let Some((path, start, length)) = parse_header(&line[..close]) else {
        return malformed(MalformedReason::InvalidHeader, line_end);
    };
    if line_end == reply.len() {
        return malformed(MalformedReason::Unterminated, reply.len());
    }

    // The end marker's newline may be the header's own newline (empty body)
    let Some(end_offset) = reply[line_end..].find(BLOCK_END) else {
        return malformed(MalformedReason::Unterminated, reply.len());
    };
    let body_end = line_end + end_offset;
    let text = if end_offset == 0 {
        String::new()
    } else {
        reply[line_end + 1..body_end].to_string()
    };
    let block_end = body_end + BLOCK_END.len();

    (
        Segment::Block {
            block: EditBlock {
                path,
                start,
                length,
                text,
            },
            raw: &reply[open..block_end],
        },
        block_end,
    )
}

/// `<path> <start> <length>`, split from the right so paths may contain spaces
fn parse_header(header: &str) -> Option<(String, usize, usize)> {
    let mut parts = header.trim().rsplitn(3, ' ');
    let length = parts.next()?.parse().ok()?;
    let start = parts.next()?.parse().ok()?;
    let path = parts.next()?.trim();
    if path.is_empty() {
        return None;
    }
    Some((path.to_string(), start, length))
}
