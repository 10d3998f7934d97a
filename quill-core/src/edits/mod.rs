//! Edit directives in model replies
//!
//! Replies may carry `@@@REPLACE <path> <start> <length>@@@ … @@@END@@@`
//! blocks. [`parser`] finds them, [`guard`] decides whether a target may be
//! written, [`apply`] performs the replacement through the editor surface
//! and [`processor`] ties these together and displays what is left.

pub mod apply;
pub mod guard;
pub mod parser;
pub mod processor;

pub use apply::{ApplyOutcome, apply_edit};
pub use guard::AccessPolicy;
pub use parser::{EditBlock, MalformedReason, Segment, scan};
pub use processor::{EditReport, InvocationMode, ProcessedReply, ResponseProcessor, display};
