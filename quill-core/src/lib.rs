//! Quill Core Library
//!
//! An AI assistant that lives inside a text editor. Instructions come from a
//! console document or from the current selection; the assistant gathers
//! context from the editor, sends the conversation to a configured model
//! server, and applies the structured edits found in the reply.
//!
//! ## Architecture
//!
//! - **Configuration**: servers, agents and per-document history in one
//!   durable document ([`config`])
//! - **Conversations**: per-document history, context-cache handles and
//!   in-flight turn tracking ([`conversation`])
//! - **Wire formats**: Gemini-native and OpenAI-compatible request shapes
//!   behind one trait ([`llm`])
//! - **Edits**: a tolerant `@@@REPLACE` scanner, a directory guard and the
//!   applier ([`edits`])
//! - **Editor surface**: the host operations the assistant needs
//!   ([`editor`]), with an in-memory implementation for tests and the CLI
//!
//! ```no_run
//! use quill_core::{Assistant, FileConfigStore, InvocationMode, MemoryEditor, ReqwestTransport};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let store = Arc::new(FileConfigStore::from_env_or_default());
//! let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(120))?);
//! let assistant = Assistant::new(store, transport);
//!
//! let mut editor = MemoryEditor::with_text("fn main() {}\n");
//! assistant
//!     .execute(&mut editor, "add a doc comment", None, InvocationMode::Editor { replace: None })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod commands;
pub mod config;
pub mod context;
pub mod conversation;
pub mod editor;
pub mod edits;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod utils;

// Re-exports for convenience
pub use assistant::{Assistant, ConsoleResponse, TurnOutcome};
pub use commands::ConsoleCommand;
pub use config::{
    AgentDefinition, AssistantConfig, ConfigStore, FileConfigStore, MemoryConfigStore,
    ProviderKind, ServerDefinition,
};
pub use context::{ContextAssembler, Surrounding};
pub use conversation::{CacheHandle, ConversationStore, DocumentId};
pub use editor::{DocumentInfo, EditorSurface, MemoryEditor};
pub use edits::{AccessPolicy, ApplyOutcome, EditBlock, InvocationMode, ProcessedReply};
pub use error::AssistantError;
pub use llm::{
    HttpResponse, HttpTransport, LLMError, Message, MessageRole, ProviderReply, ReqwestTransport,
    WireFormat,
};
