//! Configuration for the assistant: servers, agents, limits and persisted history
//!
//! The document is read through [`ConfigStore::load`] at the start of every
//! operation so edits made outside the process are picked up, and written
//! back through [`ConfigStore::save`].

pub mod constants;
pub mod store;
pub mod types;

pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};
pub use types::{AgentDefinition, AssistantConfig, ProviderKind, ServerDefinition};
