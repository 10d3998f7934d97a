/// Built-in configuration defaults shared by the loader and the console commands
pub mod defaults {
    pub const DEFAULT_SERVER: &str = "gemini";
    pub const DEFAULT_AGENT: &str = "coder";
    pub const DEFAULT_MAX_HISTORY_ITEMS: i64 = 20;
    pub const DEFAULT_CONTEXT_BEFORE: usize = 2000;
    pub const DEFAULT_CONTEXT_AFTER: usize = 1000;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Number of messages per document written to the configuration store
    pub const PERSISTED_HISTORY_LIMIT: usize = 50;
}

/// Model ID defaults per provider
pub mod models {
    pub const GEMINI_DEFAULT: &str = "gemini-1.5-flash";
    pub const OPENAI_DEFAULT: &str = "gpt-4o";
    pub const OLLAMA_DEFAULT: &str = "llama3";
}

/// Endpoint constants
pub mod urls {
    pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
    pub const OLLAMA_API_BASE: &str = "http://localhost:11434/v1";

    /// Substring identifying a Gemini-native `generateContent` endpoint
    pub const GEMINI_NATIVE_MARKER: &str = ":generateContent";
    /// Substring identifying Gemini's OpenAI-compatible endpoint
    pub const OPENAI_COMPAT_MARKER: &str = "/openai/";

    pub const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
    pub const CACHED_CONTENTS_PATH: &str = "cachedContents";
}

/// Reserved names and markers
pub mod sentinels {
    /// Identity of documents without a storage path
    pub const UNTITLED: &str = "untitled";
    /// Name of the console scratch document
    pub const CONSOLE: &str = "*AI*";
    /// Edit target meaning "the currently active document"
    pub const ACTIVE: &str = "active";
    /// API key value meaning "local endpoint, no authentication"
    pub const LOCAL_API_KEY: &str = "local";
    /// Console input marker
    pub const PROMPT_MARKER: &str = "> ";
}

/// Gemini context caching
pub mod cache {
    pub const MIN_MESSAGES: usize = 4;
    pub const TTL_SECONDS: u64 = 600;
}

/// Context assembly limits
pub mod context {
    pub const MENTION_EXCERPT_LIMIT: usize = 10_000;
    pub const TRUNCATION_MARKER: &str = "\n... [truncated]";
}

/// Display limits
pub mod display {
    /// Characters of a raw provider body kept in error messages
    pub const ERROR_BODY_LIMIT: usize = 500;
}

/// Message role strings used on the wire
pub mod message_roles {
    pub const SYSTEM: &str = "system";
    pub const USER: &str = "user";
    pub const ASSISTANT: &str = "assistant";
    pub const MODEL: &str = "model";
}

/// File system locations
pub mod paths {
    pub const APP_DIR: &str = "quill";
    pub const FALLBACK_DIR: &str = ".quill";
    pub const CONFIG_FILE: &str = "ai_config.json";
    pub const PAYLOAD_FILE: &str = "ai_payload.json";
    pub const CONFIG_ENV: &str = "QUILL_CONFIG";
}
