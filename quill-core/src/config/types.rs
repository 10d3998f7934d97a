use crate::config::constants::{defaults, models, sentinels, urls};
use crate::llm::provider::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Backend family of a server definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAI,
    Custom,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Custom => "custom",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Model used when a server definition leaves it empty
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => models::GEMINI_DEFAULT,
            ProviderKind::Ollama => models::OLLAMA_DEFAULT,
            ProviderKind::OpenAI | ProviderKind::Custom => models::OPENAI_DEFAULT,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAI),
            "custom" => Ok(ProviderKind::Custom),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// One configured backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDefinition {
    pub provider: ProviderKind,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    /// Full endpoint URL, used verbatim when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// API base the endpoint path is appended to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl ServerDefinition {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            api_key: String::new(),
            url: None,
            api_base: None,
        }
    }

    /// Configured model, or the provider default when empty
    pub fn model_or_default(&self) -> &str {
        if self.model.trim().is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    /// Whether requests go out without an authorization header
    pub fn skips_auth(&self) -> bool {
        let key = self.api_key.trim();
        key.is_empty() || key == sentinels::LOCAL_API_KEY
    }

    /// Whether the endpoint is a local inference server that needs no key
    pub fn is_local(&self) -> bool {
        if self.api_key.trim() == sentinels::LOCAL_API_KEY || self.provider == ProviderKind::Ollama
        {
            return true;
        }
        self.endpoint_hint()
            .map(|endpoint| {
                let endpoint = endpoint.to_ascii_lowercase();
                endpoint.contains("://localhost") || endpoint.contains("://127.0.0.1")
            })
            .unwrap_or(false)
    }

    /// `url` if set, else `apiBase`
    pub fn endpoint_hint(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.api_base.as_deref())
            .filter(|value| !value.trim().is_empty())
    }

    /// API base with the provider default applied
    pub fn api_base_or_default(&self) -> &str {
        if let Some(base) = self.api_base.as_deref().filter(|b| !b.trim().is_empty()) {
            return base;
        }
        match self.provider {
            ProviderKind::Gemini => urls::GEMINI_API_BASE,
            ProviderKind::Ollama => urls::OLLAMA_API_BASE,
            ProviderKind::OpenAI | ProviderKind::Custom => urls::OPENAI_API_BASE,
        }
    }
}

/// Persona prefixed to every request's system instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub name: String,
    pub system_prompt: String,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

/// The durable configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    #[serde(default = "default_active_server")]
    pub active_server: String,

    #[serde(default = "default_active_agent")]
    pub active_agent: String,

    /// Root directory all edits must stay under; empty disables the check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_project_dir: Option<String>,

    /// Sliding window size; `<= 0` sends the full history
    #[serde(default = "default_max_history_items")]
    pub max_history_items: i64,

    /// Character budget for text before the selection
    #[serde(default = "default_context_before")]
    pub context_before: usize,

    /// Character budget for text after the selection
    #[serde(default = "default_context_after")]
    pub context_after: usize,

    /// Gemini context caching
    #[serde(default)]
    pub use_caching: bool,

    /// Keep request payloads on disk when a call fails
    #[serde(default)]
    pub dump_payloads: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_agents")]
    pub agents: BTreeMap<String, AgentDefinition>,

    #[serde(default = "default_servers")]
    pub servers: BTreeMap<String, ServerDefinition>,

    #[serde(default)]
    pub histories: BTreeMap<String, Vec<Message>>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            active_server: default_active_server(),
            active_agent: default_active_agent(),
            allowed_project_dir: None,
            max_history_items: default_max_history_items(),
            context_before: default_context_before(),
            context_after: default_context_after(),
            use_caching: false,
            dump_payloads: false,
            request_timeout_secs: default_request_timeout(),
            agents: default_agents(),
            servers: default_servers(),
            histories: BTreeMap::new(),
        }
    }
}

impl AssistantConfig {
    /// The active server, if its name resolves
    pub fn active_server(&self) -> Option<(&str, &ServerDefinition)> {
        self.servers
            .get_key_value(self.active_server.as_str())
            .map(|(name, server)| (name.as_str(), server))
    }

    /// The active agent, falling back to the built-in coder persona
    pub fn active_agent(&self) -> AgentDefinition {
        self.agents
            .get(&self.active_agent)
            .cloned()
            .unwrap_or_else(builtin_coder)
    }

    /// Configured edit root, ignoring blank values
    pub fn allowed_root(&self) -> Option<&str> {
        self.allowed_project_dir
            .as_deref()
            .filter(|dir| !dir.trim().is_empty())
    }

    /// Human-readable overview of agents and servers
    pub fn manager_summary(&self) -> String {
        let mut out = format!(
            "# AI Agent Manager\nActive Persona: {}\nActive Server: {}\n\n## Agents\n",
            self.active_agent, self.active_server
        );
        for (id, agent) in &self.agents {
            let marker = if *id == self.active_agent { " [ACTIVE]" } else { "" };
            let preview: String = agent.system_prompt.chars().take(100).collect();
            out.push_str(&format!(
                "### {} ({id}){marker}\n> {preview}...\n\n",
                agent.name
            ));
        }
        out.push_str("## Servers\n");
        for (id, server) in &self.servers {
            let marker = if *id == self.active_server {
                " [ACTIVE]"
            } else {
                ""
            };
            out.push_str(&format!(
                "- {id} ({}, {}){marker}\n",
                server.provider,
                server.model_or_default()
            ));
        }
        out
    }
}

fn builtin_coder() -> AgentDefinition {
    AgentDefinition::new(
        "General Coder",
        "You are an AI coding assistant. You help write, refactor, and explain code with precision.",
    )
}

fn default_active_server() -> String {
    defaults::DEFAULT_SERVER.to_string()
}

fn default_active_agent() -> String {
    defaults::DEFAULT_AGENT.to_string()
}

fn default_max_history_items() -> i64 {
    defaults::DEFAULT_MAX_HISTORY_ITEMS
}

fn default_context_before() -> usize {
    defaults::DEFAULT_CONTEXT_BEFORE
}

fn default_context_after() -> usize {
    defaults::DEFAULT_CONTEXT_AFTER
}

fn default_request_timeout() -> u64 {
    defaults::DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_agents() -> BTreeMap<String, AgentDefinition> {
    let mut agents = BTreeMap::new();
    agents.insert(defaults::DEFAULT_AGENT.to_string(), builtin_coder());
    agents.insert(
        "architect".to_string(),
        AgentDefinition::new(
            "Software Architect",
            "You are a Senior Software Architect. Focus on system design, patterns, and long-term maintainability.",
        ),
    );
    agents.insert(
        "bug_hunter".to_string(),
        AgentDefinition::new(
            "Bug Hunter",
            "You are an expert debugger. Focus on finding edge cases, security vulnerabilities, and logic errors.",
        ),
    );
    agents
}

fn default_servers() -> BTreeMap<String, ServerDefinition> {
    let mut servers = BTreeMap::new();
    servers.insert(
        defaults::DEFAULT_SERVER.to_string(),
        ServerDefinition::new(ProviderKind::Gemini, models::GEMINI_DEFAULT),
    );
    servers
}
