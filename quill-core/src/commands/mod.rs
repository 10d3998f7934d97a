//! Console commands
//!
//! A console line is either a slash command or an instruction for the
//! model. Commands that change configuration are pure functions over
//! [`AssistantConfig`]; the orchestrator loads and saves around them.

use crate::config::constants::{sentinels, urls};
use crate::config::{AgentDefinition, AssistantConfig, ProviderKind, ServerDefinition};
use crate::error::AssistantError;
use once_cell::sync::Lazy;

/// Metadata describing a console slash command
#[derive(Clone, Copy, Debug)]
pub struct SlashCommandInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

/// Slash commands in the order they are listed by `/help`
pub static SLASH_COMMANDS: Lazy<Vec<SlashCommandInfo>> = Lazy::new(|| {
    vec![
        SlashCommandInfo {
            name: "server",
            usage: "/server <name>",
            description: "Switch the active server",
        },
        SlashCommandInfo {
            name: "server_add",
            usage: "/server_add <name> <provider> [url-or-model] [model]",
            description: "Define a server (gemini, openai, custom, ollama) and activate it",
        },
        SlashCommandInfo {
            name: "agent",
            usage: "/agent <id>",
            description: "Switch the active agent persona",
        },
        SlashCommandInfo {
            name: "agent_add",
            usage: "/agent_add <id> <name> <prompt...>",
            description: "Define an agent persona and activate it",
        },
        SlashCommandInfo {
            name: "key",
            usage: "/key <apiKey>",
            description: "Set the API key of the active server",
        },
        SlashCommandInfo {
            name: "clear",
            usage: "/clear",
            description: "Forget this document's conversation",
        },
        SlashCommandInfo {
            name: "cache_clear",
            usage: "/cache_clear",
            description: "Drop this document's context cache",
        },
        SlashCommandInfo {
            name: "status",
            usage: "/status",
            description: "Show agents and servers",
        },
        SlashCommandInfo {
            name: "help",
            usage: "/help",
            description: "Show console commands",
        },
    ]
});

fn usage(name: &str) -> AssistantError {
    let text = SLASH_COMMANDS
        .iter()
        .find(|info| info.name == name)
        .map(|info| info.usage)
        .unwrap_or(name);
    AssistantError::Usage(format!("Usage: {text}"))
}

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Server(String),
    ServerAdd {
        name: String,
        server: ServerDefinition,
    },
    Agent(String),
    AgentAdd {
        id: String,
        agent: AgentDefinition,
    },
    Key(String),
    Clear,
    CacheClear,
    Status,
    Help,
    Instruction(String),
}

impl ConsoleCommand {
    /// Parse a console line; the leading `> ` prompt marker is optional.
    ///
    /// Lines that do not start with a known command are instructions.
    pub fn parse(line: &str) -> Result<Self, AssistantError> {
        let line = line.trim();
        let line = line
            .strip_prefix(sentinels::PROMPT_MARKER.trim_end())
            .unwrap_or(line)
            .trim();

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(ConsoleCommand::Instruction(line.to_string()));
        };
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        let words: Vec<&str> = args.split_whitespace().collect();

        let command = match name {
            "server" => match words.as_slice() {
                [server] => ConsoleCommand::Server(server.to_string()),
                _ => return Err(usage(name)),
            },
            "server_add" => parse_server_add(&words)?,
            "agent" => match words.as_slice() {
                [agent] => ConsoleCommand::Agent(agent.to_string()),
                _ => return Err(usage(name)),
            },
            "agent_add" => {
                let mut parts = args.splitn(3, char::is_whitespace);
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(id), Some(agent_name), Some(prompt))
                        if !id.is_empty() && !agent_name.is_empty() && !prompt.trim().is_empty() =>
                    {
                        ConsoleCommand::AgentAdd {
                            id: id.to_string(),
                            agent: AgentDefinition::new(agent_name, prompt.trim()),
                        }
                    }
                    _ => return Err(usage(name)),
                }
            }
            "key" => match words.as_slice() {
                [key] => ConsoleCommand::Key(key.to_string()),
                _ => return Err(usage(name)),
            },
            "clear" => ConsoleCommand::Clear,
            "cache_clear" => ConsoleCommand::CacheClear,
            "status" => ConsoleCommand::Status,
            "help" => ConsoleCommand::Help,
            _ => ConsoleCommand::Instruction(line.to_string()),
        };
        Ok(command)
    }
}

fn parse_server_add(words: &[&str]) -> Result<ConsoleCommand, AssistantError> {
    let (name, provider, rest) = match words {
        [name, provider, rest @ ..] if rest.len() <= 2 => (*name, *provider, rest),
        _ => return Err(usage("server_add")),
    };
    let provider: ProviderKind = provider.parse().map_err(AssistantError::Usage)?;

    let mut server = ServerDefinition::new(provider, "");
    match rest {
        [] => {}
        [url, model @ ..] if url.starts_with("http") => {
            if url.contains(urls::GEMINI_NATIVE_MARKER) || url.ends_with(urls::CHAT_COMPLETIONS_PATH) {
                server.url = Some(url.to_string());
            } else {
                server.api_base = Some(url.to_string());
            }
            if let Some(model) = model.first() {
                server.model = model.to_string();
            }
        }
        [model] => server.model = model.to_string(),
        _ => return Err(usage("server_add")),
    }
    if provider == ProviderKind::Ollama {
        server.api_key = sentinels::LOCAL_API_KEY.to_string();
    }

    Ok(ConsoleCommand::ServerAdd {
        name: name.to_string(),
        server,
    })
}

/// Make `name` the active server
pub fn switch_server(config: &mut AssistantConfig, name: &str) -> Result<String, AssistantError> {
    if !config.servers.contains_key(name) {
        return Err(AssistantError::UnknownServer(name.to_string()));
    }
    config.active_server = name.to_string();
    Ok(format!("Server: {name}"))
}

/// Define a server and make it active
pub fn add_server(config: &mut AssistantConfig, name: &str, server: ServerDefinition) -> String {
    let message = format!(
        "Server: {name} ({}, {})",
        server.provider,
        server.model_or_default()
    );
    config.servers.insert(name.to_string(), server);
    config.active_server = name.to_string();
    message
}

/// Make `id` the active agent
pub fn switch_agent(config: &mut AssistantConfig, id: &str) -> Result<String, AssistantError> {
    let agent = config
        .agents
        .get(id)
        .ok_or_else(|| AssistantError::UnknownAgent(id.to_string()))?;
    let message = format!("Agent: {}", agent.name);
    config.active_agent = id.to_string();
    Ok(message)
}

/// Define an agent and make it active
pub fn add_agent(config: &mut AssistantConfig, id: &str, agent: AgentDefinition) -> String {
    let message = format!("Agent: {}", agent.name);
    config.agents.insert(id.to_string(), agent);
    config.active_agent = id.to_string();
    message
}

/// Set the API key of the active server
pub fn set_key(config: &mut AssistantConfig, key: &str) -> Result<String, AssistantError> {
    let name = config.active_server.clone();
    let server = config
        .servers
        .get_mut(&name)
        .ok_or_else(|| AssistantError::NoActiveServer(name.clone()))?;
    server.api_key = key.trim().to_string();
    Ok(format!("AI Key saved for {name}"))
}

/// `/help` text
pub fn help_text() -> String {
    let mut out = String::from("Commands:\n");
    for info in SLASH_COMMANDS.iter() {
        out.push_str(&format!("  {:<52} {}\n", info.usage, info.description));
    }
    out.push_str("Anything else is sent as an instruction.");
    out
}

/// What a line of the agent manager view refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerSelection {
    Agent(String),
    Server(String),
}

/// Interpret a line of [`AssistantConfig::manager_summary`] output.
///
/// `### Name (id)` lines select agents, `- id (...)` lines select servers.
pub fn manager_selection(line: &str) -> Option<ManagerSelection> {
    let line = line.trim();
    if let Some(heading) = line.strip_prefix("### ") {
        let open = heading.rfind('(')?;
        let close = heading[open..].find(')')? + open;
        let id = heading[open + 1..close].trim();
        return (!id.is_empty()).then(|| ManagerSelection::Agent(id.to_string()));
    }
    if let Some(item) = line.strip_prefix("- ") {
        let id = item.split_whitespace().next()?;
        return Some(ManagerSelection::Server(id.to_string()));
    }
    None
}
