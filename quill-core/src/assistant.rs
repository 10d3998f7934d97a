//! The orchestrator
//!
//! [`Assistant`] owns the conversation store and drives one turn end to end:
//! validate the active server, record the instruction, assemble context,
//! pick the wire format, reuse or create a context cache, call the
//! provider, then apply and display the reply. Console input and the agent
//! manager view are handled here as well.

use crate::commands::{self, ConsoleCommand, ManagerSelection};
use crate::config::constants::sentinels;
use crate::config::{AssistantConfig, ConfigStore};
use crate::context::{ContextAssembler, Surrounding};
use crate::conversation::{ConversationStore, DocumentId};
use crate::editor::EditorSurface;
use crate::edits::{AccessPolicy, InvocationMode, ProcessedReply, ResponseProcessor, display};
use crate::error::AssistantError;
use crate::llm::{self, CacheManager, ChatRequest, HttpTransport, Message, ProviderReply};
use crate::prompts;
use crate::utils::floor_char_boundary;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Host callback named in the instruction prompt raised by [`Assistant::complete`]
pub const COMPLETE_CALLBACK: &str = "ai_complete_with_instruction";

/// Scratch document listing agents and servers
pub const MANAGER_DOCUMENT: &str = "*AI Manager*";

/// Result of a turn that reached the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed(ProcessedReply),
    /// Error text returned in place of a reply; nothing was recorded
    ProviderError(String),
}

/// Result of one console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleResponse {
    /// Nothing after the prompt marker
    Empty,
    /// A slash command ran; the message was written to the console
    Command(String),
    Turn(TurnOutcome),
}

pub struct Assistant {
    config_store: Arc<dyn ConfigStore>,
    conversations: ConversationStore,
    transport: Arc<dyn HttpTransport>,
}

impl Assistant {
    pub fn new(config_store: Arc<dyn ConfigStore>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            conversations: ConversationStore::new(config_store.clone()),
            config_store,
            transport,
        }
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn config(&self) -> AssistantConfig {
        self.config_store.load()
    }

    pub fn access_policy(&self, config: &AssistantConfig) -> AccessPolicy {
        AccessPolicy::from_config(config, self.config_store.private_dir().as_deref())
    }

    /// Run one instruction against the active document.
    ///
    /// Configuration problems are reported on the status line (and inline in
    /// console mode) and returned as errors before any request is made.
    pub async fn execute(
        &self,
        editor: &mut dyn EditorSurface,
        instruction: &str,
        surrounding: Option<&Surrounding>,
        mode: InvocationMode,
    ) -> Result<TurnOutcome, AssistantError> {
        let config = self.config_store.load();
        let document = editor
            .active_document()
            .map(|doc| doc.id())
            .unwrap_or_else(DocumentId::untitled);

        let turn = validate_server(&config).and_then(|()| self.conversations.begin_turn(&document));
        let _turn = match turn {
            Ok(guard) => guard,
            Err(err) => {
                report_error(editor, mode, &err.to_string());
                return Err(err);
            }
        };

        let Some((server_name, server)) = config.active_server() else {
            return Err(AssistantError::NoActiveServer(config.active_server.clone()));
        };
        let provider = llm::make_provider(server);
        let system_prompt = prompts::system_prompt(&config.active_agent());

        self.conversations
            .append(&document, Message::user(instruction));
        let context_text =
            ContextAssembler::new(&config).assemble(editor, instruction, surrounding);

        editor.set_status("Thinking...");
        info!(
            document = %document,
            server = server_name,
            wire_format = provider.name(),
            model = provider.model(),
            "executing instruction"
        );

        let cache_manager = CacheManager::new(&self.conversations, self.transport.as_ref());
        let cache = if config.use_caching {
            cache_manager
                .ensure(
                    &document,
                    provider.as_ref(),
                    &system_prompt,
                    config.max_history_items,
                )
                .await
        } else {
            None
        };

        let messages = match &cache {
            Some(handle) => self.conversations.since(&document, handle.covered_messages),
            None => self
                .conversations
                .windowed(&document, config.max_history_items),
        };
        let request = ChatRequest {
            system_prompt,
            context_text,
            messages,
            cached_content: cache.as_ref().map(|handle| handle.name.clone()),
        };

        match llm::send(self.transport.as_ref(), provider.as_ref(), &request).await {
            ProviderReply::Text(text) => {
                self.conversations
                    .append(&document, Message::assistant(text.clone()));
                self.conversations.persist();

                let policy = self.access_policy(&config);
                let processed = ResponseProcessor::new(&policy).process(editor, &text, mode);
                editor.set_status(&processed.status_summary());
                debug!(document = %document, edits = processed.edits.len(), "turn completed");
                Ok(TurnOutcome::Completed(processed))
            }
            ProviderReply::Error(message) => {
                if cache.is_some() {
                    cache_manager.invalidate(&document);
                }
                report_error(editor, mode, &message);
                Ok(TurnOutcome::ProviderError(message))
            }
        }
    }

    /// Complete the selection, or ask for an instruction when nothing is
    /// selected. The answer comes back through [`Self::complete_with_instruction`].
    pub async fn complete(
        &self,
        editor: &mut dyn EditorSurface,
    ) -> Result<Option<TurnOutcome>, AssistantError> {
        let Some((start, end)) = editor.selection() else {
            editor.request_input("AI Instruction:", COMPLETE_CALLBACK);
            return Ok(None);
        };

        let selection = editor.text(start, end - start);
        let surrounding = surrounding_text(editor, start, end);
        self.execute(
            editor,
            &selection,
            Some(&surrounding),
            InvocationMode::Editor {
                replace: Some((start, end)),
            },
        )
        .await
        .map(Some)
    }

    /// Run an instruction typed at the prompt; the reply is inserted at the caret
    pub async fn complete_with_instruction(
        &self,
        editor: &mut dyn EditorSurface,
        instruction: &str,
    ) -> Result<Option<TurnOutcome>, AssistantError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Ok(None);
        }
        let caret = editor.caret();
        let surrounding = surrounding_text(editor, caret, caret);
        self.execute(
            editor,
            instruction,
            Some(&surrounding),
            InvocationMode::Editor { replace: None },
        )
        .await
        .map(Some)
    }

    /// Switch to the console document, creating it with a header if needed
    pub fn open_console(&self, editor: &mut dyn EditorSurface) -> usize {
        let index = match find_scratch(editor, sentinels::CONSOLE) {
            Some(index) => {
                editor.switch_to(index);
                index
            }
            None => editor.new_document(sentinels::CONSOLE),
        };

        if editor.is_empty() {
            let config = self.config_store.load();
            let header = format!(
                "// Quill AI Console (Server: {})\n//   /server [name], /agent [id], /clear, /help\n\n{}",
                config.active_server,
                sentinels::PROMPT_MARKER
            );
            editor.insert(0, &header);
            let end = editor.len();
            editor.set_caret(end);
        }
        index
    }

    /// Handle the line after the last prompt marker in the console document
    pub async fn handle_console_input(
        &self,
        editor: &mut dyn EditorSurface,
    ) -> Result<ConsoleResponse, AssistantError> {
        let input = console_input(&editor.full_text());
        if input.is_empty() {
            return Ok(ConsoleResponse::Empty);
        }

        let command = match ConsoleCommand::parse(&input) {
            Ok(command) => command,
            Err(err) => {
                console_reply(editor, &format!("Error: {err}"));
                editor.set_status(&err.to_string());
                return Err(err);
            }
        };

        if let ConsoleCommand::Instruction(instruction) = command {
            let end = editor.len();
            editor.insert(end, "\nThinking...\n");
            return self
                .execute(editor, &instruction, None, InvocationMode::Console)
                .await
                .map(ConsoleResponse::Turn);
        }

        let document = editor
            .active_document()
            .map(|doc| doc.id())
            .unwrap_or_else(DocumentId::console);
        match self.run_command(&document, command) {
            Ok(message) => {
                console_reply(editor, &message);
                if let Some(status) = message.lines().next() {
                    editor.set_status(status);
                }
                Ok(ConsoleResponse::Command(message))
            }
            Err(err) => {
                console_reply(editor, &format!("Error: {err}"));
                editor.set_status(&err.to_string());
                Err(err)
            }
        }
    }

    fn run_command(
        &self,
        document: &DocumentId,
        command: ConsoleCommand,
    ) -> Result<String, AssistantError> {
        match command {
            ConsoleCommand::Server(name) => {
                self.update_config(|config| commands::switch_server(config, &name))
            }
            ConsoleCommand::ServerAdd { name, server } => {
                self.update_config(|config| Ok(commands::add_server(config, &name, server)))
            }
            ConsoleCommand::Agent(id) => {
                self.update_config(|config| commands::switch_agent(config, &id))
            }
            ConsoleCommand::AgentAdd { id, agent } => {
                self.update_config(|config| Ok(commands::add_agent(config, &id, agent)))
            }
            ConsoleCommand::Key(key) => self.update_config(|config| commands::set_key(config, &key)),
            ConsoleCommand::Clear => {
                self.conversations.clear(document);
                Ok("Context cleared.".to_string())
            }
            ConsoleCommand::CacheClear => {
                if self.conversations.drop_cache_handle(document) {
                    Ok("Cache cleared.".to_string())
                } else {
                    Ok("No context cache for this document.".to_string())
                }
            }
            ConsoleCommand::Status => Ok(self.config_store.load().manager_summary()),
            ConsoleCommand::Help => Ok(commands::help_text()),
            ConsoleCommand::Instruction(_) => Err(AssistantError::Usage(
                "instructions are not commands".to_string(),
            )),
        }
    }

    /// Load, mutate and save the configuration
    fn update_config(
        &self,
        change: impl FnOnce(&mut AssistantConfig) -> Result<String, AssistantError>,
    ) -> Result<String, AssistantError> {
        let mut config = self.config_store.load();
        let message = change(&mut config)?;
        if !self.config_store.save(&config) {
            return Err(AssistantError::SaveFailed);
        }
        info!(message = %message, "configuration updated");
        Ok(message)
    }

    /// Show the agent manager view in its own scratch document
    pub fn open_agent_manager(&self, editor: &mut dyn EditorSurface) -> usize {
        let index = match find_scratch(editor, MANAGER_DOCUMENT) {
            Some(index) => {
                editor.switch_to(index);
                index
            }
            None => editor.new_document(MANAGER_DOCUMENT),
        };
        let summary = self.config_store.load().manager_summary();
        let len = editor.len();
        editor.delete(0, len);
        editor.insert(0, &summary);
        editor.set_caret(0);
        index
    }

    /// Activate the agent or server on the caret line of the manager view,
    /// then redraw it
    pub fn manager_select(&self, editor: &mut dyn EditorSurface) -> Result<String, AssistantError> {
        let text = editor.full_text();
        let caret = floor_char_boundary(&text, editor.caret());
        let line_start = text[..caret].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[caret..].find('\n').map_or(text.len(), |i| caret + i);

        let selection = commands::manager_selection(&text[line_start..line_end]);
        let result = match selection {
            Some(ManagerSelection::Agent(id)) => {
                self.update_config(|config| commands::switch_agent(config, &id))
            }
            Some(ManagerSelection::Server(name)) => {
                self.update_config(|config| commands::switch_server(config, &name))
            }
            None => return Err(AssistantError::Usage("Nothing to select on this line".to_string())),
        };
        if let Ok(message) = &result {
            editor.set_status(message);
            self.open_agent_manager(editor);
        }
        result
    }
}

fn validate_server(config: &AssistantConfig) -> Result<(), AssistantError> {
    let Some((name, server)) = config.active_server() else {
        return Err(AssistantError::NoActiveServer(config.active_server.clone()));
    };
    if server.api_key.trim().is_empty() && !server.is_local() {
        return Err(AssistantError::MissingApiKey(name.to_string()));
    }
    Ok(())
}

fn report_error(editor: &mut dyn EditorSurface, mode: InvocationMode, message: &str) {
    warn!(error = %message, "turn failed");
    editor.set_status(&format!("Error: {message}"));
    if mode == InvocationMode::Console {
        display(editor, &format!("Error: {message}"), InvocationMode::Console);
    }
}

fn console_reply(editor: &mut dyn EditorSurface, message: &str) {
    let end = editor.len();
    editor.insert(end, &format!("\n{message}\n\n{}", sentinels::PROMPT_MARKER));
    let end = editor.len();
    editor.set_caret(end);
}

fn find_scratch(editor: &dyn EditorSurface, name: &str) -> Option<usize> {
    editor
        .documents()
        .iter()
        .position(|doc| doc.path.is_none() && doc.name == name)
}

/// Text after the last prompt marker, trimmed
pub fn console_input(transcript: &str) -> String {
    let marker = format!("\n{}", sentinels::PROMPT_MARKER);
    let input = match transcript.rfind(&marker) {
        Some(offset) => &transcript[offset + marker.len()..],
        None => transcript
            .strip_prefix(sentinels::PROMPT_MARKER)
            .unwrap_or(transcript),
    };
    input.trim().to_string()
}

fn surrounding_text(editor: &dyn EditorSurface, start: usize, end: usize) -> Surrounding {
    let len = editor.len();
    let end = end.min(len);
    Surrounding::new(editor.text(0, start.min(end)), editor.text(end, len - end))
}
