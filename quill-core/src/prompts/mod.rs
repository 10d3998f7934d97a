//! System instructions sent with every request

use crate::config::AgentDefinition;

/// Opening line of every system prompt
pub const BASE_PROMPT: &str = "You are an AI coding assistant in Quill.";

/// Edit directive format the model is asked to use
pub const EDIT_FORMAT: &str =
    "Format changes as: @@@REPLACE [path] [start] [len]@@@\n[code]\n@@@END@@@";

/// Base prompt, agent persona and edit format, one per line
pub fn system_prompt(agent: &AgentDefinition) -> String {
    format!("{BASE_PROMPT}\n{}\n{EDIT_FORMAT}\n", agent.system_prompt)
}
