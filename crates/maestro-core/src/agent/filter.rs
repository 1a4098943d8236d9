//! Tool access filtering.
//!
//! Pure function, no I/O. The deny-list always wins over the allow-list, and
//! the candidate set's ordering is preserved. An empty result is a runtime
//! configuration error surfaced by the executor, not here — it can only be
//! detected once the caller's tool set is known.

use std::collections::HashSet;

use crate::agent::definition::AgentDefinition;
use crate::tools::ToolSet;

const WILDCARD: &str = "*";

/// Apply the definition's allow/deny policy to the candidate tool set.
pub fn filter_tools(all_tools: &ToolSet, definition: &AgentDefinition) -> ToolSet {
    let disallowed: HashSet<&str> = definition
        .disallowed_tools
        .iter()
        .map(String::as_str)
        .collect();

    let has_wildcard = match &definition.tools {
        None => true,
        Some(tools) => tools.len() == 1 && tools[0] == WILDCARD,
    };

    if has_wildcard {
        return all_tools
            .iter()
            .filter(|tool| !disallowed.contains(tool.name()))
            .cloned()
            .collect();
    }

    let allowed: HashSet<&str> = definition
        .tools
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(String::as_str)
        .collect();

    all_tools
        .iter()
        .filter(|tool| allowed.contains(tool.name()) && !disallowed.contains(tool.name()))
        .cloned()
        .collect()
}
