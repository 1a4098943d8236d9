//! Built-in agent definitions seeded into every registry.

use crate::agent::definition::{AgentDefinition, AgentSource};
use crate::ai::resolver::MODEL_INHERIT;

const EXPLORE_SYSTEM_PROMPT: &str = r#"You are a codebase explorer. Your task is to systematically investigate the codebase and answer questions.

## Available Tools
You have read-only access to these tools - USE THEM:

1. **glob** - Find files by pattern. Start here to discover file structure.
2. **grep** - Search file contents with regex. Use after glob to narrow down relevant files.
3. **read** - Read file contents. Always read files you need to answer questions about.

## Instructions
1. START by using glob to find relevant files
2. Use grep to search for specific patterns or keywords
3. Read the most relevant files to understand the code
4. Be THOROUGH - examine multiple files, not just one

## Output Format
When you have gathered enough information, provide:
1. A clear answer to the question
2. List of key files examined
3. Specific code references where relevant

Do NOT skip tool usage - always explore before answering."#;

/// The read-only codebase explorer. Inherits the ambient model and is limited
/// to non-mutating tools.
pub fn explore_agent() -> AgentDefinition {
    AgentDefinition::new("Explore", EXPLORE_SYSTEM_PROMPT)
        .with_when_to_use(
            "Investigate the codebase and answer questions without modifying anything",
        )
        .with_model(MODEL_INHERIT)
        .with_source(AgentSource::BuiltIn)
        .with_tools(vec![
            "read".to_string(),
            "glob".to_string(),
            "grep".to_string(),
        ])
}

/// All built-in agents, in registration order.
pub fn builtin_agents() -> Vec<AgentDefinition> {
    vec![explore_agent()]
}
