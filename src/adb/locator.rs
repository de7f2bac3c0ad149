use std::path::Path;

use crate::error::{Error, Result};

/// Strips wrapping quotes and surrounding whitespace from a configured
/// tool path.
pub fn normalize_tool_path(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|candidate| candidate.strip_suffix('"'))
    {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed
        .strip_prefix('\'')
        .and_then(|candidate| candidate.strip_suffix('\''))
    {
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

/// Resolves a configured tool path, falling back to the bare tool name so
/// PATH lookup applies.
pub fn resolve_program(configured: &str, default: &str) -> String {
    let normalized = normalize_tool_path(configured);
    if normalized.is_empty() {
        default.to_string()
    } else {
        normalized
    }
}

/// Validates that a resolved program is plausibly runnable. A bare tool
/// name is left to PATH lookup; an explicit path must exist and not be a
/// directory.
pub fn validate_program(program: &str) -> Result<()> {
    if program.trim().is_empty() {
        return Err(Error::ToolUnavailable {
            tool: program.to_string(),
            reason: "configured command is empty".to_string(),
        });
    }
    if !program.contains('/') && !program.contains('\\') {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err(Error::ToolUnavailable {
            tool: program.to_string(),
            reason: "path points at a directory, not an executable".to_string(),
        });
    }
    if !path.exists() {
        return Err(Error::ToolUnavailable {
            tool: program.to_string(),
            reason: "executable not found at the configured path".to_string(),
        });
    }
    Ok(())
}
