//! Runtime tool path resolution
//!
//! For each external tool (e.g. `docker`) we check for an environment
//! variable `{TOOL}_BIN` and fall back to PATH-based invocation if it is
//! not set. This lets packaging environments pin exact tool paths while
//! keeping plain `docker`/`heroku` invocations working in development.

use std::env;

/// Get the path to an external tool
///
/// Checks `{TOOL}_BIN` (uppercase tool name + "_BIN") and falls back to
/// the tool name itself, which relies on PATH.
pub fn get_tool_path(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase());
    env::var(&env_var).unwrap_or_else(|_| tool.to_string())
}

/// Common tool names
pub mod tools {
    pub const DOCKER: &str = "docker";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_tool_path_from_env() {
        env::set_var("SOME_BUILDER_BIN", "/custom/path/to/some-builder");
        assert_eq!(get_tool_path("some_builder"), "/custom/path/to/some-builder");
        env::remove_var("SOME_BUILDER_BIN");
    }

    #[test]
    fn test_get_tool_path_fallback() {
        env::remove_var("ABSENT_TOOL_BIN");
        assert_eq!(get_tool_path("absent_tool"), "absent_tool");
    }
}
