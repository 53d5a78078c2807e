//! External command templates.
//!
//! Commands are configured as a program plus argument templates. Arguments may
//! contain `{{name}}` placeholders that are filled in per invocation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An external program with templated arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program name (resolved on `PATH`) or path to an executable.
    pub command: String,
    /// Argument templates.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Render a template with the given variables.
    pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render every argument template.
    pub fn render_args(&self, vars: &HashMap<&str, String>) -> Vec<String> {
        self.args.iter().map(|a| Self::render(a, vars)).collect()
    }

    /// Human-readable form for logs and diagnostics.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}
