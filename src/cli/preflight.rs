//! Pre-flight checks before acquisition.
//!
//! Validates that the external commands behind each enabled strategy can be
//! found, so a misconfigured tool shows up before a long run instead of as a
//! string of strategy failures.

use crate::config::{CommandSpec, Settings, StrategyKind};
use crate::error::{Result, SkriftError};
use crate::process::resolve_program;

/// A command an enabled strategy depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub strategy: StrategyKind,
    pub role: &'static str,
    pub command: CommandSpec,
}

/// Commands needed by the enabled strategies, in chain order.
pub fn requirements(settings: &Settings) -> Vec<Requirement> {
    let mut required = Vec::new();
    for strategy in settings.chain.ordered_strategies() {
        match strategy {
            StrategyKind::Lookup => {}
            StrategyKind::Audio => {
                for (idx, command) in settings.audio.commands().into_iter().enumerate() {
                    let role = if idx == 0 { "audio extraction" } else { "fallback extraction" };
                    required.push(Requirement { strategy, role, command });
                }
                required.push(Requirement {
                    strategy,
                    role: "transcription",
                    command: settings.transcription.command_spec(),
                });
            }
            StrategyKind::Browser => required.push(Requirement {
                strategy,
                role: "browser automation",
                command: settings.browser.command_spec(),
            }),
        }
    }
    required
}

/// Requirements whose program cannot be resolved.
pub fn missing(settings: &Settings) -> Vec<Requirement> {
    requirements(settings)
        .into_iter()
        .filter(|r| resolve_program(&r.command.command).is_none())
        .collect()
}

/// Run pre-flight checks.
///
/// Returns Ok(()) if every required program resolves, or an error naming the
/// first one that does not.
pub fn check(settings: &Settings) -> Result<()> {
    settings.validate()?;
    match missing(settings).into_iter().next() {
        Some(req) => Err(SkriftError::ToolNotFound(req.command.command)),
        None => Ok(()),
    }
}
