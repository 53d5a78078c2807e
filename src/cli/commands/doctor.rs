//! Doctor command - verify external tools and configuration.

use crate::cli::preflight::{self, Requirement};
use crate::cli::Output;
use crate::config::{Settings, StrategyKind};
use crate::process::resolve_program;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Skrift Doctor");
    println!();

    let mut checks = Vec::new();

    println!("{}", style("Strategy Chain").bold());
    let chain = settings
        .chain
        .ordered_strategies()
        .iter()
        .map(StrategyKind::to_string)
        .collect::<Vec<_>>()
        .join(" -> ");
    let chain_check = CheckResult::ok("Order", &chain);
    chain_check.print();
    checks.push(chain_check);

    println!();

    println!("{}", style("External Tools").bold());
    let tool_checks: Vec<_> = preflight::requirements(settings).iter().map(check_requirement).collect();
    if tool_checks.is_empty() {
        println!("  (none needed)");
    }
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_temp_dir(&settings.temp_dir());
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. The affected strategies will always fail.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Skrift is ready to use.");
    }

    Ok(())
}

/// Check that a strategy's command resolves.
fn check_requirement(req: &Requirement) -> CheckResult {
    let name = format!("{} ({})", req.command.command, req.role);
    match resolve_program(&req.command.command) {
        Some(path) => {
            // Script arguments are resolved relative to the working directory.
            let missing_script = req
                .command
                .args
                .iter()
                .filter(|a| !a.contains("{{") && looks_like_script(a))
                .find(|a| !Path::new(a.as_str()).exists());
            match missing_script {
                Some(script) => CheckResult::warning(
                    &name,
                    &format!("{} found, but script {} is missing", path.display(), script),
                    "Run skrift from the directory containing the helper scripts, or use absolute paths",
                ),
                None => CheckResult::ok(&name, &path.display().to_string()),
            }
        }
        None => CheckResult::error(&name, "not found", install_hint(req.strategy)),
    }
}

fn looks_like_script(arg: &str) -> bool {
    [".py", ".js", ".sh"].iter().any(|ext| arg.ends_with(ext))
}

fn check_temp_dir(dir: &Path) -> CheckResult {
    if dir.exists() {
        CheckResult::ok("Temp directory", &dir.display().to_string())
    } else {
        CheckResult::warning(
            "Temp directory",
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first audio download",
        )
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: skrift config init",
        )
    }
}

fn install_hint(strategy: StrategyKind) -> &'static str {
    match strategy {
        StrategyKind::Audio => "Install Python 3 with yt-dlp and faster-whisper, or point [audio]/[transcription] at other tools",
        StrategyKind::Browser => "Install Node.js with puppeteer, or disable the browser strategy",
        StrategyKind::Lookup => "No external tools needed",
    }
}
