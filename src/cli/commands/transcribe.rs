//! Transcribe command implementation.

use crate::cli::output::preview;
use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::{Acquisition, Orchestrator};
use anyhow::Result;
use std::path::PathBuf;

/// Run the transcribe command.
pub async fn run_transcribe(
    references: &[String],
    concurrency: Option<usize>,
    output: Option<PathBuf>,
    mut settings: Settings,
) -> Result<()> {
    // Missing tools only disable their strategy, so warn instead of failing.
    for req in preflight::missing(&settings) {
        Output::warning(&format!(
            "{} command '{}' not found, the {} strategy will fail",
            req.role, req.command.command, req.strategy
        ));
    }

    if let Some(n) = concurrency {
        if n == 0 {
            return Err(anyhow::anyhow!("--concurrency must be at least 1"));
        }
        settings.chain.max_concurrent_requests = n;
    }

    let orchestrator = Orchestrator::new(settings)?;
    Output::info(&format!("Strategy chain: {}", orchestrator.strategy_names().join(" -> ")));

    let spinner = Output::spinner(&format!("Acquiring {} transcript(s)...", references.len()));
    let results = orchestrator.acquire_batch(references).await;
    spinner.finish_and_clear();

    let mut texts = Vec::with_capacity(results.len());
    let mut invalid = 0;
    for (reference, result) in references.iter().zip(results) {
        match result {
            Ok(acquisition) => {
                report(reference, &acquisition);
                texts.push(acquisition.into_text());
            }
            Err(e) => {
                Output::error(&format!("{}: {}", reference, e));
                invalid += 1;
            }
        }
    }

    if !texts.is_empty() {
        let body = texts.join("\n\n");
        match &output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, format!("{}\n", body))?;
                Output::success(&format!("Wrote {} transcript(s) to {}", texts.len(), path.display()));
            }
            None => println!("{}", body),
        }
    }

    if invalid > 0 {
        return Err(anyhow::anyhow!("{} reference(s) could not be parsed", invalid));
    }
    Ok(())
}

fn report(reference: &str, acquisition: &Acquisition) {
    match (&acquisition.strategy, &acquisition.transcript) {
        (Some(strategy), Some(text)) => Output::success(&format!(
            "{} via {} ({} chars): {}",
            acquisition.video_id,
            strategy,
            text.chars().count(),
            preview(text, 60)
        )),
        _ => Output::warning(&format!("No transcript for {}", reference)),
    }
    for failure in &acquisition.failures {
        Output::kv(&failure.strategy, &failure.reason);
    }
}
