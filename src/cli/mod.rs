//! Command orchestration: wires the library pipeline to the terminal.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

mod progress;

use progress::ProgressIndicator;
use relay::contexts::{FileCache, GeminiClient};
use relay::dispatch::run_modification_batch;
use relay::merge::{BatchState, lock_state};
use relay::project;
use relay::prompt;
use relay::protocol;
use relay::reconcile;
use relay::run_record::RunRecord;
use relay::settings::Settings;
use relay::status::PipelineStatus;

#[derive(Clone, Copy)]
pub struct Config {
    pub verbose: bool,
    pub dry_run: bool,
}

fn transition(status: PipelineStatus, config: &Config) {
    if config.verbose {
        println!("[{}]", status);
    }
}

/// `relay tree`: print the pruned structure listing for a project.
pub fn tree(project_dir: &Path, settings: &Settings, config: &Config) -> Result<()> {
    let files = project::load_project_dir(project_dir)?;
    let tree = project::build_file_tree(&files);
    println!(
        "{}",
        prompt::render_project_structure(&tree, &settings.ignored_folders)
    );
    if config.verbose {
        println!("\n{} file(s) loaded", files.len());
        if let Some(record) = RunRecord::load()? {
            println!(
                "last run: {} ({}/{} succeeded)",
                record.timestamp, record.succeeded, record.total
            );
        }
    }
    Ok(())
}

/// `relay prompt`: render the level 1 planning prompt.
pub fn prepare_prompt(
    project_dir: &Path,
    requirements: Option<&Path>,
    output: Option<&Path>,
    settings: &Settings,
    config: &Config,
) -> Result<()> {
    transition(PipelineStatus::LoadingProject, config);
    let files = project::load_project_dir(project_dir)?;
    let tree = project::build_file_tree(&files);
    transition(PipelineStatus::TreeBuilt, config);

    let structure = prompt::render_project_structure(&tree, &settings.ignored_folders);
    let file_list = prompt::render_file_list(&files, &settings.ignored_folders);
    let requirements_text = match requirements {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read requirements file: {}", path.display()))?,
        None => "{describe your requirements here}".to_string(),
    };
    let rendered = prompt::render_level1_prompt(&structure, &file_list, requirements_text.trim());
    transition(PipelineStatus::PromptReady, config);

    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write prompt to {}", path.display()))?;
            println!("Level 1 prompt written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    eprintln!(
        "Feed the prompt to the level 1 model, save its response, then run: relay apply {} <response-file>",
        project_dir.display()
    );
    transition(PipelineStatus::AwaitingResponse, config);
    Ok(())
}

/// `relay apply`: parse a level 1 response and run the full modification
/// batch against the level 2 model.
pub async fn apply(
    project_dir: &Path,
    level1_path: &Path,
    out_dir: Option<&Path>,
    no_cache: bool,
    settings: &Settings,
    config: &Config,
) -> Result<()> {
    transition(PipelineStatus::LoadingProject, config);
    let files = project::load_project_dir(project_dir)?;
    let root_name = project::project_root_name(project_dir)?;
    transition(PipelineStatus::TreeBuilt, config);
    if config.verbose {
        println!("{} file(s) loaded", files.len());
    }

    transition(PipelineStatus::Parsing, config);
    let raw = fs::read_to_string(level1_path)
        .with_context(|| format!("Failed to read level 1 output: {}", level1_path.display()))?;
    let parsed = protocol::parse_level1_output(&raw)
        .context("Failed to parse level 1 output; check the response format")?;

    let outcome = reconcile::reconcile(parsed.modifications, &files, &settings.ignored_folders);
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }
    if outcome.instructions.is_empty() {
        println!(
            "No actionable modifications (none specified, or all were dropped during reconciliation)."
        );
        transition(PipelineStatus::Done, config);
        return Ok(());
    }
    println!(
        "Found {} actionable modification(s); thread count {}",
        outcome.instructions.len(),
        parsed.thread_count
    );

    if config.dry_run {
        for instruction in &outcome.instructions {
            println!(
                "[DRY RUN] Would {} {}",
                instruction.operation, instruction.file_path
            );
        }
        return Ok(());
    }

    let cache = if no_cache {
        None
    } else {
        Some(FileCache::new(None))
    };
    let client = Arc::new(GeminiClient::from_settings(settings, cache)?);

    transition(PipelineStatus::Dispatching, config);
    let total = outcome.instructions.len();
    let indicator = ProgressIndicator::new(total);
    let state = Arc::new(Mutex::new(BatchState::new(files.clone())));

    let dispatch_result = run_modification_batch(
        outcome.instructions,
        parsed.thread_count,
        client,
        state.clone(),
        |completed, _| indicator.chunk_completed(completed),
    )
    .await;

    // Publish whatever merged, even after a catastrophic abort.
    let (final_files, had_errors, applied, notes) = {
        let guard = lock_state(&state);
        (
            guard.files().clone(),
            guard.had_errors(),
            guard.applied(),
            guard.notes().to_vec(),
        )
    };
    if config.verbose {
        for note in &notes {
            println!("  {}", note);
        }
    }

    let target = out_dir.unwrap_or(project_dir);
    let removed: Vec<String> = files
        .keys()
        .filter(|key| !final_files.contains_key(*key))
        .cloned()
        .collect();
    project::write_project_dir(&final_files, target, &root_name, &removed)?;
    if config.verbose {
        println!("Modified project written to {}", target.display());
    }

    indicator.finish(applied, total - applied);
    RunRecord::new(total, applied, total - applied, had_errors || dispatch_result.is_err())
        .save()?;

    match dispatch_result {
        Err(err) => {
            println!("[{}]", PipelineStatus::Failed);
            Err(err.context("Batch aborted; partial results were still written"))
        }
        Ok(()) if had_errors => {
            println!(
                "[{}] {}/{} processed; see warnings above",
                PipelineStatus::DoneWithErrors,
                applied,
                total
            );
            Ok(())
        }
        Ok(()) => {
            println!(
                "[{}] all {} modification(s) applied",
                PipelineStatus::Done,
                applied
            );
            Ok(())
        }
    }
}
