use crate::backend::ProcessBackend;
use crate::cli::RunArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::ui::{CliProgressHandler, UiEvent};
use bindloop::engine::collaborators::Collaborators;
use bindloop::engine::progress::ProgressReporter;
use bindloop::workflows::{self, design::DesignResult};
use tokio::sync::mpsc;
use tracing::info;

/// How many ranked designs the summary lists.
const RANKED_PREVIEW: usize = 5;

pub async fn run(args: RunArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    info!("Assembling configuration from settings files and CLI arguments...");
    let app_config = build_config(&args)?;

    let starting_pdb = &app_config.design.target.starting_pdb;
    if !starting_pdb.is_file() {
        return Err(CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Target structure does not exist: {}", starting_pdb.display()),
        )));
    }

    let backend = ProcessBackend::new(&app_config.backend_command, app_config.backend_settings.clone())
        .map_err(|e| CliError::Config(e.to_string()))?;

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.callback());

    println!(
        "Designing binders for {} into {}",
        app_config.design.target.binder_name,
        app_config.design.target.design_path.display()
    );
    info!("Invoking the core design workflow...");

    let result = tokio::task::block_in_place(|| {
        workflows::design::run(
            &app_config.design,
            Collaborators::from_backend(&backend),
            app_config.seed,
            &reporter,
        )
    })?;

    info!(stop_reason = %result.summary.stop_reason, "Workflow finished.");
    for line in summary_lines(&result) {
        println!("{}", line);
    }

    Ok(())
}

fn summary_lines(result: &DesignResult) -> Vec<String> {
    let summary = &result.summary;
    let mut lines = vec![
        format!("Design run finished: {}.", summary.stop_reason),
        format!(
            "  Trajectories this run: {} ({} skipped as already designed, {} terminated early)",
            summary.trajectories, summary.skipped, summary.terminated
        ),
        format!("  Designs accepted this run: {}", summary.accepted),
        format!("  Total time: {}", summary.elapsed_text()),
    ];

    if !result.ranked.is_empty() {
        lines.push(format!("Top designs ({} ranked):", result.ranked.len()));
        for design in result.ranked.iter().take(RANKED_PREVIEW) {
            let score = design
                .score
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "n/a".to_string());
            lines.push(format!("  {}. {} (i_pTM {})", design.rank, design.design_name, score));
        }
    }
    lines
}
