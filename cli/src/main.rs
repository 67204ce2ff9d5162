//! CLI entrypoint for pestwatch
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use pestwatch_application::{
    ActivityLogger, BehaviorConfig, HistoryStore, HistoryView, IdentityBootstrap,
    IdentityProvider, NoActivityLogger, NoIdentityProvider, NoPreviewStore, NoProgress,
    PreviewStore, RunAskUseCase, SubmissionInput, SubmissionOrchestrator, SubmissionProgress,
};
use pestwatch_domain::{ImagePayload, RecordId, Session, Severity, sort_newest_first};
use pestwatch_infrastructure::{
    ConfigLoader, DeviceIdentityProvider, FileConfig, FsPreviewStore, HttpChatGateway,
    HttpClassificationGateway, JsonlActivityLogger, MemoryHistoryStore,
};
use pestwatch_presentation::{
    Cli, Command, ConsoleFormatter, HistoryCommand, HistoryWatcher, OutputConfig,
    ProgressReporter, SimpleProgress, question_text,
};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    // Load configuration
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, &config)?;

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Error => eprintln!("error: {}", issue.message),
            Severity::Warning => eprintln!("warning: {}", issue.message),
        }
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Invalid configuration. Run with --show-config to see which files were loaded.");
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    info!("Starting pestwatch");

    let output = OutputConfig {
        format: config.output.format.unwrap_or_default(),
        color: config.output.color,
        show_progress: config.output.shows_progress(cli.quiet),
    };

    // === Dependency Injection ===
    let activity = activity_logger(&config);
    let timeout = request_timeout(&config);

    match command {
        Command::Predict {
            image,
            text,
            output: format,
            no_save,
        } => {
            let output = output.with_format_override(format.map(Into::into));
            let session = resolve_session(&config, Arc::clone(&activity)).await;
            let history = Arc::new(open_history(&config)?);

            let mut behavior = BehaviorConfig::from_timeout_seconds(Some(config.service.timeout_secs));
            if no_save {
                behavior = behavior.without_history();
            }

            let classifier = Arc::new(
                HttpClassificationGateway::new(config.service.predict_url(), timeout)
                    .context("Failed to build HTTP client")?,
            );
            let orchestrator = SubmissionOrchestrator::new(classifier, history, session)
                .with_previews(preview_store(&config))
                .with_activity_logger(Arc::clone(&activity))
                .with_config(behavior);

            let mut input = SubmissionInput::new(read_image(&image).await?);
            if let Some(text) = &text {
                input = input.with_text(text.clone());
            }

            let progress = progress_for(&output);
            let result = orchestrator
                .submit_with_progress(input, progress.sink())
                .await;
            if let Some(reporter) = progress.spinner() {
                reporter.finish();
            }

            let outcome = result?;
            print!(
                "{}",
                ConsoleFormatter::prediction(&outcome, text.as_deref(), output.format)
            );
        }

        Command::History(HistoryCommand::List { output: format }) => {
            let output = output.with_format_override(format.map(Into::into));
            let session = resolve_session(&config, Arc::clone(&activity)).await;
            let history = open_history(&config)?;

            let mut records = history.snapshot(&session).await?;
            sort_newest_first(&mut records);
            print!("{}", ConsoleFormatter::history(&records, output.format));
        }

        Command::History(HistoryCommand::Watch) => {
            let session = resolve_session(&config, Arc::clone(&activity)).await;
            let history = Arc::new(open_history(&config)?);

            let view = HistoryView::mount_with_activity(history, session, activity).await?;
            HistoryWatcher::new(view)
                .with_clear_screen(
                    config
                        .output
                        .watch_redraw
                        .redraws(std::io::stdout().is_terminal()),
                )
                .run()
                .await?;
        }

        Command::History(HistoryCommand::Delete { id }) => {
            let id = id.trim();
            if id.is_empty() {
                bail!("Record id cannot be empty");
            }
            let session = resolve_session(&config, Arc::clone(&activity)).await;
            let history = Arc::new(open_history(&config)?);

            let view = HistoryView::mount_with_activity(history, session, activity).await?;
            let result = view.delete(&RecordId::new(id)).await;
            view.unmount();
            result?;
            println!("Deleted {}", id);
        }

        Command::Ask { question } => {
            let chat = Arc::new(
                HttpChatGateway::new(config.service.chat_url(), timeout)
                    .context("Failed to build HTTP client")?,
            );
            let use_case = RunAskUseCase::new(chat).with_activity_logger(activity);

            let reply = use_case.execute(&question_text(&question)).await?;
            print!("{}", ConsoleFormatter::format_reply(&reply));
        }

        Command::Whoami => {
            let session = resolve_session(&config, activity).await;
            print!(
                "{}",
                ConsoleFormatter::format_session(&session, &config.history.namespace)
            );
        }
    }

    Ok(())
}

/// Initialize tracing: stderr by verbosity, plus an optional log file.
fn init_logging(verbose: u8, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match config.logging.file_path() {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .context("logging.file must name a file")?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn activity_logger(config: &FileConfig) -> Arc<dyn ActivityLogger> {
    match config
        .logging
        .activity_log_path()
        .and_then(JsonlActivityLogger::open)
    {
        Some(logger) => Arc::new(logger),
        None => Arc::new(NoActivityLogger),
    }
}

fn request_timeout(config: &FileConfig) -> Option<Duration> {
    (config.service.timeout_secs > 0).then(|| Duration::from_secs(config.service.timeout_secs))
}

async fn resolve_session(config: &FileConfig, activity: Arc<dyn ActivityLogger>) -> Session {
    let device = config
        .identity
        .file_path()
        .filter(|_| config.identity.anonymous_sign_in);

    match device {
        Some(path) => bootstrap(DeviceIdentityProvider::new(path), activity).await,
        None => bootstrap(NoIdentityProvider, activity).await,
    }
}

async fn bootstrap<P: IdentityProvider + 'static>(
    provider: P,
    activity: Arc<dyn ActivityLogger>,
) -> Session {
    IdentityBootstrap::new(Arc::new(provider))
        .with_activity_logger(activity)
        .resolve()
        .await
}

fn open_history(config: &FileConfig) -> Result<MemoryHistoryStore> {
    let namespace = config.history.namespace.clone();
    match config.history.file_path() {
        Some(path) => MemoryHistoryStore::open(namespace, &path)
            .with_context(|| format!("Failed to open history at {}", path.display())),
        None => {
            info!("History is in memory only");
            Ok(MemoryHistoryStore::new(namespace))
        }
    }
}

fn preview_store(config: &FileConfig) -> Arc<dyn PreviewStore> {
    match config.previews.dir_path() {
        Some(dir) => Arc::new(FsPreviewStore::new(dir)),
        None => Arc::new(NoPreviewStore),
    }
}

async fn read_image(path: &Path) -> Result<ImagePayload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImagePayload::new(bytes, file_name))
}

/// Progress sink chosen for the current terminal and output settings
enum Progress {
    Spinner(ProgressReporter),
    Lines(SimpleProgress),
    Silent(NoProgress),
}

impl Progress {
    fn sink(&self) -> &dyn SubmissionProgress {
        match self {
            Progress::Spinner(p) => p,
            Progress::Lines(p) => p,
            Progress::Silent(p) => p,
        }
    }

    fn spinner(&self) -> Option<&ProgressReporter> {
        match self {
            Progress::Spinner(p) => Some(p),
            _ => None,
        }
    }
}

fn progress_for(output: &OutputConfig) -> Progress {
    if !output.wants_progress() {
        return Progress::Silent(NoProgress);
    }
    if std::io::stderr().is_terminal() {
        Progress::Spinner(ProgressReporter::new())
    } else {
        debug!("stderr is not a terminal; using plain progress lines");
        Progress::Lines(SimpleProgress)
    }
}
