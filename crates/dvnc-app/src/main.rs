//! DVNC application binary - composition root.
//!
//! Ties the DVNC crates into an interactive terminal chat:
//! 1. Load configuration from TOML and apply CLI overrides
//! 2. Build the keyword catalog and the reply resolver (local or remote)
//! 3. Start the render task behind a channel presentation driver
//! 4. Read stdin lines and turn them into submits and commands

mod cli;
mod command;
mod render;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use dvnc_chat::{
    ChannelDriver, ChatError, ConversationSession, HttpChatBackend, ResolverConfig,
    ResponseCatalog, ResponseResolver,
};
use dvnc_core::config::DvncConfig;

use cli::CliArgs;
use command::Command;
use render::TerminalRenderer;

/// Events buffered between the session and the render task.
const EVENT_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load before tracing starts so the config file can set the log level.
    let config_file = args.resolve_config_path();
    let loaded = DvncConfig::load(&config_file);
    let log_level = args.resolve_log_level().unwrap_or_else(|| {
        loaded
            .as_ref()
            .map(|c| c.general.log_level.clone())
            .unwrap_or_else(|_| "info".to_string())
    });

    // Logs go to stderr so they never interleave with the transcript.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting DVNC v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %config_file.display(),
                error = %e,
                "Failed to load config, using defaults"
            );
            DvncConfig::default()
        }
    };
    args.apply_overrides(&mut config);
    config.validate()?;

    // Catalog: --catalog or config file, otherwise built-in.
    let catalog = match config.catalog.path {
        Some(ref path) => {
            let catalog = ResponseCatalog::load(path)?;
            tracing::info!(path = %path.display(), rules = catalog.len(), "Catalog loaded");
            catalog
        }
        None => ResponseCatalog::builtin(),
    };

    let timeout = config.resolver.timeout();
    let resolver = ResponseResolver::new(catalog)
        .with_backend(Arc::new(HttpChatBackend::new(timeout)?))
        .with_timeout(timeout)
        .with_config(ResolverConfig::from_settings(&config.resolver)?);
    tracing::info!(
        mode = %config.resolver.mode,
        endpoint = config.resolver.endpoint.as_deref().unwrap_or("-"),
        rules = resolver.catalog().len(),
        timeout_ms = resolver.timeout().as_millis() as u64,
        "Resolver ready"
    );

    let (driver, events) = ChannelDriver::new(EVENT_CAPACITY);
    let mut renderer = TerminalRenderer::new(
        std::io::stdout(),
        &config.presentation,
        config.quick_actions.clone(),
    );
    renderer.welcome()?;
    let render_task = tokio::spawn(renderer.run(events));

    let session = Arc::new(
        ConversationSession::new(Arc::new(resolver), Arc::new(driver))
            .with_think_delay(config.session.think_delay()),
    );

    let mut pending = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Nothing => {}
            Command::Say(text) => {
                let session = Arc::clone(&session);
                pending.spawn(async move { log_submit(session.submit(&text).await) });
            }
            Command::Quick(n) => match config.quick_actions.get(n - 1).cloned() {
                Some(action) => {
                    let session = Arc::clone(&session);
                    pending.spawn(async move {
                        log_submit(session.submit_quick_action(&action).await)
                    });
                }
                None => println!("No quick action {}.", n),
            },
            Command::ListQuickActions => {
                let mut out = std::io::stdout();
                render::write_quick_actions(&mut out, &config.quick_actions)?;
                out.flush()?;
            }
            Command::Reset => session.reset(),
            Command::Endpoint(url) => match session.resolver().use_endpoint(&url) {
                Ok(()) => println!("Answering through {}", url),
                Err(e) => println!("{}", e),
            },
            Command::Local => {
                session.resolver().set_config(ResolverConfig::local());
                println!("Answering from the local catalog.");
            }
            Command::Help => println!("{}", command::HELP),
            Command::Invalid(reason) => println!("{} (try /help)", reason),
            Command::Quit => break,
        }

        // Reap finished submits so the set does not grow for the whole session.
        while pending.try_join_next().is_some() {}
    }

    // Let in-flight replies land before the renderer shuts down.
    while let Some(result) = pending.join_next().await {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Submit task failed");
        }
    }
    drop(session);
    render_task.await?;

    tracing::info!("DVNC stopped");
    Ok(())
}

fn log_submit(result: Result<dvnc_chat::SubmitOutcome, ChatError>) {
    match result {
        Ok(outcome) => tracing::debug!(replied = outcome.reply().is_some(), "Submit finished"),
        Err(ChatError::EmptyInput) => {}
        Err(e) => tracing::warn!(error = %e, "Submit failed"),
    }
}
